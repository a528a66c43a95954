//! Navigation routes and the access guard applied before a page is shown.

/// Login page.
pub const LOGIN: &str = "/login";
/// Where an expired session lands.
pub const SESSION_EXPIRED_REDIRECT: &str = "/login?session_expired=true";
/// Default landing for signed-in users.
pub const DASHBOARD: &str = "/dashboard";
/// Customer landing after login or sign-up.
pub const CUSTOMER_DASHBOARD: &str = "/customer/dashboard";
/// Seller landing after login.
pub const SELLER_DASHBOARD: &str = "/seller/dashboard";
/// Cookie carrying the server session.
pub const SESSION_COOKIE: &str = "sessionId";

const AUTH_ROUTES: [&str; 3] = ["/login", "/register", "/apply-seller"];
const CUSTOMER_PREFIXES: [&str; 4] = ["/dashboard", "/bookings", "/tickets", "/profile"];
const SELLER_PREFIX: &str = "/seller";

/// Outcome of [`guard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Show the requested page.
    Allow,
    /// Navigate elsewhere instead.
    Redirect(String),
}

/// Decide whether `path` may be shown.
///
/// Signed-in users are bounced off the auth pages; anonymous users are sent
/// to the login page from customer and seller areas, with the original path
/// kept in a `redirect` query parameter.
#[must_use]
pub fn guard(path: &str, authenticated: bool) -> RouteDecision {
    if authenticated && AUTH_ROUTES.contains(&path) {
        return RouteDecision::Redirect(DASHBOARD.to_string());
    }
    let protected = CUSTOMER_PREFIXES.iter().any(|p| path.starts_with(p))
        || path.starts_with(SELLER_PREFIX);
    if protected && !authenticated {
        return RouteDecision::Redirect(login_redirect(path));
    }
    RouteDecision::Allow
}

/// `/login?redirect=<path>` with the path form-encoded.
#[must_use]
pub fn login_redirect(path: &str) -> String {
    format!("{LOGIN}?redirect={}", form_encode(path))
}

/// Whether a `Cookie` header carries a non-empty session cookie.
#[must_use]
pub fn has_session_cookie(cookie_header: &str) -> bool {
    cookie_header.split(';').any(|pair| {
        pair.trim()
            .split_once('=')
            .is_some_and(|(name, value)| name == SESSION_COOKIE && !value.is_empty())
    })
}

fn form_encode(input: &str) -> String {
    url::form_urlencoded::byte_serialize(input.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticated_user_skips_auth_pages() {
        assert_eq!(
            guard("/login", true),
            RouteDecision::Redirect("/dashboard".to_string())
        );
        assert_eq!(guard("/login", false), RouteDecision::Allow);
        assert_eq!(guard("/login/help", true), RouteDecision::Allow);
    }

    #[test]
    fn test_anonymous_user_sent_to_login() {
        assert_eq!(
            guard("/bookings/42", false),
            RouteDecision::Redirect("/login?redirect=%2Fbookings%2F42".to_string())
        );
        assert_eq!(
            guard("/seller/finance", false),
            RouteDecision::Redirect("/login?redirect=%2Fseller%2Ffinance".to_string())
        );
        assert_eq!(guard("/seller/finance", true), RouteDecision::Allow);
    }

    #[test]
    fn test_public_pages_allowed() {
        for path in ["/", "/events", "/payment/callback", "/customer/events/1"] {
            assert_eq!(guard(path, false), RouteDecision::Allow, "{path}");
        }
    }

    #[test]
    fn test_session_cookie_detection() {
        assert!(has_session_cookie("theme=dark; sessionId=abc123"));
        assert!(!has_session_cookie("sessionId="));
        assert!(!has_session_cookie("theme=dark"));
    }

    #[test]
    fn test_login_redirect_form_encodes_path() {
        assert_eq!(
            login_redirect("/events/nile nights?tab=vip&x=1"),
            "/login?redirect=%2Fevents%2Fnile+nights%3Ftab%3Dvip%26x%3D1"
        );
    }
}
