//! Display formatting for amounts, dates, references and phone numbers.
//!
//! Missing or unparseable dates never fail: they render as `"N/A"`
//! (absolute formats) or `"Just now"` (relative format).

use crate::environment::Clock;
use chrono::{DateTime, NaiveDate, Utc};

const DEFAULT_CURRENCY: &str = "UGX";
const NOT_AVAILABLE: &str = "N/A";

/// Format a whole-unit amount, e.g. `UGX 50,000`.
///
/// Fractions are rounded half away from zero.
#[must_use]
pub fn format_currency(amount: f64, currency: Option<&str>) -> String {
    let code = currency.filter(|c| !c.is_empty()).unwrap_or(DEFAULT_CURRENCY);
    if !amount.is_finite() {
        return format!("{code} {NOT_AVAILABLE}");
    }
    #[allow(clippy::cast_possible_truncation)] // Saturating float to int cast
    let rounded = amount.round() as i64;
    let grouped = group_thousands(rounded.unsigned_abs());
    if rounded < 0 {
        format!("-{code} {grouped}")
    } else {
        format!("{code} {grouped}")
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
#[must_use]
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn ordinal(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (1, n) if n != 11 => "st",
        (2, n) if n != 12 => "nd",
        (3, n) if n != 13 => "rd",
        _ => "th",
    }
}

/// Long date, e.g. `March 15th, 2025`.
#[must_use]
pub fn long_date(date: &DateTime<Utc>) -> String {
    use chrono::Datelike;
    let day = date.day();
    format!("{} {day}{}, {}", date.format("%B"), ordinal(day), date.year())
}

/// Long date and time, e.g. `March 15th, 2025 7:30 PM`.
#[must_use]
pub fn long_date_time(date: &DateTime<Utc>) -> String {
    format!("{} {}", long_date(date), date.format("%-I:%M %p"))
}

/// [`long_date`] for raw API input; `"N/A"` when missing or invalid.
#[must_use]
pub fn format_date(input: Option<&str>) -> String {
    input
        .and_then(parse_date)
        .map_or_else(|| NOT_AVAILABLE.to_string(), |d| long_date(&d))
}

/// [`long_date_time`] for raw API input; `"N/A"` when missing or invalid.
#[must_use]
pub fn format_date_time(input: Option<&str>) -> String {
    input
        .and_then(parse_date)
        .map_or_else(|| NOT_AVAILABLE.to_string(), |d| long_date_time(&d))
}

/// Relative phrase such as `5 minutes ago` or `in about 2 hours`.
///
/// Missing or invalid input renders as `"Just now"`.
#[must_use]
pub fn format_relative_time(input: Option<&str>, clock: &dyn Clock) -> String {
    match input.and_then(parse_date) {
        Some(date) => relative_to(&date, &clock.now()),
        None => "Just now".to_string(),
    }
}

/// Relative phrase for `date` as seen from `now`.
#[must_use]
pub fn relative_to(date: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let seconds = (*now - *date).num_seconds();
    let distance = distance_words(seconds.unsigned_abs());
    if seconds >= 0 {
        format!("{distance} ago")
    } else {
        format!("in {distance}")
    }
}

fn distance_words(seconds: u64) -> String {
    const MINUTES_PER_DAY: u64 = 1_440;
    const MINUTES_PER_MONTH: u64 = 43_200;
    const MINUTES_PER_YEAR: u64 = 525_600;

    let minutes = (seconds + 30) / 60;
    match minutes {
        0 => "less than a minute".to_string(),
        1 => "1 minute".to_string(),
        2..45 => format!("{minutes} minutes"),
        45..90 => "about 1 hour".to_string(),
        90..MINUTES_PER_DAY => format!("about {} hours", (minutes + 30) / 60),
        MINUTES_PER_DAY..2_520 => "1 day".to_string(),
        2_520..MINUTES_PER_MONTH => format!("{} days", (minutes + 720) / MINUTES_PER_DAY),
        MINUTES_PER_MONTH..64_800 => "about 1 month".to_string(),
        64_800..86_400 => "about 2 months".to_string(),
        86_400..MINUTES_PER_YEAR => format!("{} months", (minutes + 21_600) / MINUTES_PER_MONTH),
        _ => {
            let years = minutes / MINUTES_PER_YEAR;
            let rest = minutes % MINUTES_PER_YEAR;
            if rest < MINUTES_PER_YEAR / 4 {
                format!("about {years} {}", plural(years, "year"))
            } else if rest < MINUTES_PER_YEAR * 3 / 4 {
                format!("over {years} {}", plural(years, "year"))
            } else {
                format!("almost {} years", years + 1)
            }
        }
    }
}

fn plural(n: u64, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// Ticket numbers display uppercased.
#[must_use]
pub fn format_ticket_number(ticket_number: &str) -> String {
    ticket_number.to_uppercase()
}

/// Booking references display uppercased.
#[must_use]
pub fn format_booking_ref(reference: &str) -> String {
    reference.to_uppercase()
}

/// Cut `text` to `length` characters, appending `...` when shortened.
#[must_use]
pub fn truncate(text: &str, length: usize) -> String {
    match text.char_indices().nth(length) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// `+XXX XXX XXX XXX` when the input has at least ten digits.
///
/// Shorter input is returned unchanged.
#[must_use]
pub fn format_phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 10 {
        return phone.to_string();
    }
    format!(
        "+{} {} {} {}",
        &digits[..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..]
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    struct At(DateTime<Utc>);

    impl Clock for At {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_currency_grouping() {
        assert_eq!(format_currency(50_000.0, None), "UGX 50,000");
        assert_eq!(format_currency(1_234_567.4, Some("KES")), "KES 1,234,567");
        assert_eq!(format_currency(999.5, None), "UGX 1,000");
        assert_eq!(format_currency(0.0, Some("")), "UGX 0");
        assert_eq!(format_currency(-2_500.0, None), "-UGX 2,500");
    }

    #[test]
    fn test_dates_fall_back_to_na() {
        assert_eq!(format_date(None), "N/A");
        assert_eq!(format_date(Some("not a date")), "N/A");
        assert_eq!(format_date(Some("2025-03-01")), "March 1st, 2025");
        assert_eq!(
            format_date_time(Some("2025-03-22T19:30:00Z")),
            "March 22nd, 2025 7:30 PM"
        );
        assert_eq!(format_date(Some("2025-03-13T08:00:00+03:00")), "March 13th, 2025");
    }

    #[test]
    fn test_relative_time() {
        let clock = At(noon());
        assert_eq!(format_relative_time(None, &clock), "Just now");
        assert_eq!(
            format_relative_time(Some("2025-03-15T11:55:00Z"), &clock),
            "5 minutes ago"
        );
        assert_eq!(
            format_relative_time(Some("2025-03-15T14:00:00Z"), &clock),
            "in about 2 hours"
        );
        assert_eq!(
            format_relative_time(Some("2025-03-12T12:00:00Z"), &clock),
            "3 days ago"
        );
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("Kampala", 10), "Kampala");
        assert_eq!(truncate("Nyege Nyege Festival", 5), "Nyege...");
        assert_eq!(truncate("éèêë", 2), "éè...");
        assert_eq!(truncate("", 3), "");
    }

    #[test]
    fn test_phone_formatting() {
        assert_eq!(format_phone_number("+256 700-123456"), "+256 700 123 456");
        assert_eq!(format_phone_number("0700 12"), "0700 12");
        assert_eq!(format_phone_number(""), "");
    }

    #[test]
    fn test_references_uppercase() {
        assert_eq!(format_booking_ref("bk-9f2a"), "BK-9F2A");
        assert_eq!(format_ticket_number(""), "");
    }

    proptest! {
        #[test]
        fn prop_currency_digits_survive_grouping(amount in 0u32..2_000_000_000) {
            let formatted = format_currency(f64::from(amount), None);
            let digits: String = formatted.chars().filter(char::is_ascii_digit).collect();
            prop_assert_eq!(digits, amount.to_string());
        }

        #[test]
        fn prop_truncate_never_exceeds_limit(text in "\\PC{0,40}", length in 0usize..50) {
            let out = truncate(&text, length);
            prop_assert!(out.chars().count() <= length + 3);
            prop_assert!(out.starts_with(&text.chars().take(length).collect::<String>()));
        }
    }
}
