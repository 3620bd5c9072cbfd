use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A student record as seen by the rest of the crate. The PIN hash stays in
/// the storage layer and is never part of this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub roll: String,
    pub name: String,
    pub branch: String,
    pub dob: NaiveDate,
    pub issue_valid: String,
    pub photo_url: String,
    pub photo_handle: String,
    pub issued_at: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

/// Credential validity window, decoded from the legacy `"<start>-<end>"`
/// string. A two-digit end fragment is read as `2000 + end`, which caps
/// correct behavior to the years 2000-2099.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    pub start_year: i32,
    pub end_year: i32,
}

impl ValidityWindow {
    pub fn parse(raw: &str) -> Option<Self> {
        let (start, end) = raw.split_once('-')?;
        let start_year = expand_year(start.trim().parse().ok()?);
        let end_year = expand_year(end.trim().parse().ok()?);
        if start_year > end_year {
            return None;
        }
        Some(Self {
            start_year,
            end_year,
        })
    }

    /// Last calendar day the credential is valid: December 31 of the end year.
    pub fn expiry_boundary(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.end_year, 12, 31)
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_boundary().is_some_and(|boundary| today > boundary)
    }
}

const fn expand_year(year: i32) -> i32 {
    if year < 100 { year + 2000 } else { year }
}

/// Uppercases a roll number for lookup and storage.
#[must_use]
pub fn normalize_roll(roll: &str) -> String {
    roll.trim().to_uppercase()
}

/// Title-cases a name the way the admin UI expects: each whitespace-separated
/// word capitalized, the rest lowercased, runs of whitespace collapsed.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A PIN is exactly four ASCII digits.
#[must_use]
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == 4 && pin.chars().all(|c| c.is_ascii_digit())
}

/// Optional, conjunctive filters for the student listing.
#[derive(Debug, Clone, Default)]
pub struct StudentFilters {
    /// Case-insensitive substring match on the name.
    pub name: Option<String>,
    /// Exact branch match.
    pub branch: Option<String>,
    /// Exact date of birth.
    pub dob: Option<NaiveDate>,
    /// Exact roll match (normalized before querying).
    pub roll: Option<String>,
    /// Keep students issued within the last N years.
    pub issued_within_years: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_digit_window() {
        let w = ValidityWindow::parse("21-24").unwrap();
        assert_eq!(w.start_year, 2021);
        assert_eq!(w.end_year, 2024);
    }

    #[test]
    fn parses_four_digit_window() {
        let w = ValidityWindow::parse("2021-2025").unwrap();
        assert_eq!(w.end_year, 2025);
    }

    #[test]
    fn rejects_garbage_and_inverted_windows() {
        assert!(ValidityWindow::parse("no-window").is_none());
        assert!(ValidityWindow::parse("2024").is_none());
        assert!(ValidityWindow::parse("24-21").is_none());
        assert!(ValidityWindow::parse("").is_none());
    }

    #[test]
    fn expiry_is_strictly_after_dec_31() {
        let w = ValidityWindow::parse("21-24").unwrap();
        let last_valid = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let first_expired = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(!w.is_expired(last_valid));
        assert!(w.is_expired(first_expired));
    }

    #[test]
    fn name_is_title_cased() {
        assert_eq!(normalize_name("john  ALBERT doe"), "John Albert Doe");
        assert_eq!(normalize_name("  priya "), "Priya");
    }

    #[test]
    fn pin_must_be_four_digits() {
        assert!(is_valid_pin("0042"));
        assert!(!is_valid_pin("123"));
        assert!(!is_valid_pin("12345"));
        assert!(!is_valid_pin("12a4"));
    }
}
