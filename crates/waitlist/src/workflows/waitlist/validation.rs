//! Field-level predicates shared by the wizard, the submission client, and the intake guard.

use std::sync::OnceLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

pub const MINIMUM_AGE: i32 = 13;
pub const MAXIMUM_AGE: i32 = 120;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

/// `local@domain.tld` shape check. Empty or whitespace-bearing input is invalid.
pub fn valid_email(candidate: &str) -> bool {
    email_pattern().is_match(candidate)
}

/// Parse an ISO calendar date (`YYYY-MM-DD`).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Whole years between `birth` and `today`, one less when the birthday is still ahead.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age - 1
    } else {
        age
    }
}

/// Date-of-birth check relative to the evaluator's local date.
///
/// Dates up to and including tomorrow pass the future check (browser auto-fill can land on
/// the wrong side of midnight); the age bounds are inclusive.
pub fn valid_date_of_birth_on(raw: &str, today: NaiveDate) -> bool {
    let Some(birth) = parse_date(raw) else {
        return false;
    };

    match today.succ_opt() {
        Some(tomorrow) if birth > tomorrow => return false,
        _ => {}
    }

    let age = age_on(birth, today);
    (MINIMUM_AGE..=MAXIMUM_AGE).contains(&age)
}

pub fn valid_date_of_birth(raw: &str) -> bool {
    valid_date_of_birth_on(raw, Local::now().date_naive())
}

/// Instagram handles are stored with a leading `@`.
pub fn normalize_instagram(handle: &str) -> String {
    if handle.is_empty() || handle.starts_with('@') {
        handle.to_string()
    } else {
        format!("@{handle}")
    }
}
