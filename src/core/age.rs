use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::warn;

use super::error::EngineError;

/// Age used when the household has no usable birth date on record.
pub const DEFAULT_FALLBACK_AGE: f64 = 35.0;

/// Source of "today", so projections stay reproducible in tests.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Parses `YYYY-MM-DD` or an RFC 3339 timestamp into a calendar date.
pub fn parse_birth_date(text: &str) -> Result<NaiveDate, EngineError> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| EngineError::InvalidBirthDate(text.to_string()))
}

/// Fractional age on `today`. Whole years are exact on birthdays; the fraction
/// is the share of the current birthday-to-birthday year that has elapsed.
pub fn age_at_date(date_of_birth: NaiveDate, today: NaiveDate) -> Result<f64, EngineError> {
    if date_of_birth > today {
        return Err(EngineError::BirthDateInFuture(date_of_birth));
    }

    let mut years = today.year() - date_of_birth.year();
    let mut last = anniversary(date_of_birth, date_of_birth.year() + years);
    if last > today {
        years -= 1;
        last = anniversary(date_of_birth, date_of_birth.year() + years);
    }
    let next = anniversary(date_of_birth, date_of_birth.year() + years + 1);

    let span = next.signed_duration_since(last).num_days().max(1) as f64;
    let elapsed = today.signed_duration_since(last).num_days() as f64;
    Ok(years as f64 + elapsed / span)
}

/// Applies the caller's fallback when the birth date is missing or unusable.
pub fn resolve_age(date_of_birth: Option<NaiveDate>, today: NaiveDate, fallback: f64) -> f64 {
    let Some(dob) = date_of_birth else {
        return fallback;
    };
    match age_at_date(dob, today) {
        Ok(age) => age,
        Err(err) => {
            warn!(%err, fallback, "birth date unusable, using fallback age");
            fallback
        }
    }
}

// Leap-day birthdays fall back to 28 February in non-leap years.
fn anniversary(date_of_birth: NaiveDate, year: i32) -> NaiveDate {
    date_of_birth
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, date_of_birth.month(), 28))
        .unwrap_or(date_of_birth)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn exactly_thirty_years_is_thirty() {
        let clock = FixedClock(date(2026, 10, 19));
        let dob = date(1996, 10, 19);
        assert_approx(age_at_date(dob, clock.today()).expect("valid age"), 30.0);
    }

    #[test]
    fn day_before_birthday_is_just_under_whole_year() {
        let age = age_at_date(date(1990, 6, 15), date(2020, 6, 14)).expect("valid age");
        assert!(age < 30.0 && age > 29.99, "got {age}");
    }

    #[test]
    fn half_year_is_roughly_half() {
        let age = age_at_date(date(1990, 1, 1), date(2020, 7, 2)).expect("valid age");
        assert!((age - 30.5).abs() < 0.01, "got {age}");
    }

    #[test]
    fn leap_day_birthday_counts_from_february_28() {
        let age = age_at_date(date(2000, 2, 29), date(2021, 2, 28)).expect("valid age");
        assert_approx(age, 21.0);
    }

    #[test]
    fn future_birth_date_is_rejected() {
        let err = age_at_date(date(2030, 1, 1), date(2026, 1, 1)).expect_err("must reject");
        assert_eq!(err, EngineError::BirthDateInFuture(date(2030, 1, 1)));
    }

    #[test]
    fn parse_accepts_plain_and_rfc3339_dates() {
        assert_eq!(parse_birth_date("1990-01-01"), Ok(date(1990, 1, 1)));
        assert_eq!(
            parse_birth_date("1985-03-04T00:00:00+01:00"),
            Ok(date(1985, 3, 4))
        );
    }

    #[test]
    fn parse_rejects_malformed_text() {
        let err = parse_birth_date("01/01/1990").expect_err("must reject");
        assert!(matches!(err, EngineError::InvalidBirthDate(_)));
    }

    #[test]
    fn resolve_age_uses_fallback_when_missing_or_future() {
        let today = date(2026, 1, 1);
        assert_approx(resolve_age(None, today, 35.0), 35.0);
        assert_approx(resolve_age(Some(date(2027, 1, 1)), today, 40.0), 40.0);
        assert_approx(resolve_age(Some(date(1996, 1, 1)), today, 40.0), 30.0);
    }
}
