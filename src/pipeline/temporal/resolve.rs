//! Calendar arithmetic and plausibility checks.

use chrono::{Datelike, Days, Months, NaiveDate};

use super::types::{DateParts, OffsetUnit};

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

/// Offsets beyond this many units are treated as noise.
pub const MAX_OFFSET_AMOUNT: i64 = 10_000;

/// Why a written date could not become a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Implausible {
    YearOutOfRange,
    InvalidMonth,
    InvalidDay,
    OffsetOutOfRange,
}

impl Implausible {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YearOutOfRange => "year_out_of_range",
            Self::InvalidMonth => "invalid_month",
            Self::InvalidDay => "invalid_day",
            Self::OffsetOutOfRange => "offset_out_of_range",
        }
    }
}

fn check_year(year: i32) -> Result<(), Implausible> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(Implausible::YearOutOfRange)
    }
}

/// Build a date from written parts. A missing year comes from `fallback_year`,
/// a missing day is the 1st.
pub fn calendar_date(parts: DateParts, fallback_year: i32) -> Result<NaiveDate, Implausible> {
    let year = parts.year.unwrap_or(fallback_year);
    check_year(year)?;
    if !(1..=12).contains(&parts.month) {
        return Err(Implausible::InvalidMonth);
    }
    NaiveDate::from_ymd_opt(year, parts.month, parts.day.unwrap_or(1)).ok_or(Implausible::InvalidDay)
}

/// Shift `anchor` by a signed amount. Weeks are seven days; months and years
/// clamp to the end of the target month.
pub fn apply_offset(anchor: NaiveDate, amount: i64, unit: OffsetUnit) -> Result<NaiveDate, Implausible> {
    if amount.abs() > MAX_OFFSET_AMOUNT {
        return Err(Implausible::OffsetOutOfRange);
    }
    let magnitude = amount.unsigned_abs();
    let shifted = match unit {
        OffsetUnit::Day | OffsetUnit::Week => {
            let days = Days::new(if unit == OffsetUnit::Week { magnitude * 7 } else { magnitude });
            if amount >= 0 {
                anchor.checked_add_days(days)
            } else {
                anchor.checked_sub_days(days)
            }
        }
        OffsetUnit::Month | OffsetUnit::Year => {
            let months = if unit == OffsetUnit::Year { magnitude * 12 } else { magnitude };
            let months = Months::new(u32::try_from(months).map_err(|_| Implausible::OffsetOutOfRange)?);
            if amount >= 0 {
                anchor.checked_add_months(months)
            } else {
                anchor.checked_sub_months(months)
            }
        }
    };
    let date = shifted.ok_or(Implausible::OffsetOutOfRange)?;
    check_year(date.year())?;
    Ok(date)
}

/// Whether `date` lies beyond `today` plus the tolerance.
pub fn is_future(date: NaiveDate, today: NaiveDate, tolerance_days: i64) -> bool {
    (date - today).num_days() > tolerance_days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn full_date_resolves() {
        let parts = DateParts { year: Some(2024), month: 3, day: Some(15) };
        assert_eq!(calendar_date(parts, 1999), Ok(d(2024, 3, 15)));
    }

    #[test]
    fn missing_year_uses_fallback() {
        let parts = DateParts { year: None, month: 12, day: Some(1) };
        assert_eq!(calendar_date(parts, 2023), Ok(d(2023, 12, 1)));
    }

    #[test]
    fn missing_day_is_first_of_month() {
        let parts = DateParts { year: Some(2024), month: 2, day: None };
        assert_eq!(calendar_date(parts, 2000), Ok(d(2024, 2, 1)));
    }

    #[test]
    fn impossible_dates_rejected() {
        let feb30 = DateParts { year: Some(2024), month: 2, day: Some(30) };
        assert_eq!(calendar_date(feb30, 2024), Err(Implausible::InvalidDay));
        let month13 = DateParts { year: Some(2024), month: 13, day: Some(1) };
        assert_eq!(calendar_date(month13, 2024), Err(Implausible::InvalidMonth));
        let ancient = DateParts { year: Some(1850), month: 1, day: Some(1) };
        assert_eq!(calendar_date(ancient, 2024), Err(Implausible::YearOutOfRange));
    }

    #[test]
    fn leap_day_accepted() {
        let parts = DateParts { year: Some(2024), month: 2, day: Some(29) };
        assert_eq!(calendar_date(parts, 2024), Ok(d(2024, 2, 29)));
    }

    #[test]
    fn day_and_week_offsets() {
        assert_eq!(apply_offset(d(2024, 3, 15), -5, OffsetUnit::Day), Ok(d(2024, 3, 10)));
        assert_eq!(apply_offset(d(2024, 3, 15), 2, OffsetUnit::Week), Ok(d(2024, 3, 29)));
    }

    #[test]
    fn month_offset_clamps_to_month_end() {
        assert_eq!(apply_offset(d(2024, 3, 31), -1, OffsetUnit::Month), Ok(d(2024, 2, 29)));
        assert_eq!(apply_offset(d(2024, 2, 29), 1, OffsetUnit::Year), Ok(d(2025, 2, 28)));
    }

    #[test]
    fn huge_offsets_rejected() {
        assert_eq!(
            apply_offset(d(2024, 1, 1), 99_999, OffsetUnit::Year),
            Err(Implausible::OffsetOutOfRange)
        );
        assert_eq!(
            apply_offset(d(2024, 1, 1), 500, OffsetUnit::Year),
            Err(Implausible::YearOutOfRange)
        );
    }

    #[test]
    fn future_detection_respects_tolerance() {
        let today = d(2024, 3, 15);
        assert!(!is_future(d(2024, 4, 14), today, 30));
        assert!(is_future(d(2024, 4, 15), today, 30));
    }
}
