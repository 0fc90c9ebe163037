//! Calendar arithmetic for locating reference days
//!
//! Every partial-month forecast needs the same handful of date operations:
//! - the last day of a month (the key of the monthly table)
//! - how many days remain until that last day
//! - the same day one or more years back
//! - the equivalent day in the previous month, counted from month end

use crate::{MathError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};

/// Returns the last calendar day of `day`'s month.
pub fn month_end_of(day: NaiveDate) -> Result<NaiveDate> {
    day.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next_first| next_first.pred_opt())
        .ok_or_else(|| MathError::DateOutOfRange(format!("no month end for {}", day)))
}

/// Returns the first calendar day of `day`'s month.
pub fn month_start_of(day: NaiveDate) -> Result<NaiveDate> {
    day.with_day(1)
        .ok_or_else(|| MathError::DateOutOfRange(format!("no month start for {}", day)))
}

/// Number of days from `day` (exclusive) to the end of its month.
///
/// The last day of a month yields `0`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use month_math::days_to_month_end;
///
/// let day = NaiveDate::from_ymd_opt(2023, 3, 15).unwrap();
/// assert_eq!(days_to_month_end(day).unwrap(), 16);
/// ```
pub fn days_to_month_end(day: NaiveDate) -> Result<u32> {
    let month_end = month_end_of(day)?;
    Ok(month_end.signed_duration_since(day).num_days() as u32)
}

/// Same calendar day `years` years before `day`.
///
/// February 29th maps to February 28th in non-leap years.
pub fn years_before(day: NaiveDate, years: u32) -> Result<NaiveDate> {
    day.checked_sub_months(Months::new(12 * years))
        .ok_or_else(|| {
            MathError::DateOutOfRange(format!("{} minus {} years is out of range", day, years))
        })
}

/// The day in the previous month that sits at the same distance from its
/// month end as `day` does from its own.
///
/// When the previous month is shorter than that distance the result falls
/// further back, in the month before it.
pub fn prior_month_equivalent_day(day: NaiveDate) -> Result<NaiveDate> {
    let offset = days_to_month_end(day)?;
    let prior_month_end = month_start_of(day)?
        .pred_opt()
        .ok_or_else(|| MathError::DateOutOfRange(format!("no month before {}", day)))?;

    prior_month_end
        .checked_sub_days(Days::new(u64::from(offset)))
        .ok_or_else(|| {
            MathError::DateOutOfRange(format!(
                "{} minus {} days is out of range",
                prior_month_end, offset
            ))
        })
}

/// Half-open range of consecutive days `[start, end)`.
#[derive(Debug, Clone)]
pub struct DateRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|day| *day < self.end)?;
        self.next = current.succ_opt();
        Some(current)
    }
}

/// Iterate the days in `[start, end)`. Empty when `start >= end`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange {
        next: Some(start),
        end,
    }
}
