//! Gregorian date ⇄ Julian Day Number arithmetic.
//!
//! The Julian Day Number is the continuous day count used as the neutral
//! intermediate between the Gregorian and Hijri calendars. By convention a JDN
//! labels the 24-hour period starting at noon UTC; since the rest of the crate
//! only deals in whole civil dates, the count is kept as an `i64`.

use chrono::{Datelike, NaiveDate};

use crate::types::ZakatError;

/// JDN of 0001-01-01 in the proleptic Gregorian calendar.
const JDN_OF_CE_DAY_ONE: i64 = 1_721_426;

/// Validating constructor for a proleptic Gregorian date.
///
/// Rejects a month outside 1–12 and a day outside the valid range for that
/// month/year (leap rule: divisible by 4, except centuries not divisible
/// by 400).
pub fn gregorian_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, ZakatError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        ZakatError::InvalidCalendarInput(format!(
            "{year:04}-{month:02}-{day:02} is not a valid Gregorian date"
        ))
    })
}

/// Converts a Gregorian date to its Julian Day Number (the JDN whose noon
/// falls on that civil date).
pub fn julian_day_number(date: NaiveDate) -> i64 {
    let (y, m) = if date.month() <= 2 {
        (i64::from(date.year()) - 1, i64::from(date.month()) + 9)
    } else {
        (i64::from(date.year()), i64::from(date.month()) - 3)
    };
    let era_days = 365 * y + y.div_euclid(4) - y.div_euclid(100) + y.div_euclid(400);
    // Month offset table collapsed into the (153m + 2)/5 run-length formula,
    // counting from March so the leap day lands at the end of the year.
    era_days + (153 * m + 2).div_euclid(5) + i64::from(date.day()) + 1_721_119
}

/// Converts a Julian Day Number back to the Gregorian date it labels.
///
/// Exact inverse of [`julian_day_number`]; fails only when the JDN falls
/// outside chrono's representable year range.
pub fn gregorian_from_jdn(jdn: i64) -> Result<NaiveDate, ZakatError> {
    let days_from_ce = jdn - JDN_OF_CE_DAY_ONE + 1;
    let days_from_ce = i32::try_from(days_from_ce)
        .map_err(|_| ZakatError::InvalidCalendarInput(format!("JDN {jdn} out of range")))?;
    NaiveDate::from_num_days_from_ce_opt(days_from_ce)
        .ok_or_else(|| ZakatError::InvalidCalendarInput(format!("JDN {jdn} out of range")))
}
