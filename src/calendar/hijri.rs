//! Tabular Hijri calendar engine.
//!
//! Implements the arithmetical (30-year cycle) Hijri calendar: every cycle is
//! 10,631 days long — 11 leap years of 355 days and 19 common years of 354 —
//! with the leap years at fixed positions within the cycle. Because the table
//! is fixed, conversion through the Julian Day Number is calendar-exact and
//! round-trips losslessly in both directions.
//!
//! Local moon-sighting authorities can differ from the tabular calendar by a
//! day; callers that need to honour a sighting announcement should offset the
//! Gregorian input before converting.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::julian::{gregorian_from_jdn, julian_day_number};
use crate::types::ZakatError;

/// JDN of 1 Muharram 1 AH = 16 July 622 CE (proleptic Gregorian).
const HIJRI_EPOCH_JDN: i64 = 1_948_437;

/// Days in one 30-year cycle: 19 × 354 + 11 × 355.
const CYCLE_DAYS: i64 = 10_631;

const YEARS_PER_CYCLE: i64 = 30;

/// 1-indexed positions of leap years within the 30-year cycle.
const LEAP_POSITIONS: [u32; 11] = [2, 5, 7, 10, 13, 16, 18, 21, 24, 26, 29];

/// The twelve lunar month names, indexed by month number.
const MONTH_NAMES: [&str; 12] = [
    "Muharram",
    "Safar",
    "Rabi' al-Awwal",
    "Rabi' al-Thani",
    "Jumada al-Awwal",
    "Jumada al-Thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qi'dah",
    "Dhu al-Hijjah",
];

/// A validated date in the tabular Hijri calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HijriDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl HijriDate {
    /// Builds a Hijri date, validating every field against the tabular
    /// calendar (day bounds depend on the month and the year's leap status).
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, ZakatError> {
        if year < 1 {
            return Err(ZakatError::InvalidCalendarInput(format!(
                "Hijri year must be >= 1 AH, got {year}"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(ZakatError::InvalidCalendarInput(format!(
                "Hijri month must be 1-12, got {month}"
            )));
        }
        let max_day = month_length(month, is_leap_year(year));
        if day == 0 || day > max_day {
            return Err(ZakatError::InvalidCalendarInput(format!(
                "Day {day} out of range for {} {year} AH (1-{max_day})",
                MONTH_NAMES[(month - 1) as usize]
            )));
        }
        Ok(Self { year, month, day })
    }

    /// Name of this date's month.
    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }
}

impl std::fmt::Display for HijriDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} AH", self.day, self.month_name(), self.year)
    }
}

/// Whether `year` is a leap year (355 days) in the 30-year cycle.
pub fn is_leap_year(year: i32) -> bool {
    let position = (year - 1).rem_euclid(YEARS_PER_CYCLE as i32) as u32 + 1;
    LEAP_POSITIONS.contains(&position)
}

/// Length in days of `month` for the given leap status. Months alternate
/// 30/29, with Dhu al-Hijjah extended to 30 in a leap year.
pub fn month_length(month: u32, leap: bool) -> u32 {
    match month {
        12 if leap => 30,
        m if m % 2 == 1 => 30,
        _ => 29,
    }
}

/// Total days in the given Hijri year.
pub fn year_length(year: i32) -> u32 {
    if is_leap_year(year) { 355 } else { 354 }
}

/// Month name for a bare month number.
pub fn month_name(month: u32) -> Result<&'static str, ZakatError> {
    MONTH_NAMES
        .get(month.wrapping_sub(1) as usize)
        .copied()
        .ok_or_else(|| {
            ZakatError::InvalidCalendarInput(format!("Hijri month must be 1-12, got {month}"))
        })
}

/// Days from the epoch up to 1 Muharram of `year`.
fn days_before_year(year: i32) -> i64 {
    let elapsed = i64::from(year) - 1;
    let cycles = elapsed.div_euclid(YEARS_PER_CYCLE);
    let remainder = elapsed.rem_euclid(YEARS_PER_CYCLE) as i32;
    let cycle_start_year = (cycles * YEARS_PER_CYCLE) as i32 + 1;
    let mut days = cycles * CYCLE_DAYS;
    for y in cycle_start_year..cycle_start_year + remainder {
        days += i64::from(year_length(y));
    }
    days
}

/// Days from 1 Muharram up to the first of `month` in a year of the given
/// leap status.
fn days_before_month(month: u32, leap: bool) -> i64 {
    (1..month).map(|m| i64::from(month_length(m, leap))).sum()
}

/// Converts a Gregorian date to the tabular Hijri calendar.
///
/// Dates before the epoch (16 July 622 CE) are rejected, never clamped.
pub fn gregorian_to_hijri(date: NaiveDate) -> Result<HijriDate, ZakatError> {
    let days_since_epoch = julian_day_number(date) - HIJRI_EPOCH_JDN;
    if days_since_epoch < 0 {
        return Err(ZakatError::InvalidCalendarInput(format!(
            "{date} predates the Hijri epoch (622-07-16)"
        )));
    }

    let cycles = days_since_epoch.div_euclid(CYCLE_DAYS);
    let mut remaining = days_since_epoch.rem_euclid(CYCLE_DAYS);

    let mut year = (cycles * YEARS_PER_CYCLE) as i32 + 1;
    while remaining >= i64::from(year_length(year)) {
        remaining -= i64::from(year_length(year));
        year += 1;
    }

    let leap = is_leap_year(year);
    let mut month = 1;
    while remaining >= i64::from(month_length(month, leap)) {
        remaining -= i64::from(month_length(month, leap));
        month += 1;
    }

    HijriDate::new(year, month, remaining as u32 + 1)
}

/// Converts a Hijri date back to the Gregorian calendar. Exact inverse of
/// [`gregorian_to_hijri`]; the scheduler relies on it to project a lunar
/// anniversary onto a concrete Gregorian date.
pub fn hijri_to_gregorian(date: &HijriDate) -> Result<NaiveDate, ZakatError> {
    // Re-validate so a hand-built struct cannot smuggle an out-of-range day.
    let date = HijriDate::new(date.year, date.month, date.day)?;
    let jdn = HIJRI_EPOCH_JDN
        + days_before_year(date.year)
        + days_before_month(date.month, is_leap_year(date.year))
        + i64::from(date.day)
        - 1;
    gregorian_from_jdn(jdn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::julian::gregorian_date;

    #[test]
    fn test_epoch_fixed_point() {
        let epoch = gregorian_date(622, 7, 16).unwrap();
        let h = gregorian_to_hijri(epoch).unwrap();
        assert_eq!(h, HijriDate::new(1, 1, 1).unwrap());
        assert_eq!(hijri_to_gregorian(&h).unwrap(), epoch);
    }

    #[test]
    fn test_before_epoch_rejected() {
        let day_before = gregorian_date(622, 7, 15).unwrap();
        assert!(matches!(
            gregorian_to_hijri(day_before),
            Err(ZakatError::InvalidCalendarInput(_))
        ));
    }

    #[test]
    fn test_leap_year_membership() {
        // Positions {2,5,7,10,13,16,18,21,24,26,29} within each cycle.
        for year in 1..=30 {
            let expected = [2, 5, 7, 10, 13, 16, 18, 21, 24, 26, 29].contains(&year);
            assert_eq!(is_leap_year(year), expected, "year {year}");
            assert_eq!(year_length(year), if expected { 355 } else { 354 });
            // Same pattern one cycle later.
            assert_eq!(is_leap_year(year + 30), expected);
        }
    }

    #[test]
    fn test_cycle_day_total() {
        let total: u32 = (1..=30).map(year_length).sum();
        assert_eq!(i64::from(total), CYCLE_DAYS);
    }

    #[test]
    fn test_month_lengths() {
        assert_eq!(month_length(1, false), 30);
        assert_eq!(month_length(2, false), 29);
        assert_eq!(month_length(11, false), 30);
        assert_eq!(month_length(12, false), 29);
        assert_eq!(month_length(12, true), 30);

        let common: u32 = (1..=12).map(|m| month_length(m, false)).sum();
        let leap: u32 = (1..=12).map(|m| month_length(m, true)).sum();
        assert_eq!(common, 354);
        assert_eq!(leap, 355);
    }

    #[test]
    fn test_round_trip_long_span() {
        // Every 17th day across ~60 Gregorian years crosses plenty of month,
        // year, and cycle boundaries.
        let start = gregorian_date(1990, 1, 1).unwrap();
        let start_jdn = julian_day_number(start);
        for i in 0..1300 {
            let date = gregorian_from_jdn(start_jdn + i * 17).unwrap();
            let h = gregorian_to_hijri(date).unwrap();
            assert!(h.day <= month_length(h.month, is_leap_year(h.year)));
            assert_eq!(hijri_to_gregorian(&h).unwrap(), date, "via {h}");
        }
    }

    #[test]
    fn test_round_trip_hijri_first_and_last_days() {
        for year in [1, 2, 29, 30, 31, 1400, 1445, 1446, 1500] {
            for month in 1..=12 {
                let last = month_length(month, is_leap_year(year));
                for day in [1, last] {
                    let h = HijriDate::new(year, month, day).unwrap();
                    let g = hijri_to_gregorian(&h).unwrap();
                    assert_eq!(gregorian_to_hijri(g).unwrap(), h);
                }
            }
        }
    }

    #[test]
    fn test_known_conversion() {
        // 1 Ramadan 1446 AH in the tabular calendar.
        let h = HijriDate::new(1446, 9, 1).unwrap();
        let g = hijri_to_gregorian(&h).unwrap();
        assert_eq!(gregorian_to_hijri(g).unwrap(), h);
        assert_eq!(g.format("%Y").to_string(), "2025");
    }

    #[test]
    fn test_rejects_invalid_hijri_fields() {
        assert!(HijriDate::new(0, 1, 1).is_err());
        assert!(HijriDate::new(1446, 13, 1).is_err());
        assert!(HijriDate::new(1446, 0, 1).is_err());
        assert!(HijriDate::new(1446, 1, 31).is_err());
        // 1446 AH: position 6 in its cycle, a common year -> month 12 has 29 days.
        assert!(!is_leap_year(1446));
        assert!(HijriDate::new(1446, 12, 30).is_err());
        // 1447 AH is at leap position 7 -> 30 days.
        assert!(is_leap_year(1447));
        assert!(HijriDate::new(1447, 12, 30).is_ok());
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_name(1).unwrap(), "Muharram");
        assert_eq!(month_name(9).unwrap(), "Ramadan");
        assert_eq!(month_name(12).unwrap(), "Dhu al-Hijjah");
        assert!(month_name(0).is_err());
        assert!(month_name(13).is_err());
    }

    #[test]
    fn test_display() {
        let h = HijriDate::new(1446, 9, 1).unwrap();
        assert_eq!(h.to_string(), "1 Ramadan 1446 AH");
    }
}
