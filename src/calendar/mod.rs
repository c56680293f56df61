//! Dual-calendar engine: Julian Day arithmetic, the tabular Hijri calendar,
//! and holiday lookup.

pub mod hijri;
pub mod holidays;
pub mod julian;

pub use hijri::{HijriDate, gregorian_to_hijri, hijri_to_gregorian, is_leap_year, month_length, month_name};
pub use holidays::{DualDate, holiday_for};
pub use julian::{gregorian_date, gregorian_from_jdn, julian_day_number};
