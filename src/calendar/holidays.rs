//! Holiday lookup and the paired dual-calendar date.

use chrono::NaiveDate;
use serde::Serialize;

use super::hijri::{HijriDate, gregorian_to_hijri};
use crate::types::ZakatError;

/// Fixed (month, day) → label table. Year-independent: observances recur on
/// the same Hijri month/day every year.
const HOLIDAYS: [(u32, u32, &str); 6] = [
    (1, 1, "Islamic New Year"),
    (1, 10, "Day of Ashura"),
    (9, 1, "First day of Ramadan"),
    (10, 1, "Eid al-Fitr"),
    (12, 9, "Day of Arafah"),
    (12, 10, "Eid al-Adha"),
];

/// Looks up the holiday observed on the given Hijri (month, day), if any.
pub fn holiday_for(month: u32, day: u32) -> Option<&'static str> {
    HOLIDAYS
        .iter()
        .find(|(m, d, _)| *m == month && *d == day)
        .map(|(_, _, label)| *label)
}

/// A Gregorian date paired with its Hijri equivalent and any holiday falling
/// on it. The two representations are always produced together so they cannot
/// drift relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DualDate {
    pub gregorian: NaiveDate,
    pub hijri: HijriDate,
    pub holiday: Option<&'static str>,
}

impl DualDate {
    /// Resolves a Gregorian date into its dual-calendar form.
    pub fn resolve(gregorian: NaiveDate) -> Result<Self, ZakatError> {
        let hijri = gregorian_to_hijri(gregorian)?;
        Ok(Self {
            gregorian,
            hijri,
            holiday: holiday_for(hijri.month, hijri.day),
        })
    }
}
