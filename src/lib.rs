//! # hawl
//!
//! The scheduling core of a zakat-aware personal finance tracker:
//!
//! - **Dual-calendar engine** — exact Gregorian ⇄ Hijri conversion through
//!   the Julian Day Number, month naming, and holiday lookup
//!   ([`calendar`]).
//! - **Nisab threshold calculator** — turns live gold/silver prices into the
//!   per-currency wealth threshold, with one idempotent snapshot per
//!   (date, currency) ([`nisab`], [`pricing`]).
//! - **Reminder scheduler** — tracks each user's lunar anniversary (hawl) and
//!   fires at most one reminder per lunar year, safe under duplicate daily
//!   triggering ([`scheduler`], [`job`]).
//!
//! External collaborators — the price feed, the stores, the wealth figure,
//! and notification delivery — are traits, so the whole pipeline runs against
//! in-memory fakes in tests.

pub mod calendar;
pub mod config;
pub mod job;
pub mod nisab;
pub mod prelude;
pub mod pricing;
pub mod scheduler;
pub mod types;

pub use calendar::{DualDate, HijriDate, gregorian_to_hijri, hijri_to_gregorian};
pub use config::{NisabStandard, NisabWeights, ZakatConfig};
pub use job::{DailyJobReport, run_daily_job};
pub use nisab::{NisabService, NisabSnapshot, SnapshotStore};
pub use pricing::{PriceProvider, Prices};
pub use scheduler::{ZakatProfile, ZakatScheduler};
pub use types::ZakatError;
