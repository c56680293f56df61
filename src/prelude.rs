//! Convenience re-exports for the common surface of the crate.

pub use crate::calendar::{
    DualDate, HijriDate, gregorian_date, gregorian_to_hijri, hijri_to_gregorian, holiday_for,
    month_name,
};
pub use crate::config::{NisabStandard, NisabWeights, ZakatConfig};
pub use crate::job::{DailyJobReport, run_daily_job};
pub use crate::nisab::{
    CurrencyRefresh, InMemorySnapshotStore, NisabService, NisabSnapshot, RefreshStatus,
    RefreshSummary, SnapshotStore, compute_thresholds,
};
pub use crate::pricing::{MetalPriceQuote, PriceProvider, Prices, StaticPriceProvider};
pub use crate::scheduler::{
    Decision, HijriAnniversary, InMemoryProfileStore, NotificationSink, ProfileStore,
    RecordingNotificationSink, ReminderEvent, ReminderRunSummary, StaticWealthSource, WealthSource,
    ZakatProfile, ZakatScheduler, evaluate,
};
pub use crate::types::ZakatError;
