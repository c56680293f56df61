//! Idempotent daily job entrypoint.
//!
//! Designed for cron-style "call this once a day" triggering where the
//! trigger may fire more than once or overlap with itself. No locking: the
//! snapshot and reminder-event uniqueness keys make every write an
//! insert-if-absent, so a duplicate run is a cheap no-op.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::nisab::{NisabService, RefreshSummary, SnapshotStore};
use crate::pricing::PriceProvider;
use crate::scheduler::{NotificationSink, ProfileStore, ReminderRunSummary, WealthSource, ZakatScheduler};
use crate::types::ZakatError;

/// Combined report of one daily run: the nisab refresh pass followed by the
/// reminder pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyJobReport {
    pub refresh: RefreshSummary,
    pub reminders: ReminderRunSummary,
}

impl DailyJobReport {
    /// True when every currency refreshed and every user evaluated cleanly.
    pub fn is_clean(&self) -> bool {
        self.refresh.is_clean() && self.reminders.is_clean()
    }
}

/// Runs the two daily passes in order: refresh nisab snapshots for every
/// configured currency, then evaluate every user's reminder state against
/// today's snapshots.
///
/// The reminder pass runs even when some currencies failed to refresh — users
/// in the currencies that did refresh should not be blocked, and users in the
/// failed ones surface as per-user errors in the summary.
pub async fn run_daily_job<P, S, PS, W, N>(
    nisab: &NisabService<P, S>,
    scheduler: &ZakatScheduler<PS, S, W, N>,
    today: NaiveDate,
) -> Result<DailyJobReport, ZakatError>
where
    P: PriceProvider,
    S: SnapshotStore,
    PS: ProfileStore,
    W: WealthSource,
    N: NotificationSink,
{
    tracing::info!(%today, "daily zakat job started");
    let refresh = nisab.refresh_all_currencies(today).await;
    if !refresh.is_clean() {
        tracing::warn!(
            failed = refresh.failure_count,
            total = refresh.results.len(),
            "nisab refresh finished with failures"
        );
    }
    let reminders = scheduler.process_all_users(today).await?;
    Ok(DailyJobReport { refresh, reminders })
}
