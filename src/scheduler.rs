//! Zakat obligation tracker and reminder scheduler.
//!
//! Zakat falls due once qualifying wealth has stayed at or above nisab for a
//! full lunar year (the hawl), and recurs on that lunar anniversary. The
//! scheduler runs as a daily batch: it compares today's Hijri date and each
//! user's current wealth against the stored anniversary and threshold, and
//! fires at most one reminder per (user, Hijri year). The reminder-event
//! uniqueness key is the only dedup guard, so the batch is safe under
//! duplicate or concurrent triggering.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::hijri::{self, HijriDate, gregorian_to_hijri, hijri_to_gregorian};
use crate::config::ZakatConfig;
use crate::nisab::SnapshotStore;
use crate::types::ZakatError;

/// The recurring Hijri (month, day) on which a user's obligation is
/// re-evaluated each lunar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HijriAnniversary {
    pub month: u32,
    pub day: u32,
}

impl HijriAnniversary {
    pub fn new(month: u32, day: u32) -> Result<Self, ZakatError> {
        // Day 30 of a 29-day month is fine here: an anniversary is a recurring
        // (month, day) pattern, validated against the widest month length.
        if !(1..=12).contains(&month) || day == 0 || day > hijri::month_length(month, true) {
            return Err(ZakatError::InvalidCalendarInput(format!(
                "Invalid Hijri anniversary {month}/{day}"
            )));
        }
        Ok(Self { month, day })
    }

    /// Whether the given Hijri date lands on this anniversary.
    pub fn matches(&self, date: &HijriDate) -> bool {
        self.month == date.month && self.day == date.day
    }

    /// Projects the next occurrence of this anniversary onto the Gregorian
    /// calendar, on or after the given Hijri date. A day-30 anniversary in a
    /// year where the month only has 29 days falls on the month's last day.
    pub fn next_gregorian(&self, from: &HijriDate) -> Result<NaiveDate, ZakatError> {
        let this_year = self.clamped_to_year(from.year)?;
        let target = if (this_year.month, this_year.day) >= (from.month, from.day) {
            this_year
        } else {
            self.clamped_to_year(from.year + 1)?
        };
        hijri_to_gregorian(&target)
    }

    fn clamped_to_year(&self, year: i32) -> Result<HijriDate, ZakatError> {
        let day = self
            .day
            .min(hijri::month_length(self.month, hijri::is_leap_year(year)));
        HijriDate::new(year, self.month, day)
    }
}

/// Per-user zakat tracking state.
///
/// The anniversary is set lazily, the first time the user's qualifying
/// wealth reaches nisab, and is retained thereafter — including across a dip
/// below nisab and later re-qualification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZakatProfile {
    pub user_id: Uuid,
    /// The user's ledger currency; selects which nisab snapshot applies.
    pub currency: String,
    pub anniversary: Option<HijriAnniversary>,
    /// Denormalized convenience copy of the latest reminder year; the event
    /// store is the authoritative dedup record.
    pub last_reminder_hijri_year: Option<i32>,
}

impl ZakatProfile {
    pub fn new(user_id: Uuid, currency: impl Into<String>) -> Self {
        Self {
            user_id,
            currency: currency.into(),
            anniversary: None,
            last_reminder_hijri_year: None,
        }
    }
}

/// A fired reminder. At most one exists per (user_id, hijri_year); rows are
/// never deleted by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderEvent {
    pub user_id: Uuid,
    pub hijri_year: i32,
    pub fired_at: DateTime<Utc>,
}

/// Outcome of evaluating one user on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// First qualification: record today's (month, day) as the anniversary.
    /// No reminder on this call.
    EstablishAnniversary(HijriAnniversary),
    /// Anniversary matched and wealth qualifies; fire a reminder unless one
    /// already exists for this Hijri year.
    RemindIfNew,
    /// Anniversary matched but wealth is below nisab: the obligation lapses
    /// for this cycle. The anniversary is retained.
    Lapsed,
    /// Nothing to do today.
    NoAction,
}

/// Pure decision function for a single user.
///
/// All persistence (setting the anniversary, recording the event) is applied
/// by the scheduler afterwards; keeping this side-effect free makes the state
/// machine directly testable.
pub fn evaluate(
    profile: &ZakatProfile,
    today: &HijriDate,
    current_wealth: Decimal,
    nisab_value: Decimal,
) -> Result<Decision, ZakatError> {
    match profile.anniversary {
        None => {
            if current_wealth >= nisab_value {
                Ok(Decision::EstablishAnniversary(HijriAnniversary::new(
                    today.month,
                    today.day,
                )?))
            } else {
                Ok(Decision::NoAction)
            }
        }
        // Exact (month, day) match: the job runs daily, so a match is never
        // skipped over.
        Some(anniversary) if anniversary.matches(today) => {
            if current_wealth >= nisab_value {
                Ok(Decision::RemindIfNew)
            } else {
                Ok(Decision::Lapsed)
            }
        }
        Some(_) => Ok(Decision::NoAction),
    }
}

/// Profile and reminder-event persistence seam.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn list_profiles(&self) -> Result<Vec<ZakatProfile>, ZakatError>;

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<ZakatProfile>, ZakatError>;

    /// Sets the anniversary if and only if none is set yet (the anniversary
    /// is immutable once established).
    async fn set_anniversary(
        &self,
        user_id: Uuid,
        anniversary: HijriAnniversary,
    ) -> Result<(), ZakatError>;

    async fn set_last_reminder_year(&self, user_id: Uuid, year: i32) -> Result<(), ZakatError>;

    async fn has_reminder_event(&self, user_id: Uuid, hijri_year: i32) -> Result<bool, ZakatError>;

    /// Insert-if-absent on the (user_id, hijri_year) key. Returns `true` when
    /// this call created the event, `false` when it already existed — a lost
    /// race means the reminder was already handled.
    async fn record_reminder_event(&self, user_id: Uuid, hijri_year: i32)
    -> Result<bool, ZakatError>;
}

/// Supplies a user's current qualifying wealth in their ledger currency.
/// How that number is computed is outside the scheduler's scope.
#[async_trait::async_trait]
pub trait WealthSource: Send + Sync {
    async fn current_wealth(&self, user_id: Uuid) -> Result<Decimal, ZakatError>;
}

/// Delivery collaborator. The scheduler decides whether and when; the sink
/// owns the mechanics.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, user_id: Uuid, message: &str) -> Result<(), ZakatError>;
}

// ========== In-memory implementations ==========

/// In-memory profile/event store for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<Uuid, ZakatProfile>>,
    events: Mutex<Vec<ReminderEvent>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, profile: ZakatProfile) {
        self.profiles
            .lock()
            .expect("profile store poisoned")
            .insert(profile.user_id, profile);
    }

    pub fn events(&self) -> Vec<ReminderEvent> {
        self.events.lock().expect("event store poisoned").clone()
    }
}

fn poisoned(e: impl std::fmt::Display) -> ZakatError {
    ZakatError::Storage(format!("profile store poisoned: {e}"))
}

#[async_trait::async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn list_profiles(&self) -> Result<Vec<ZakatProfile>, ZakatError> {
        let mut profiles: Vec<ZakatProfile> =
            self.profiles.lock().map_err(poisoned)?.values().cloned().collect();
        profiles.sort_by_key(|p| p.user_id);
        Ok(profiles)
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<ZakatProfile>, ZakatError> {
        Ok(self.profiles.lock().map_err(poisoned)?.get(&user_id).cloned())
    }

    async fn set_anniversary(
        &self,
        user_id: Uuid,
        anniversary: HijriAnniversary,
    ) -> Result<(), ZakatError> {
        let mut profiles = self.profiles.lock().map_err(poisoned)?;
        let profile = profiles
            .get_mut(&user_id)
            .ok_or_else(|| ZakatError::Storage(format!("unknown user {user_id}")))?;
        if profile.anniversary.is_none() {
            profile.anniversary = Some(anniversary);
        }
        Ok(())
    }

    async fn set_last_reminder_year(&self, user_id: Uuid, year: i32) -> Result<(), ZakatError> {
        let mut profiles = self.profiles.lock().map_err(poisoned)?;
        if let Some(profile) = profiles.get_mut(&user_id) {
            profile.last_reminder_hijri_year = Some(year);
        }
        Ok(())
    }

    async fn has_reminder_event(&self, user_id: Uuid, hijri_year: i32) -> Result<bool, ZakatError> {
        let events = self.events.lock().map_err(poisoned)?;
        Ok(events
            .iter()
            .any(|e| e.user_id == user_id && e.hijri_year == hijri_year))
    }

    async fn record_reminder_event(
        &self,
        user_id: Uuid,
        hijri_year: i32,
    ) -> Result<bool, ZakatError> {
        let mut events = self.events.lock().map_err(poisoned)?;
        if events
            .iter()
            .any(|e| e.user_id == user_id && e.hijri_year == hijri_year)
        {
            return Ok(false);
        }
        events.push(ReminderEvent {
            user_id,
            hijri_year,
            fired_at: Utc::now(),
        });
        Ok(true)
    }
}

/// Fixed per-user wealth table for tests and development.
#[derive(Debug, Clone, Default)]
pub struct StaticWealthSource {
    balances: HashMap<Uuid, Decimal>,
}

impl StaticWealthSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, user_id: Uuid, wealth: Decimal) -> Self {
        self.balances.insert(user_id, wealth);
        self
    }
}

#[async_trait::async_trait]
impl WealthSource for StaticWealthSource {
    async fn current_wealth(&self, user_id: Uuid) -> Result<Decimal, ZakatError> {
        self.balances
            .get(&user_id)
            .copied()
            .ok_or_else(|| ZakatError::Storage(format!("no wealth figure for user {user_id}")))
    }
}

/// Notification sink that records messages instead of delivering them.
#[derive(Debug, Default)]
pub struct RecordingNotificationSink {
    sent: Mutex<Vec<(Uuid, String)>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(Uuid, String)> {
        self.sent.lock().expect("sink poisoned").clone()
    }
}

#[async_trait::async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn send(&self, user_id: Uuid, message: &str) -> Result<(), ZakatError> {
        self.sent
            .lock()
            .map_err(|e| ZakatError::Storage(format!("sink poisoned: {e}")))?
            .push((user_id, message.to_string()));
        Ok(())
    }
}

// ========== Batch scheduler ==========

/// Summary of one `process_all_users` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRunSummary {
    pub processed: usize,
    pub reminders_sent: usize,
    pub anniversaries_established: usize,
    pub errors: Vec<ZakatError>,
}

impl ReminderRunSummary {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Daily batch evaluator over all zakat profiles.
pub struct ZakatScheduler<P, S, W, N> {
    profiles: P,
    snapshots: S,
    wealth: W,
    sink: N,
    config: ZakatConfig,
}

impl<P, S, W, N> ZakatScheduler<P, S, W, N>
where
    P: ProfileStore,
    S: SnapshotStore,
    W: WealthSource,
    N: NotificationSink,
{
    pub fn new(profiles: P, snapshots: S, wealth: W, sink: N, config: ZakatConfig) -> Self {
        Self {
            profiles,
            snapshots,
            wealth,
            sink,
            config,
        }
    }

    pub fn profile_store(&self) -> &P {
        &self.profiles
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Evaluates every profile against today's date and thresholds.
    ///
    /// Per-user failures are collected, not propagated; repeated invocation
    /// on the same day sends nothing beyond the first run because the
    /// reminder-event key dedups it.
    pub async fn process_all_users(&self, today: NaiveDate) -> Result<ReminderRunSummary, ZakatError> {
        let today_hijri = gregorian_to_hijri(today)?;
        let profiles = self.profiles.list_profiles().await?;

        let mut summary = ReminderRunSummary {
            processed: 0,
            reminders_sent: 0,
            anniversaries_established: 0,
            errors: Vec::new(),
        };

        for profile in profiles {
            summary.processed += 1;
            match self.process_user(&profile, today, &today_hijri).await {
                Ok(Decision::RemindIfNew) => summary.reminders_sent += 1,
                Ok(Decision::EstablishAnniversary(_)) => summary.anniversaries_established += 1,
                Ok(_) => {}
                Err(e) => {
                    let err = ZakatError::for_user(profile.user_id, e);
                    tracing::warn!(user = %profile.user_id, error = %err, "user evaluation failed");
                    summary.errors.push(err);
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            reminders = summary.reminders_sent,
            errors = summary.errors.len(),
            hijri = %today_hijri,
            "reminder pass finished"
        );
        Ok(summary)
    }

    /// Evaluates one user and applies the decision. Returns `RemindIfNew`
    /// only when a reminder was actually sent by this call.
    async fn process_user(
        &self,
        profile: &ZakatProfile,
        today: NaiveDate,
        today_hijri: &HijriDate,
    ) -> Result<Decision, ZakatError> {
        let snapshot = self
            .snapshots
            .get(today, &profile.currency)
            .await?
            .ok_or_else(|| {
                ZakatError::Storage(format!(
                    "no nisab snapshot for {} on {today}",
                    profile.currency
                ))
            })?;
        let nisab_value = snapshot.gating_value(self.config.nisab_standard);
        let wealth = self.wealth.current_wealth(profile.user_id).await?;

        match evaluate(profile, today_hijri, wealth, nisab_value)? {
            Decision::EstablishAnniversary(anniversary) => {
                self.profiles
                    .set_anniversary(profile.user_id, anniversary)
                    .await?;
                tracing::debug!(
                    user = %profile.user_id,
                    month = anniversary.month,
                    day = anniversary.day,
                    "hawl anniversary established"
                );
                Ok(Decision::EstablishAnniversary(anniversary))
            }
            Decision::RemindIfNew => {
                let created = self
                    .profiles
                    .record_reminder_event(profile.user_id, today_hijri.year)
                    .await?;
                if !created {
                    // Already reminded this lunar year (or a concurrent run
                    // got there first).
                    return Ok(Decision::NoAction);
                }
                let message = format!(
                    "Zakat is due today, {today_hijri}. Your qualifying wealth of {wealth} {} \
                     meets the nisab threshold of {nisab_value} {}.",
                    profile.currency, profile.currency
                );
                self.sink.send(profile.user_id, &message).await?;
                self.profiles
                    .set_last_reminder_year(profile.user_id, today_hijri.year)
                    .await?;
                Ok(Decision::RemindIfNew)
            }
            other => Ok(other),
        }
    }
}
