use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Crate-wide error type.
///
/// Batch operations never let one of these abort the whole run: calendar errors
/// are surfaced as validation failures at the call site, price and per-user
/// errors are collected into the batch summary (`RefreshSummary`,
/// `ReminderRunSummary`). A lost insert race is not an error at all — the
/// idempotent stores return the existing row instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum ZakatError {
    /// Out-of-range Gregorian or Hijri field values, or a date before the
    /// Hijri epoch.
    #[error("Invalid calendar input: {0}")]
    InvalidCalendarInput(String),

    /// The metal price provider was unreachable, returned malformed data, or
    /// does not quote the requested currency.
    #[error("Price fetch failed [{currency}]: {reason}")]
    PriceFetch { currency: String, reason: String },

    /// Inconsistent or incomplete configuration (gram weights, currency list,
    /// config file/env parsing).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A snapshot/profile/event store operation failed for a reason other than
    /// a key conflict.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A single user's reminder evaluation failed. Collected per user in
    /// `process_all_users`, never fatal to the batch.
    #[error("Evaluation failed for user {user_id}: {reason}")]
    UserEvaluation { user_id: Uuid, reason: String },
}

impl ZakatError {
    /// Wraps any error into a per-user evaluation failure so the batch loop
    /// can keep going.
    pub fn for_user(user_id: Uuid, err: impl std::fmt::Display) -> Self {
        ZakatError::UserEvaluation {
            user_id,
            reason: err.to_string(),
        }
    }
}
