//! Nisab threshold calculator and daily snapshot service.
//!
//! A snapshot records, per (date, currency), the metal prices observed that
//! day and the two derived threshold values. Snapshots are append-only and
//! keyed: a second write for the same key returns the first row unchanged,
//! which is the entire idempotence story for the at-least-once daily trigger.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use futures::StreamExt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{NisabStandard, NisabWeights, ZakatConfig};
use crate::pricing::{MetalPriceQuote, PriceProvider};
use crate::types::ZakatError;

/// How many currency fetches may be in flight at once during a batch refresh.
const REFRESH_CONCURRENCY: usize = 4;

/// One day's nisab thresholds for one currency. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NisabSnapshot {
    pub date: NaiveDate,
    pub currency: String,
    pub gold_per_gram: Decimal,
    pub silver_per_gram: Decimal,
    pub nisab_gold_value: Decimal,
    pub nisab_silver_value: Decimal,
}

impl NisabSnapshot {
    /// The threshold value that gates eligibility under the given standard.
    pub fn gating_value(&self, standard: NisabStandard) -> Decimal {
        match standard {
            NisabStandard::Gold => self.nisab_gold_value,
            NisabStandard::Silver => self.nisab_silver_value,
            NisabStandard::LowerOfTwo => self.nisab_gold_value.min(self.nisab_silver_value),
        }
    }
}

/// Derives the two threshold values from a price quote.
///
/// `nisab_gold = gold_per_gram × gold_grams`, likewise for silver. Strictly
/// monotone in each price since weights are positive.
pub fn compute_thresholds(quote: &MetalPriceQuote, weights: &NisabWeights) -> (Decimal, Decimal) {
    (
        quote.prices.gold_per_gram * weights.gold_grams,
        quote.prices.silver_per_gram * weights.silver_grams,
    )
}

/// Persistence seam for nisab snapshots.
///
/// `upsert_if_absent` is the concurrency control: the (date, currency) key is
/// unique, and a writer that loses the race simply gets the winner's row back.
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Inserts the snapshot unless one already exists for its (date,
    /// currency) key; returns the stored row either way.
    async fn upsert_if_absent(&self, snapshot: NisabSnapshot) -> Result<NisabSnapshot, ZakatError>;

    async fn get(&self, date: NaiveDate, currency: &str) -> Result<Option<NisabSnapshot>, ZakatError>;
}

// The refresh service and the scheduler usually share one store.
#[async_trait::async_trait]
impl<T: SnapshotStore + ?Sized> SnapshotStore for std::sync::Arc<T> {
    async fn upsert_if_absent(&self, snapshot: NisabSnapshot) -> Result<NisabSnapshot, ZakatError> {
        (**self).upsert_if_absent(snapshot).await
    }

    async fn get(&self, date: NaiveDate, currency: &str) -> Result<Option<NisabSnapshot>, ZakatError> {
        (**self).get(date, currency).await
    }
}

/// In-memory snapshot store for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    rows: Mutex<HashMap<(NaiveDate, String), NisabSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("snapshot store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn upsert_if_absent(&self, snapshot: NisabSnapshot) -> Result<NisabSnapshot, ZakatError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|e| ZakatError::Storage(format!("snapshot store poisoned: {e}")))?;
        let key = (snapshot.date, snapshot.currency.clone());
        Ok(rows.entry(key).or_insert(snapshot).clone())
    }

    async fn get(&self, date: NaiveDate, currency: &str) -> Result<Option<NisabSnapshot>, ZakatError> {
        let rows = self
            .rows
            .lock()
            .map_err(|e| ZakatError::Storage(format!("snapshot store poisoned: {e}")))?;
        Ok(rows.get(&(date, currency.to_string())).cloned())
    }
}

/// Outcome of the refresh for one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CurrencyRefresh {
    Success(NisabSnapshot),
    Failure { currency: String, error: ZakatError },
}

/// Status of a multi-currency refresh batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshStatus {
    /// Every currency refreshed.
    Complete,
    /// Some currencies failed; the rest have snapshots.
    Partial,
    /// Every currency failed.
    Failed,
}

/// Summary of one `refresh_all_currencies` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub status: RefreshStatus,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<CurrencyRefresh>,
}

impl RefreshSummary {
    pub fn is_clean(&self) -> bool {
        self.failure_count == 0
    }

    pub fn failures(&self) -> Vec<&CurrencyRefresh> {
        self.results
            .iter()
            .filter(|r| matches!(r, CurrencyRefresh::Failure { .. }))
            .collect()
    }
}

/// Fetch-compute-persist service for daily nisab snapshots.
pub struct NisabService<P, S> {
    provider: P,
    store: S,
    config: ZakatConfig,
}

impl<P: PriceProvider, S: SnapshotStore> NisabService<P, S> {
    pub fn new(provider: P, store: S, config: ZakatConfig) -> Result<Self, ZakatError> {
        config.validate()?;
        Ok(Self {
            provider,
            store,
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ZakatConfig {
        &self.config
    }

    /// Fetches the current quote for one currency and persists today's
    /// snapshot. Safe to invoke any number of times per day: once a row
    /// exists for (today, currency) every later call returns it unchanged.
    pub async fn refresh_daily_snapshot(
        &self,
        currency: &str,
        today: NaiveDate,
    ) -> Result<NisabSnapshot, ZakatError> {
        if let Some(existing) = self.store.get(today, currency).await? {
            tracing::debug!(%currency, %today, "snapshot already present, skipping fetch");
            return Ok(existing);
        }

        let prices = self.provider.get_prices(currency).await?;
        let quote = MetalPriceQuote {
            currency: currency.to_string(),
            prices,
            as_of: today,
        };
        let (gold_value, silver_value) = compute_thresholds(&quote, &self.config.weights);

        let snapshot = NisabSnapshot {
            date: today,
            currency: currency.to_string(),
            gold_per_gram: prices.gold_per_gram,
            silver_per_gram: prices.silver_per_gram,
            nisab_gold_value: gold_value,
            nisab_silver_value: silver_value,
        };
        // A concurrent writer may have beaten us here; their row wins.
        let stored = self.store.upsert_if_absent(snapshot).await?;
        tracing::info!(
            %currency,
            %today,
            gold = %stored.nisab_gold_value,
            silver = %stored.nisab_silver_value,
            "nisab snapshot stored"
        );
        Ok(stored)
    }

    /// Refreshes every configured currency with bounded concurrency. One bad
    /// currency never blocks the rest; failures land in the summary.
    pub async fn refresh_all_currencies(&self, today: NaiveDate) -> RefreshSummary {
        let results: Vec<CurrencyRefresh> = futures::stream::iter(self.config.currencies.iter())
            .map(|currency| async move {
                match self.refresh_daily_snapshot(currency, today).await {
                    Ok(snapshot) => CurrencyRefresh::Success(snapshot),
                    Err(error) => {
                        tracing::warn!(%currency, %error, "currency refresh failed");
                        CurrencyRefresh::Failure {
                            currency: currency.clone(),
                            error,
                        }
                    }
                }
            })
            .buffer_unordered(REFRESH_CONCURRENCY)
            .collect()
            .await;

        let failure_count = results
            .iter()
            .filter(|r| matches!(r, CurrencyRefresh::Failure { .. }))
            .count();
        let success_count = results.len() - failure_count;
        let status = match (success_count, failure_count) {
            (_, 0) => RefreshStatus::Complete,
            (0, _) => RefreshStatus::Failed,
            _ => RefreshStatus::Partial,
        };

        RefreshSummary {
            status,
            success_count,
            failure_count,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{Prices, StaticPriceProvider};
    use rust_decimal_macros::dec;

    fn quote(gold: Decimal, silver: Decimal) -> MetalPriceQuote {
        MetalPriceQuote {
            currency: "USD".to_string(),
            prices: Prices::new(gold, silver).unwrap(),
            as_of: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        }
    }

    fn service(provider: StaticPriceProvider, currencies: &[&str]) -> NisabService<StaticPriceProvider, InMemorySnapshotStore> {
        let config = ZakatConfig::new(currencies.iter().map(|c| c.to_string()).collect()).unwrap();
        NisabService::new(provider, InMemorySnapshotStore::new(), config).unwrap()
    }

    #[test]
    fn test_thresholds_use_configured_weights() {
        let weights = NisabWeights::contemporary();
        let (gold, silver) = compute_thresholds(&quote(dec!(100), dec!(2)), &weights);
        assert_eq!(gold, dec!(8500)); // 100 * 85
        assert_eq!(silver, dec!(1190)); // 2 * 595

        let classical = NisabWeights::classical();
        let (gold_c, _) = compute_thresholds(&quote(dec!(100), dec!(2)), &classical);
        assert_eq!(gold_c, dec!(8748)); // 100 * 87.48
    }

    #[test]
    fn test_threshold_monotonicity() {
        let weights = NisabWeights::default();
        let (g1, s1) = compute_thresholds(&quote(dec!(50), dec!(1)), &weights);
        let (g2, s2) = compute_thresholds(&quote(dec!(51), dec!(1.2)), &weights);
        assert!(g2 > g1);
        assert!(s2 > s1);
    }

    #[test]
    fn test_gating_value_standards() {
        let snapshot = NisabSnapshot {
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            currency: "USD".to_string(),
            gold_per_gram: dec!(100),
            silver_per_gram: dec!(1),
            nisab_gold_value: dec!(8500),
            nisab_silver_value: dec!(595),
        };
        assert_eq!(snapshot.gating_value(NisabStandard::Gold), dec!(8500));
        assert_eq!(snapshot.gating_value(NisabStandard::Silver), dec!(595));
        assert_eq!(snapshot.gating_value(NisabStandard::LowerOfTwo), dec!(595));
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let provider = StaticPriceProvider::new()
            .with_currency("USD", dec!(65), dec!(0.85))
            .unwrap();
        let svc = service(provider, &["USD"]);
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let first = svc.refresh_daily_snapshot("USD", today).await.unwrap();
        let second = svc.refresh_daily_snapshot("USD", today).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(svc.store().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_if_absent_keeps_first_row() {
        let store = InMemorySnapshotStore::new();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mk = |gold: Decimal| NisabSnapshot {
            date,
            currency: "USD".to_string(),
            gold_per_gram: gold,
            silver_per_gram: dec!(1),
            nisab_gold_value: gold * dec!(85),
            nisab_silver_value: dec!(595),
        };

        let first = store.upsert_if_absent(mk(dec!(100))).await.unwrap();
        // Second writer for the same key loses; the original row comes back.
        let second = store.upsert_if_absent(mk(dec!(999))).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(second.gold_per_gram, dec!(100));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_all_isolates_failures() {
        // Provider only knows USD; EUR must fail without blocking USD.
        let provider = StaticPriceProvider::new()
            .with_currency("USD", dec!(65), dec!(0.85))
            .unwrap();
        let svc = service(provider, &["USD", "EUR"]);
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let summary = svc.refresh_all_currencies(today).await;
        assert_eq!(summary.status, RefreshStatus::Partial);
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.failure_count, 1);
        assert!(!summary.is_clean());
        assert!(svc.store().get(today, "USD").await.unwrap().is_some());
        assert!(svc.store().get(today, "EUR").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_all_complete_and_failed() {
        let provider = StaticPriceProvider::new()
            .with_currency("USD", dec!(65), dec!(0.85))
            .unwrap()
            .with_currency("MYR", dec!(305), dec!(4.1))
            .unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let svc = service(provider.clone(), &["USD", "MYR"]);
        assert_eq!(svc.refresh_all_currencies(today).await.status, RefreshStatus::Complete);

        let svc = service(provider, &["GBP", "JPY"]);
        let summary = svc.refresh_all_currencies(today).await;
        assert_eq!(summary.status, RefreshStatus::Failed);
        assert_eq!(summary.failures().len(), 2);
    }

    #[tokio::test]
    async fn test_repeat_batch_creates_no_new_rows() {
        let provider = StaticPriceProvider::new()
            .with_currency("USD", dec!(65), dec!(0.85))
            .unwrap();
        let svc = service(provider, &["USD"]);
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        svc.refresh_all_currencies(today).await;
        svc.refresh_all_currencies(today).await;
        assert_eq!(svc.store().len(), 1);
    }
}
