//! Metal price provider abstraction.
//!
//! The nisab calculator only ever sees the [`PriceProvider`] trait, so live
//! REST backends, database caches, and static test fixtures are all
//! interchangeable. Providers quote per currency; a currency the backend does
//! not carry is a [`ZakatError::PriceFetch`], not a silent zero.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ZakatError;

/// Current market prices for the two nisab metals, per gram, in one currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prices {
    pub gold_per_gram: Decimal,
    pub silver_per_gram: Decimal,
}

impl Prices {
    /// Creates a price pair. Both prices must be strictly positive — a zero
    /// or negative quote is malformed provider data.
    pub fn new(gold_per_gram: Decimal, silver_per_gram: Decimal) -> Result<Self, ZakatError> {
        if gold_per_gram <= Decimal::ZERO || silver_per_gram <= Decimal::ZERO {
            return Err(ZakatError::Configuration(format!(
                "Metal prices must be positive (gold {gold_per_gram}, silver {silver_per_gram})"
            )));
        }
        Ok(Self {
            gold_per_gram,
            silver_per_gram,
        })
    }
}

/// A dated, currency-tagged price quote as fetched from a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalPriceQuote {
    pub currency: String,
    pub prices: Prices,
    pub as_of: NaiveDate,
}

/// Trait for fetching current metal prices in a given currency.
///
/// Implementors may hit live APIs, read a database, or serve fixed test data.
/// All failure modes (network, unsupported currency, malformed payload) map
/// to `ZakatError::PriceFetch` so the refresh batch can isolate them per
/// currency.
#[async_trait::async_trait]
pub trait PriceProvider: Send + Sync {
    async fn get_prices(&self, currency: &str) -> Result<Prices, ZakatError>;
}

/// A fixed per-currency price table for tests and development.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceProvider {
    table: HashMap<String, Prices>,
}

impl StaticPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the quote for a currency.
    pub fn with_currency(
        mut self,
        currency: impl Into<String>,
        gold_per_gram: Decimal,
        silver_per_gram: Decimal,
    ) -> Result<Self, ZakatError> {
        self.table
            .insert(currency.into(), Prices::new(gold_per_gram, silver_per_gram)?);
        Ok(self)
    }
}

#[async_trait::async_trait]
impl PriceProvider for StaticPriceProvider {
    async fn get_prices(&self, currency: &str) -> Result<Prices, ZakatError> {
        self.table
            .get(currency)
            .copied()
            .ok_or_else(|| ZakatError::PriceFetch {
                currency: currency.to_string(),
                reason: "currency not supported by provider".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_prices_rejects_non_positive() {
        assert!(Prices::new(dec!(0), dec!(1)).is_err());
        assert!(Prices::new(dec!(65), dec!(-0.5)).is_err());
        assert!(Prices::new(dec!(65), dec!(0.85)).is_ok());
    }

    #[tokio::test]
    async fn test_static_provider_per_currency() {
        let provider = StaticPriceProvider::new()
            .with_currency("USD", dec!(65), dec!(0.85))
            .unwrap()
            .with_currency("MYR", dec!(305), dec!(4.1))
            .unwrap();

        let usd = provider.get_prices("USD").await.unwrap();
        assert_eq!(usd.gold_per_gram, dec!(65));

        let myr = provider.get_prices("MYR").await.unwrap();
        assert_eq!(myr.silver_per_gram, dec!(4.1));
    }

    #[tokio::test]
    async fn test_static_provider_unsupported_currency() {
        let provider = StaticPriceProvider::new()
            .with_currency("USD", dec!(65), dec!(0.85))
            .unwrap();

        let err = provider.get_prices("EUR").await.unwrap_err();
        assert!(matches!(err, ZakatError::PriceFetch { ref currency, .. } if currency == "EUR"));
    }
}
