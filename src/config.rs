//! Crate configuration: jurisprudential constants and the supported
//! currency list.
//!
//! The nisab gram weights and the metal that gates eligibility are policy
//! choices that differ between scholarly conventions, so they are explicit,
//! named configuration — never inferred or silently hard-coded at a use site.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;

use crate::types::ZakatError;

/// Nisab standard selecting which metal's threshold gates Zakat eligibility
/// for monetary wealth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NisabStandard {
    /// Use the gold threshold (gold grams × gold price).
    Gold,
    /// Use the silver threshold (silver grams × silver price).
    Silver,
    /// Use the lower of the two — the stricter opinion, most beneficial for
    /// the poor.
    #[default]
    LowerOfTwo,
}

/// The classical gold/silver weight equivalents defining nisab.
///
/// Two conventions are in common use; pick one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NisabWeights {
    pub gold_grams: Decimal,
    pub silver_grams: Decimal,
}

impl NisabWeights {
    /// Classical weight equivalents: 20 mithqal ≈ 87.48 g gold,
    /// 200 dirham ≈ 612.36 g silver.
    pub fn classical() -> Self {
        Self {
            gold_grams: dec!(87.48),
            silver_grams: dec!(612.36),
        }
    }

    /// Contemporary rounded convention: 85 g gold, 595 g silver.
    pub fn contemporary() -> Self {
        Self {
            gold_grams: dec!(85),
            silver_grams: dec!(595),
        }
    }

    pub fn validate(&self) -> Result<(), ZakatError> {
        if self.gold_grams <= Decimal::ZERO || self.silver_grams <= Decimal::ZERO {
            return Err(ZakatError::Configuration(
                "Nisab gram weights must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for NisabWeights {
    fn default() -> Self {
        Self::contemporary()
    }
}

/// Global configuration for the daily nisab/reminder jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZakatConfig {
    pub weights: NisabWeights,
    pub nisab_standard: NisabStandard,
    /// Currencies the daily snapshot job refreshes.
    pub currencies: Vec<String>,
}

impl Default for ZakatConfig {
    fn default() -> Self {
        Self {
            weights: NisabWeights::default(),
            nisab_standard: NisabStandard::default(),
            currencies: vec!["USD".to_string()],
        }
    }
}

impl ZakatConfig {
    pub fn new(currencies: Vec<String>) -> Result<Self, ZakatError> {
        let config = Self {
            currencies,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for logical consistency.
    pub fn validate(&self) -> Result<(), ZakatError> {
        self.weights.validate()?;
        if self.currencies.is_empty() {
            return Err(ZakatError::Configuration(
                "At least one currency must be configured".to_string(),
            ));
        }
        if let Some(blank) = self.currencies.iter().find(|c| c.trim().is_empty()) {
            return Err(ZakatError::Configuration(format!(
                "Blank currency code in list: {blank:?}"
            )));
        }
        Ok(())
    }

    /// Loads the currency list from `ZAKAT_CURRENCIES` (comma-separated),
    /// keeping default weights and standard.
    pub fn from_env() -> Result<Self, ZakatError> {
        let raw = env::var("ZAKAT_CURRENCIES").map_err(|_| {
            ZakatError::Configuration("ZAKAT_CURRENCIES env var not set".to_string())
        })?;
        let currencies = raw
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        Self::new(currencies)
    }

    /// Loads and validates configuration from a JSON file.
    pub fn try_from_json(path: &str) -> Result<Self, ZakatError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ZakatError::Configuration(format!("Failed to read config file: {e}"))
        })?;
        let config: ZakatConfig = serde_json::from_str(&content).map_err(|e| {
            ZakatError::Configuration(format!("Failed to parse config JSON: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    // ========== Fluent helpers ==========

    pub fn with_weights(mut self, weights: NisabWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_nisab_standard(mut self, standard: NisabStandard) -> Self {
        self.nisab_standard = standard;
        self
    }

    pub fn with_currencies(mut self, currencies: Vec<String>) -> Self {
        self.currencies = currencies;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ZakatConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_currency_list_rejected() {
        let res = ZakatConfig::new(vec![]);
        assert!(matches!(res, Err(ZakatError::Configuration(_))));
    }

    #[test]
    fn test_blank_currency_rejected() {
        let res = ZakatConfig::new(vec!["USD".to_string(), "  ".to_string()]);
        assert!(res.is_err());
    }

    #[test]
    fn test_weight_conventions_differ() {
        let classical = NisabWeights::classical();
        let contemporary = NisabWeights::contemporary();
        assert!(classical.gold_grams > contemporary.gold_grams);
        assert!(classical.silver_grams > contemporary.silver_grams);
        assert!(classical.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = ZakatConfig::new(vec!["USD".to_string(), "MYR".to_string()])
            .unwrap()
            .with_weights(NisabWeights::classical())
            .with_nisab_standard(NisabStandard::Silver);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ZakatConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
