//! Tunables for the automatic reconciler and the candidate scorer

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Hard ceiling for `max_candidate_pool`; 2^20 branches per statement line
const MAX_CANDIDATE_POOL_CEILING: usize = 20;

/// Settings for [`crate::ReconciliationEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Largest day difference still considered a close date (inclusive)
    pub date_margin_days: i64,
    /// Largest signed-amount difference accepted by the tolerance phase
    #[serde(deserialize_with = "decimal_field::deserialize")]
    pub amount_tolerance: BigDecimal,
    /// Most ledger transactions combined into one many-to-one match
    pub max_combination_size: u32,
    /// Largest candidate pool handed to the subset-sum search
    pub max_candidate_pool: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            date_margin_days: 3,
            amount_tolerance: BigDecimal::from(5) / BigDecimal::from(100),
            max_combination_size: 4,
            max_candidate_pool: 15,
        }
    }
}

impl ReconcileConfig {
    pub fn validate(&self) -> ReconResult<()> {
        if self.date_margin_days < 0 {
            return Err(ReconError::Validation(
                "reconcile.date_margin_days cannot be negative".to_string(),
            ));
        }
        if self.amount_tolerance < BigDecimal::from(0) {
            return Err(ReconError::Validation(
                "reconcile.amount_tolerance cannot be negative".to_string(),
            ));
        }
        if self.max_candidate_pool > MAX_CANDIDATE_POOL_CEILING {
            return Err(ReconError::Validation(format!(
                "reconcile.max_candidate_pool cannot exceed {MAX_CANDIDATE_POOL_CEILING}, got {}",
                self.max_candidate_pool
            )));
        }
        Ok(())
    }
}

/// Settings for [`crate::CandidateScorer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Day difference beyond which the date axis contributes nothing
    pub date_margin_days: i64,
    /// Difference treated as rounding noise
    #[serde(deserialize_with = "decimal_field::deserialize")]
    pub amount_tolerance: BigDecimal,
    /// Largest absolute difference still considered tolerable
    #[serde(deserialize_with = "decimal_field::deserialize")]
    pub amount_tolerance_abs: BigDecimal,
    /// Candidates scoring below this are dropped
    pub min_score: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            date_margin_days: 5,
            amount_tolerance: BigDecimal::from(1),
            amount_tolerance_abs: BigDecimal::from(1000),
            min_score: 20,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> ReconResult<()> {
        if self.date_margin_days < 0 {
            return Err(ReconError::Validation(
                "scoring.date_margin_days cannot be negative".to_string(),
            ));
        }
        if self.amount_tolerance < BigDecimal::from(0)
            || self.amount_tolerance_abs < BigDecimal::from(0)
        {
            return Err(ReconError::Validation(
                "scoring tolerances cannot be negative".to_string(),
            ));
        }
        if self.min_score > 100 {
            return Err(ReconError::Validation(format!(
                "scoring.min_score must be within 0..=100, got {}",
                self.min_score
            )));
        }
        Ok(())
    }
}

/// Both configurations, as loaded from a TOML document.
///
/// Decimal values may be strings or bare numbers. A bare float is read
/// through its shortest decimal form, so `0.10` means exactly `0.1`:
///
/// ```toml
/// [reconcile]
/// date_margin_days = 2
/// amount_tolerance = "0.10"
///
/// [scoring]
/// amount_tolerance_abs = "250"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationSettings {
    pub reconcile: ReconcileConfig,
    pub scoring: ScoringConfig,
}

impl ReconciliationSettings {
    pub fn from_toml(input: &str) -> ReconResult<Self> {
        let settings: ReconciliationSettings =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ReconResult<()> {
        self.reconcile.validate()?;
        self.scoring.validate()
    }
}

/// Reads a decimal from a string, an integer or a float without picking up
/// binary floating point noise
mod decimal_field {
    use bigdecimal::BigDecimal;
    use serde::de::{self, Deserializer, Unexpected, Visitor};
    use std::fmt;
    use std::str::FromStr;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DecimalVisitor)
    }

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = BigDecimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal number or a decimal string")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<BigDecimal, E> {
            BigDecimal::from_str(value.trim())
                .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<BigDecimal, E> {
            Ok(BigDecimal::from(value))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<BigDecimal, E> {
            Ok(BigDecimal::from(value))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<BigDecimal, E> {
            // Display prints the shortest string that round-trips
            BigDecimal::from_str(&value.to_string())
                .map_err(|_| E::invalid_value(Unexpected::Float(value), &self))
        }
    }
}
