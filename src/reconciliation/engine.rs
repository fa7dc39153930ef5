//! Automatic ledger/statement reconciler
//!
//! Matching runs in four strictly ordered phases. Each phase walks the
//! statement in input order and claims the first unused ledger transaction
//! that qualifies; claimed transactions are gone for every later phase.
//!
//! 1. exact: same signed amount, same date
//! 2. date window: same signed amount, date within the margin
//! 3. amount tolerance: signed amounts within tolerance, date within the margin
//! 4. many-to-one: several ledger transactions summing to one statement line

use bigdecimal::BigDecimal;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::config::ReconcileConfig;
use crate::reconciliation::similarity::{amount_gap, days_between, same_sign};
use crate::reconciliation::subset_sum::find_subset_indices;
use crate::traits::*;
use crate::types::*;

const EXACT_CONFIDENCE: i64 = 100;
const DATE_WINDOW_CONFIDENCE: i64 = 95;
const AMOUNT_TOLERANCE_CONFIDENCE: i64 = 85;
const MANY_TO_ONE_CONFIDENCE: i64 = 70;
/// Confidence lost per day between the two dates
const CONFIDENCE_PER_DAY: i64 = 5;

/// Reconcile two collections with the given configuration
pub fn reconcile(
    internal: &[Transaction],
    external: &[Transaction],
    config: &ReconcileConfig,
) -> ReconciliationResult {
    ReconciliationEngine::with_config(config.clone()).reconcile(internal, external)
}

/// Automatic reconciler holding its configuration and input validator
pub struct ReconciliationEngine {
    config: ReconcileConfig,
    validator: Box<dyn InputValidator>,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::with_config(ReconcileConfig::default())
    }

    /// Create an engine with custom settings
    pub fn with_config(config: ReconcileConfig) -> Self {
        Self {
            config,
            validator: Box::new(DefaultInputValidator),
        }
    }

    /// Create an engine with custom settings and a custom input validator
    pub fn with_validator(config: ReconcileConfig, validator: Box<dyn InputValidator>) -> Self {
        Self { config, validator }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Validate both collections, then reconcile them
    pub fn reconcile_validated(
        &self,
        internal: &[Transaction],
        external: &[Transaction],
    ) -> ReconResult<ReconciliationResult> {
        self.config.validate()?;
        self.validator.validate_collection(Side::Internal, internal)?;
        self.validator.validate_collection(Side::External, external)?;
        Ok(self.reconcile(internal, external))
    }

    /// Partition both collections into matches and leftovers.
    ///
    /// Never fails: anything that does not match simply ends up in
    /// `unmatched_internal` / `unmatched_external`.
    pub fn reconcile(
        &self,
        internal: &[Transaction],
        external: &[Transaction],
    ) -> ReconciliationResult {
        let mut run = ReconcileRun::new(&self.config, internal, external);

        run.match_one_to_one(MatchRule::Exact);
        run.match_one_to_one(MatchRule::DateWindow);
        run.match_one_to_one(MatchRule::AmountTolerance);
        run.match_many_to_one();

        let result = run.finish();
        info!(
            matches = result.matches.len(),
            unmatched_internal = result.unmatched_internal.len(),
            unmatched_external = result.unmatched_external.len(),
            "reconciliation finished"
        );
        result
    }
}

/// Working state of a single `reconcile` call
struct ReconcileRun<'a> {
    config: &'a ReconcileConfig,
    internal: &'a [Transaction],
    external: &'a [Transaction],
    internal_amounts: Vec<BigDecimal>,
    external_amounts: Vec<BigDecimal>,
    internal_used: Vec<bool>,
    external_used: Vec<bool>,
    matches: Vec<ReconciliationMatch>,
}

impl<'a> ReconcileRun<'a> {
    fn new(
        config: &'a ReconcileConfig,
        internal: &'a [Transaction],
        external: &'a [Transaction],
    ) -> Self {
        Self {
            config,
            internal,
            external,
            internal_amounts: internal.iter().map(Transaction::signed_amount).collect(),
            external_amounts: external.iter().map(Transaction::signed_amount).collect(),
            internal_used: vec![false; internal.len()],
            external_used: vec![false; external.len()],
            matches: Vec::new(),
        }
    }

    fn qualifies(&self, rule: MatchRule, ext: usize, int: usize) -> bool {
        let ext_amount = &self.external_amounts[ext];
        let int_amount = &self.internal_amounts[int];
        let days = days_between(self.external[ext].date, self.internal[int].date);

        match rule {
            MatchRule::Exact => ext_amount == int_amount && days == 0,
            MatchRule::DateWindow => {
                ext_amount == int_amount && days <= self.config.date_margin_days
            }
            MatchRule::AmountTolerance => {
                amount_gap(ext_amount, int_amount) <= self.config.amount_tolerance
                    && days <= self.config.date_margin_days
            }
            MatchRule::ManyToOne | MatchRule::Manual => false,
        }
    }

    /// Phases 1-3: first qualifying unused ledger transaction per statement line
    fn match_one_to_one(&mut self, rule: MatchRule) {
        for ext in 0..self.external.len() {
            if self.external_used[ext] {
                continue;
            }

            let found = (0..self.internal.len())
                .find(|&int| !self.internal_used[int] && self.qualifies(rule, ext, int));

            if let Some(int) = found {
                let difference =
                    amount_gap(&self.external_amounts[ext], &self.internal_amounts[int]);
                let days = days_between(self.external[ext].date, self.internal[int].date);
                let confidence = match rule {
                    MatchRule::Exact => EXACT_CONFIDENCE,
                    MatchRule::DateWindow => DATE_WINDOW_CONFIDENCE - CONFIDENCE_PER_DAY * days,
                    _ => AMOUNT_TOLERANCE_CONFIDENCE - CONFIDENCE_PER_DAY * days,
                };
                self.claim(rule, &[int], ext, difference, confidence);
            }
        }
    }

    /// Phase 4: combine several ledger transactions into one statement line
    fn match_many_to_one(&mut self) {
        for ext in 0..self.external.len() {
            if self.external_used[ext] {
                continue;
            }

            let target = &self.external_amounts[ext];
            let pool: Vec<usize> = (0..self.internal.len())
                .filter(|&int| {
                    !self.internal_used[int]
                        && same_sign(&self.internal_amounts[int], target)
                        && days_between(self.internal[int].date, self.external[ext].date)
                            <= self.config.date_margin_days
                })
                .collect();

            if pool.is_empty() || pool.len() > self.config.max_candidate_pool {
                trace!(
                    external_id = %self.external[ext].id,
                    pool = pool.len(),
                    "skipping many-to-one search"
                );
                continue;
            }

            let amounts: Vec<BigDecimal> = pool
                .iter()
                .map(|&int| self.internal_amounts[int].clone())
                .collect();

            let Some(picked) = find_subset_indices(
                &amounts,
                target,
                &self.config.amount_tolerance,
                self.config.max_combination_size,
            ) else {
                debug!(
                    external_id = %self.external[ext].id,
                    pool = pool.len(),
                    "no combination found"
                );
                continue;
            };

            let selected: Vec<usize> = picked.into_iter().map(|i| pool[i]).collect();
            let sum: BigDecimal = selected.iter().map(|&int| &self.internal_amounts[int]).sum();
            let difference = amount_gap(&sum, target);
            self.claim(
                MatchRule::ManyToOne,
                &selected,
                ext,
                difference,
                MANY_TO_ONE_CONFIDENCE,
            );
        }
    }

    fn claim(
        &mut self,
        rule: MatchRule,
        internal: &[usize],
        ext: usize,
        difference: BigDecimal,
        confidence: i64,
    ) {
        for &int in internal {
            self.internal_used[int] = true;
        }
        self.external_used[ext] = true;

        let statement_line = &self.external[ext];
        let reconciliation_match = ReconciliationMatch {
            id: Uuid::new_v4().to_string(),
            internal_ids: internal.iter().map(|&int| self.internal[int].id.clone()).collect(),
            external_ids: vec![statement_line.id.clone()],
            total_amount: self.external_amounts[ext].clone(),
            date: statement_line.date,
            difference,
            status: MatchStatus::MatchedAuto,
            rule,
            rule_info: rule.describe(self.config.date_margin_days),
            confidence: clamp_score(confidence),
        };

        debug!(
            rule = %rule,
            external_id = %statement_line.id,
            internal_ids = ?reconciliation_match.internal_ids,
            difference = %reconciliation_match.difference,
            "claimed match"
        );
        self.matches.push(reconciliation_match);
    }

    fn finish(self) -> ReconciliationResult {
        let unmatched_internal = self
            .internal
            .iter()
            .zip(&self.internal_used)
            .filter(|(_, used)| !**used)
            .map(|(t, _)| t.clone())
            .collect();
        let unmatched_external = self
            .external
            .iter()
            .zip(&self.external_used)
            .filter(|(_, used)| !**used)
            .map(|(t, _)| t.clone())
            .collect();

        ReconciliationResult {
            matches: self.matches,
            unmatched_internal,
            unmatched_external,
        }
    }
}

/// Clamp a raw score into 0..=100
pub(crate) fn clamp_score(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}
