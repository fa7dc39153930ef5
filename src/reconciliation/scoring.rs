//! Candidate ranking for manual review
//!
//! Unlike the automatic reconciler, the scorer never claims anything: every
//! statement line is scored against the whole ledger pool on its own.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::reconciliation::engine::clamp_score;
use crate::reconciliation::similarity::{amount_gap, days_between, description_similarity};
use crate::types::*;

const STRONG_DESCRIPTION_SIMILARITY: f64 = 0.8;
const PARTIAL_DESCRIPTION_SIMILARITY: f64 = 0.5;

/// Why a candidate earned (or was forced to) its score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Same amount on the same date; the score is forced to 100
    ExactFinancialMatch,
    ExactAmount,
    /// Difference within the rounding tolerance
    NearExactAmount,
    /// Difference within the absolute tolerance
    TolerableAmount,
    /// Difference within 5% of the target amount
    SimilarAmount,
    SameDate,
    OneDayApart,
    WithinDateWindow { days: i64 },
    StrongDescriptionMatch,
    PartialDescriptionMatch,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactFinancialMatch => write!(f, "exact financial match"),
            Self::ExactAmount => write!(f, "exact amount"),
            Self::NearExactAmount => write!(f, "near-exact amount (rounding)"),
            Self::TolerableAmount => write!(f, "tolerable amount difference"),
            Self::SimilarAmount => write!(f, "similar amount (±5%)"),
            Self::SameDate => write!(f, "same date"),
            Self::OneDayApart => write!(f, "1 day apart"),
            Self::WithinDateWindow { days } => write!(f, "{days} days apart"),
            Self::StrongDescriptionMatch => write!(f, "very similar description"),
            Self::PartialDescriptionMatch => write!(f, "partially similar description"),
        }
    }
}

/// One scored axis of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReason {
    pub code: ReasonCode,
    /// Points this reason contributed; 0 for the override marker
    pub points: i64,
}

/// A ledger transaction proposed for one statement line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationCandidate {
    pub transaction: Transaction,
    /// Score from 0 to 100
    pub score: u8,
    /// Triggered reasons, in evaluation order
    pub reasons: Vec<ScoreReason>,
}

impl ReconciliationCandidate {
    /// Human-readable explanation of the score
    pub fn reason(&self) -> String {
        self.reasons
            .iter()
            .map(|r| r.code.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_exact_financial_match(&self) -> bool {
        self.reasons
            .first()
            .is_some_and(|r| r.code == ReasonCode::ExactFinancialMatch)
    }
}

/// Rank `pool` against `target` with the given configuration
pub fn find_candidates(
    target: &Transaction,
    pool: &[Transaction],
    config: &ScoringConfig,
) -> Vec<ReconciliationCandidate> {
    CandidateScorer::new(config.clone()).find_candidates(target, pool)
}

/// Rank `pool` against every target with the default configuration.
///
/// Keyed by target id; see [`CandidateScorer::find_batch_candidates`].
pub fn find_batch_candidates(
    targets: &[Transaction],
    pool: &[Transaction],
) -> HashMap<String, Vec<ReconciliationCandidate>> {
    CandidateScorer::default().find_batch_candidates(targets, pool)
}

/// Heuristic scorer ranking ledger transactions against statement lines
#[derive(Debug, Clone, Default)]
pub struct CandidateScorer {
    config: ScoringConfig,
}

impl CandidateScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Rank `pool` against `target`, best first.
    ///
    /// Candidates scoring below `min_score` are left out. Equal scores keep
    /// their pool order.
    pub fn find_candidates(
        &self,
        target: &Transaction,
        pool: &[Transaction],
    ) -> Vec<ReconciliationCandidate> {
        let mut candidates: Vec<ReconciliationCandidate> = pool
            .iter()
            .filter_map(|candidate| self.score(target, candidate))
            .collect();

        candidates.sort_by(|a, b| b.score.cmp(&a.score));

        debug!(
            target_id = %target.id,
            pool = pool.len(),
            candidates = candidates.len(),
            "scored candidates"
        );
        candidates
    }

    /// Rank `pool` against each target independently, keyed by target id.
    ///
    /// The same ledger transaction may appear in several lists. Target ids
    /// must be unique: a repeated id keeps only the last target's list. Run
    /// [`InputValidator::validate_collection`](crate::InputValidator::validate_collection)
    /// first when the statement is untrusted.
    pub fn find_batch_candidates(
        &self,
        targets: &[Transaction],
        pool: &[Transaction],
    ) -> HashMap<String, Vec<ReconciliationCandidate>> {
        targets
            .iter()
            .map(|target| (target.id.clone(), self.find_candidates(target, pool)))
            .collect()
    }

    /// Score a single pair; `None` when it falls below the inclusion threshold
    pub fn score(
        &self,
        target: &Transaction,
        candidate: &Transaction,
    ) -> Option<ReconciliationCandidate> {
        let difference = amount_gap(&target.signed_amount(), &candidate.signed_amount());
        let days = days_between(target.date, candidate.date);

        let mut reasons = Vec::new();
        if let Some(reason) = self.amount_reason(&difference, &target.signed_amount()) {
            reasons.push(reason);
        }
        if let Some(reason) = self.date_reason(days) {
            reasons.push(reason);
        }
        if let Some(reason) = description_reason(&target.description, &candidate.description) {
            reasons.push(reason);
        }

        let raw: i64 = reasons.iter().map(|r| r.points).sum();
        if raw < i64::from(self.config.min_score) {
            return None;
        }

        let score = if difference == BigDecimal::from(0) && days == 0 {
            reasons.insert(
                0,
                ScoreReason {
                    code: ReasonCode::ExactFinancialMatch,
                    points: 0,
                },
            );
            100
        } else {
            clamp_score(raw)
        };

        Some(ReconciliationCandidate {
            transaction: candidate.clone(),
            score,
            reasons,
        })
    }

    fn amount_reason(
        &self,
        difference: &BigDecimal,
        target_amount: &BigDecimal,
    ) -> Option<ScoreReason> {
        let five_percent = target_amount.abs() * BigDecimal::from(5) / BigDecimal::from(100);

        let (code, points) = if *difference == BigDecimal::from(0) {
            (ReasonCode::ExactAmount, 50)
        } else if *difference <= self.config.amount_tolerance {
            (ReasonCode::NearExactAmount, 48)
        } else if *difference <= self.config.amount_tolerance_abs {
            (ReasonCode::TolerableAmount, 45)
        } else if *difference <= five_percent {
            (ReasonCode::SimilarAmount, 30)
        } else {
            return None;
        };

        Some(ScoreReason { code, points })
    }

    fn date_reason(&self, days: i64) -> Option<ScoreReason> {
        let (code, points) = match days {
            0 => (ReasonCode::SameDate, 30),
            1 => (ReasonCode::OneDayApart, 25),
            d if d <= self.config.date_margin_days => {
                (ReasonCode::WithinDateWindow { days: d }, 20 - 2 * d)
            }
            _ => return None,
        };

        Some(ScoreReason { code, points })
    }
}

fn description_reason(target: &str, candidate: &str) -> Option<ScoreReason> {
    let similarity = description_similarity(target, candidate);

    if similarity > STRONG_DESCRIPTION_SIMILARITY {
        Some(ScoreReason {
            code: ReasonCode::StrongDescriptionMatch,
            points: 20,
        })
    } else if similarity > PARTIAL_DESCRIPTION_SIMILARITY {
        Some(ScoreReason {
            code: ReasonCode::PartialDescriptionMatch,
            points: 10,
        })
    } else {
        None
    }
}
