//! Core types and data structures for ledger/statement reconciliation

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Direction of a money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Money coming in - carries a positive sign
    Income,
    /// Money going out - carries a negative sign
    Expense,
}

/// A single movement from either the ledger or the statement.
///
/// Transactions are produced upstream (ledger import, statement import) and
/// are read-only inputs to the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier within its collection
    pub id: String,
    /// Calendar date the movement was recorded on
    pub date: NaiveDate,
    /// Free-text description (payee, memo, bank narrative...)
    pub description: String,
    /// Non-negative magnitude of the movement
    pub amount: BigDecimal,
    /// Whether this is income or an expense
    pub kind: TransactionKind,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(
        id: String,
        date: NaiveDate,
        description: String,
        amount: BigDecimal,
        kind: TransactionKind,
    ) -> Self {
        Self {
            id,
            date,
            description,
            amount,
            kind,
        }
    }

    /// Create an income transaction
    pub fn income(id: String, date: NaiveDate, description: String, amount: BigDecimal) -> Self {
        Self::new(id, date, description, amount, TransactionKind::Income)
    }

    /// Create an expense transaction
    pub fn expense(id: String, date: NaiveDate, description: String, amount: BigDecimal) -> Self {
        Self::new(id, date, description, amount, TransactionKind::Expense)
    }

    /// Amount with the sign implied by the kind: `+amount` for income,
    /// `-amount` for expenses.
    pub fn signed_amount(&self) -> BigDecimal {
        match self.kind {
            TransactionKind::Income => self.amount.clone(),
            TransactionKind::Expense => -self.amount.clone(),
        }
    }
}

/// Lifecycle state of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Produced by the automatic reconciler
    MatchedAuto,
    /// Confirmed or created by a person
    MatchedManual,
    /// Proposed from a candidate ranking, awaiting review
    Suggested,
    /// Reopened for review
    Pending,
    /// Frozen; no further changes allowed
    Locked,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchedAuto => write!(f, "matched_auto"),
            Self::MatchedManual => write!(f, "matched_manual"),
            Self::Suggested => write!(f, "suggested"),
            Self::Pending => write!(f, "pending"),
            Self::Locked => write!(f, "locked"),
        }
    }
}

/// Which rule produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Same signed amount, same date
    Exact,
    /// Same signed amount, date within the margin
    DateWindow,
    /// Signed amount within tolerance, date within the margin
    AmountTolerance,
    /// Several ledger entries summing to one statement line
    ManyToOne,
    /// Assembled by hand
    Manual,
}

impl MatchRule {
    /// Human-readable description stored in `rule_info`
    pub fn describe(&self, date_margin_days: i64) -> String {
        match self {
            Self::Exact => "Exact (date and amount)".to_string(),
            Self::DateWindow => format!("Exact amount, date within ±{date_margin_days} days"),
            Self::AmountTolerance => {
                format!("Amount within tolerance, date within ±{date_margin_days} days")
            }
            Self::ManyToOne => "Many-to-one".to_string(),
            Self::Manual => "Manual".to_string(),
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::DateWindow => write!(f, "date_window"),
            Self::AmountTolerance => write!(f, "amount_tolerance"),
            Self::ManyToOne => write!(f, "many_to_one"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A set of ledger transactions and statement transactions recognised as
/// the same real-world event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationMatch {
    /// Unique identifier for the match
    pub id: String,
    /// Ids from the internal (ledger) collection
    pub internal_ids: Vec<String>,
    /// Ids from the external (statement) collection
    pub external_ids: Vec<String>,
    /// Sum of the signed amounts on the external side
    pub total_amount: BigDecimal,
    /// Representative date: the external transaction's date when present
    pub date: NaiveDate,
    /// Absolute monetary gap tolerated by the match, never negative
    pub difference: BigDecimal,
    /// Lifecycle state
    pub status: MatchStatus,
    /// Rule that produced the match
    pub rule: MatchRule,
    /// Human-readable description of the rule
    pub rule_info: String,
    /// Certainty from 0 to 100
    pub confidence: u8,
}

impl ReconciliationMatch {
    /// True when exactly one transaction sits on each side
    pub fn is_one_to_one(&self) -> bool {
        self.internal_ids.len() == 1 && self.external_ids.len() == 1
    }

    /// True when the given transaction id is claimed by this match
    pub fn involves(&self, transaction_id: &str) -> bool {
        self.internal_ids.iter().any(|id| id == transaction_id)
            || self.external_ids.iter().any(|id| id == transaction_id)
    }

    /// All transaction ids claimed by this match, internal side first
    pub fn transaction_ids(&self) -> impl Iterator<Item = &String> {
        self.internal_ids.iter().chain(self.external_ids.iter())
    }
}

/// Outcome of one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Matches in the order they were found
    pub matches: Vec<ReconciliationMatch>,
    /// Ledger transactions not claimed by any match, in input order
    pub unmatched_internal: Vec<Transaction>,
    /// Statement transactions not claimed by any match, in input order
    pub unmatched_external: Vec<Transaction>,
}

impl ReconciliationResult {
    /// True when nothing was left unmatched on either side
    pub fn is_fully_reconciled(&self) -> bool {
        self.unmatched_internal.is_empty() && self.unmatched_external.is_empty()
    }

    /// Find the match that claims a transaction, if any
    pub fn match_for(&self, transaction_id: &str) -> Option<&ReconciliationMatch> {
        self.matches.iter().find(|m| m.involves(transaction_id))
    }

    /// Counts per rule and per side
    pub fn summary(&self) -> ReconciliationSummary {
        let mut by_rule: HashMap<MatchRule, usize> = HashMap::new();
        for m in &self.matches {
            *by_rule.entry(m.rule).or_default() += 1;
        }

        ReconciliationSummary {
            total_matches: self.matches.len(),
            matched_internal: self.matches.iter().map(|m| m.internal_ids.len()).sum(),
            matched_external: self.matches.iter().map(|m| m.external_ids.len()).sum(),
            unmatched_internal: self.unmatched_internal.len(),
            unmatched_external: self.unmatched_external.len(),
            by_rule,
        }
    }
}

/// Aggregate counts for a [`ReconciliationResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub total_matches: usize,
    pub matched_internal: usize,
    pub matched_external: usize,
    pub unmatched_internal: usize,
    pub unmatched_external: usize,
    pub by_rule: HashMap<MatchRule, usize>,
}

impl fmt::Display for ReconciliationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} matches ({} ledger / {} statement transactions), {} ledger and {} statement unmatched",
            self.total_matches,
            self.matched_internal,
            self.matched_external,
            self.unmatched_internal,
            self.unmatched_external
        )
    }
}

/// Which input collection a transaction belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Internal,
    External,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::External => write!(f, "external"),
        }
    }
}

/// Errors that can occur around reconciliation
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Duplicate {side} transaction id: {id}")]
    DuplicateTransaction { side: Side, id: String },
    #[error("Match not found: {0}")]
    MatchNotFound(String),
    #[error("Match is locked: {0}")]
    MatchLocked(String),
    #[error("Cannot move match from {from} to {to}")]
    InvalidStatusTransition { from: MatchStatus, to: MatchStatus },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Config parse error: {0}")]
    ConfigParse(String),
}

/// Result type for reconciliation operations
pub type ReconResult<T> = Result<T, ReconError>;
