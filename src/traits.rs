//! Traits for storage abstraction and input validation

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::collections::HashSet;

use crate::types::*;

/// Storage abstraction for confirmed and suggested matches
///
/// The reconciliation engine never persists anything itself. Callers that
/// want to keep matches around (a database, a file, an in-memory map for
/// tests) implement this trait and hand it to [`crate::MatchWorkflow`].
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Save a new match
    async fn save_match(&mut self, reconciliation_match: &ReconciliationMatch) -> ReconResult<()>;

    /// Get a match by ID
    async fn get_match(&self, match_id: &str) -> ReconResult<Option<ReconciliationMatch>>;

    /// List all matches, optionally filtered by status
    async fn list_matches(&self, status: Option<MatchStatus>)
        -> ReconResult<Vec<ReconciliationMatch>>;

    /// Replace an existing match
    async fn update_match(&mut self, reconciliation_match: &ReconciliationMatch)
        -> ReconResult<()>;

    /// Remove a match, releasing its transactions
    async fn delete_match(&mut self, match_id: &str) -> ReconResult<()>;
}

/// Trait for checking transaction collections before reconciliation
pub trait InputValidator: Send + Sync {
    /// Validate a single transaction
    fn validate_transaction(&self, transaction: &Transaction) -> ReconResult<()>;

    /// Validate a whole collection; the default checks every transaction and
    /// rejects repeated ids
    fn validate_collection(&self, side: Side, transactions: &[Transaction]) -> ReconResult<()> {
        let mut seen = HashSet::new();
        for transaction in transactions {
            self.validate_transaction(transaction)?;
            if !seen.insert(transaction.id.as_str()) {
                return Err(ReconError::DuplicateTransaction {
                    side,
                    id: transaction.id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Default input validator with basic rules
pub struct DefaultInputValidator;

impl InputValidator for DefaultInputValidator {
    fn validate_transaction(&self, transaction: &Transaction) -> ReconResult<()> {
        if transaction.id.trim().is_empty() {
            return Err(ReconError::Validation(
                "Transaction ID cannot be empty".to_string(),
            ));
        }

        if transaction.amount < BigDecimal::from(0) {
            return Err(ReconError::Validation(format!(
                "Transaction '{}' has a negative amount; use the kind for direction",
                transaction.id
            )));
        }

        Ok(())
    }
}
