//! Review workflow around an injected match repository
//!
//! The engine and the scorer are pure; this is where their output meets
//! storage and human decisions.

use bigdecimal::BigDecimal;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::reconciliation::scoring::ReconciliationCandidate;
use crate::reconciliation::similarity::amount_gap;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_match;

/// Stores, confirms, rejects and locks matches through a [`MatchRepository`]
pub struct MatchWorkflow<S: MatchRepository> {
    storage: S,
}

impl<S: MatchRepository> MatchWorkflow<S> {
    /// Create a new workflow with the given storage backend
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Persist every match of an automatic run; returns how many were stored.
    ///
    /// The whole run is checked before anything is written, so a conflict
    /// leaves the repository untouched.
    pub async fn record_result(&mut self, result: &ReconciliationResult) -> ReconResult<usize> {
        self.ensure_claimable(&result.matches).await?;
        for reconciliation_match in &result.matches {
            self.storage.save_match(reconciliation_match).await?;
        }
        info!(stored = result.matches.len(), "recorded reconciliation result");
        Ok(result.matches.len())
    }

    /// Store a scored candidate as a suggestion for `external`
    pub async fn suggest(
        &mut self,
        external: &Transaction,
        candidate: &ReconciliationCandidate,
    ) -> ReconResult<ReconciliationMatch> {
        let total_amount = external.signed_amount();
        let reconciliation_match = ReconciliationMatch {
            id: Uuid::new_v4().to_string(),
            internal_ids: vec![candidate.transaction.id.clone()],
            external_ids: vec![external.id.clone()],
            difference: amount_gap(&total_amount, &candidate.transaction.signed_amount()),
            total_amount,
            date: external.date,
            status: MatchStatus::Suggested,
            rule: MatchRule::Manual,
            rule_info: format!("Suggested: {}", candidate.reason()),
            confidence: candidate.score.min(100),
        };

        self.store(&reconciliation_match).await?;
        Ok(reconciliation_match)
    }

    /// Build and store a match chosen by hand
    pub async fn create_manual_match(
        &mut self,
        internal: &[Transaction],
        external: &[Transaction],
    ) -> ReconResult<ReconciliationMatch> {
        let Some(first_external) = external.first() else {
            return Err(ReconError::Validation(
                "A manual match needs at least one external transaction".to_string(),
            ));
        };

        let internal_total: BigDecimal = internal.iter().map(Transaction::signed_amount).sum();
        let external_total: BigDecimal = external.iter().map(Transaction::signed_amount).sum();

        let reconciliation_match = ReconciliationMatch {
            id: Uuid::new_v4().to_string(),
            internal_ids: internal.iter().map(|t| t.id.clone()).collect(),
            external_ids: external.iter().map(|t| t.id.clone()).collect(),
            difference: amount_gap(&internal_total, &external_total),
            total_amount: external_total,
            date: first_external.date,
            status: MatchStatus::MatchedManual,
            rule: MatchRule::Manual,
            rule_info: MatchRule::Manual.describe(0),
            confidence: 100,
        };

        self.store(&reconciliation_match).await?;
        Ok(reconciliation_match)
    }

    /// Accept a match
    pub async fn confirm(&mut self, match_id: &str) -> ReconResult<ReconciliationMatch> {
        self.transition(match_id, MatchStatus::MatchedManual).await
    }

    /// Freeze a match against further changes
    pub async fn lock(&mut self, match_id: &str) -> ReconResult<ReconciliationMatch> {
        self.transition(match_id, MatchStatus::Locked).await
    }

    /// Send a match back for review
    pub async fn reopen(&mut self, match_id: &str) -> ReconResult<ReconciliationMatch> {
        self.transition(match_id, MatchStatus::Pending).await
    }

    /// Discard a match, releasing its transactions
    pub async fn reject(&mut self, match_id: &str) -> ReconResult<()> {
        let existing = self.get_match_required(match_id).await?;
        if existing.status == MatchStatus::Locked {
            return Err(ReconError::MatchLocked(match_id.to_string()));
        }
        self.storage.delete_match(match_id).await?;
        debug!(match_id, "rejected match");
        Ok(())
    }

    /// Get a match by ID
    pub async fn get_match(&self, match_id: &str) -> ReconResult<Option<ReconciliationMatch>> {
        self.storage.get_match(match_id).await
    }

    /// Get a match by ID, returning an error if not found
    pub async fn get_match_required(&self, match_id: &str) -> ReconResult<ReconciliationMatch> {
        self.storage
            .get_match(match_id)
            .await?
            .ok_or_else(|| ReconError::MatchNotFound(match_id.to_string()))
    }

    /// List stored matches, optionally by status
    pub async fn list_matches(
        &self,
        status: Option<MatchStatus>,
    ) -> ReconResult<Vec<ReconciliationMatch>> {
        self.storage.list_matches(status).await
    }

    async fn transition(
        &mut self,
        match_id: &str,
        to: MatchStatus,
    ) -> ReconResult<ReconciliationMatch> {
        let mut reconciliation_match = self.get_match_required(match_id).await?;
        let from = reconciliation_match.status;

        if from == MatchStatus::Locked {
            return Err(ReconError::MatchLocked(match_id.to_string()));
        }
        if !transition_allowed(from, to) {
            return Err(ReconError::InvalidStatusTransition { from, to });
        }

        reconciliation_match.status = to;
        self.storage.update_match(&reconciliation_match).await?;
        debug!(match_id, %from, %to, "match status changed");
        Ok(reconciliation_match)
    }

    async fn store(&mut self, reconciliation_match: &ReconciliationMatch) -> ReconResult<()> {
        self.ensure_claimable(std::slice::from_ref(reconciliation_match))
            .await?;
        self.storage.save_match(reconciliation_match).await
    }

    /// Validate a batch, refusing transactions claimed by a stored match or
    /// by an earlier match of the same batch
    async fn ensure_claimable(&self, batch: &[ReconciliationMatch]) -> ReconResult<()> {
        for reconciliation_match in batch {
            validate_match(reconciliation_match)?;
        }

        let stored = self.storage.list_matches(None).await?;
        let mut claimed: HashMap<&str, &str> = HashMap::new();
        for owner in &stored {
            for id in owner.transaction_ids() {
                claimed.insert(id, &owner.id);
            }
        }

        for reconciliation_match in batch {
            for id in reconciliation_match.transaction_ids() {
                if let Some(owner) = claimed.insert(id, &reconciliation_match.id) {
                    return Err(ReconError::Validation(format!(
                        "Transaction '{}' is already claimed by match '{}'",
                        id, owner
                    )));
                }
            }
        }
        Ok(())
    }
}

fn transition_allowed(from: MatchStatus, to: MatchStatus) -> bool {
    use MatchStatus::*;

    match to {
        MatchedManual => matches!(from, MatchedAuto | Suggested | Pending),
        Locked => from != Locked,
        Pending => matches!(from, MatchedAuto | MatchedManual | Suggested),
        MatchedAuto | Suggested => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::engine::ReconciliationEngine;
    use crate::utils::MemoryMatchStore;
    use chrono::NaiveDate;

    fn income(id: &str, day: u32, amount: i64) -> Transaction {
        Transaction::income(
            id.to_string(),
            NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            format!("Deposit {id}"),
            BigDecimal::from(amount),
        )
    }

    #[tokio::test]
    async fn test_conflicting_run_leaves_store_untouched() {
        let store = MemoryMatchStore::new();
        let mut workflow = MatchWorkflow::new(store.clone());

        let internal = vec![income("i1", 4, 100), income("i2", 5, 200)];
        let external = vec![income("e1", 4, 100), income("e2", 5, 200)];

        let manual = workflow
            .create_manual_match(&internal[1..], &external[1..])
            .await
            .unwrap();

        // Built before the manual match existed, so its second match collides
        let result = ReconciliationEngine::new().reconcile(&internal, &external);
        assert_eq!(result.matches.len(), 2);

        let recorded = workflow.record_result(&result).await;

        assert!(matches!(recorded, Err(ReconError::Validation(_))));
        let stored = store.list_matches(None).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, manual.id);
        assert!(!stored.iter().any(|m| m.involves("i1")));
    }

    #[tokio::test]
    async fn test_run_claiming_a_transaction_twice_is_refused() {
        let store = MemoryMatchStore::new();
        let mut workflow = MatchWorkflow::new(store.clone());

        let internal = vec![income("i1", 4, 100)];
        let external = vec![income("e1", 4, 100)];
        let mut result = ReconciliationEngine::new().reconcile(&internal, &external);
        let mut copy = result.matches[0].clone();
        copy.id = "duplicate-claim".to_string();
        result.matches.push(copy);

        let recorded = workflow.record_result(&result).await;

        assert!(matches!(recorded, Err(ReconError::Validation(_))));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_transition_table() {
        use MatchStatus::*;

        assert!(transition_allowed(MatchedAuto, MatchedManual));
        assert!(transition_allowed(Suggested, MatchedManual));
        assert!(transition_allowed(Pending, MatchedManual));
        assert!(!transition_allowed(MatchedManual, MatchedManual));

        assert!(transition_allowed(Suggested, Locked));
        assert!(!transition_allowed(Locked, Locked));

        assert!(transition_allowed(MatchedManual, Pending));
        assert!(!transition_allowed(Pending, Pending));

        assert!(!transition_allowed(MatchedManual, MatchedAuto));
        assert!(!transition_allowed(Pending, Suggested));
    }
}
