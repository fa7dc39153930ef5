//! In-memory match storage for testing

use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

/// In-memory match repository for testing and development.
///
/// Matches are kept in insertion order. Clones share the same underlying
/// storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryMatchStore {
    matches: Arc<RwLock<Vec<ReconciliationMatch>>>,
}

impl MemoryMatchStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored matches; fails if the lock was poisoned
    pub fn len(&self) -> ReconResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> ReconResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> ReconResult<()> {
        self.write()?.clear();
        Ok(())
    }

    fn read(&self) -> ReconResult<RwLockReadGuard<'_, Vec<ReconciliationMatch>>> {
        self.matches
            .read()
            .map_err(|_| ReconError::Storage("match store lock poisoned".to_string()))
    }

    fn write(&self) -> ReconResult<RwLockWriteGuard<'_, Vec<ReconciliationMatch>>> {
        self.matches
            .write()
            .map_err(|_| ReconError::Storage("match store lock poisoned".to_string()))
    }
}

#[async_trait]
impl MatchRepository for MemoryMatchStore {
    async fn save_match(&mut self, reconciliation_match: &ReconciliationMatch) -> ReconResult<()> {
        let mut matches = self.write()?;
        if matches.iter().any(|m| m.id == reconciliation_match.id) {
            return Err(ReconError::Storage(format!(
                "match '{}' already exists",
                reconciliation_match.id
            )));
        }
        matches.push(reconciliation_match.clone());
        Ok(())
    }

    async fn get_match(&self, match_id: &str) -> ReconResult<Option<ReconciliationMatch>> {
        Ok(self.read()?.iter().find(|m| m.id == match_id).cloned())
    }

    async fn list_matches(
        &self,
        status: Option<MatchStatus>,
    ) -> ReconResult<Vec<ReconciliationMatch>> {
        let matches = self.read()?;
        let filtered: Vec<ReconciliationMatch> = matches
            .iter()
            .filter(|m| status.is_none_or(|s| m.status == s))
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn update_match(
        &mut self,
        reconciliation_match: &ReconciliationMatch,
    ) -> ReconResult<()> {
        let mut matches = self.write()?;
        match matches.iter_mut().find(|m| m.id == reconciliation_match.id) {
            Some(stored) => {
                *stored = reconciliation_match.clone();
                Ok(())
            }
            None => Err(ReconError::MatchNotFound(reconciliation_match.id.clone())),
        }
    }

    async fn delete_match(&mut self, match_id: &str) -> ReconResult<()> {
        let mut matches = self.write()?;
        let before = matches.len();
        matches.retain(|m| m.id != match_id);
        if matches.len() == before {
            Err(ReconError::MatchNotFound(match_id.to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn sample(id: &str, status: MatchStatus) -> ReconciliationMatch {
        ReconciliationMatch {
            id: id.to_string(),
            internal_ids: vec![format!("{id}-ledger")],
            external_ids: vec![format!("{id}-bank")],
            total_amount: BigDecimal::from(10),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            difference: BigDecimal::from(0),
            status,
            rule: MatchRule::Exact,
            rule_info: MatchRule::Exact.describe(3),
            confidence: 100,
        }
    }

    #[tokio::test]
    async fn test_save_get_and_filter() {
        let mut store = MemoryMatchStore::new();
        store.save_match(&sample("m1", MatchStatus::MatchedAuto)).await.unwrap();
        store.save_match(&sample("m2", MatchStatus::Suggested)).await.unwrap();

        assert_eq!(store.len().unwrap(), 2);
        assert!(store.get_match("m1").await.unwrap().is_some());
        assert!(store.get_match("nope").await.unwrap().is_none());

        let suggested = store.list_matches(Some(MatchStatus::Suggested)).await.unwrap();
        assert_eq!(suggested.len(), 1);
        assert_eq!(suggested[0].id, "m2");

        let all = store.list_matches(None).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let mut store = MemoryMatchStore::new();
        store.save_match(&sample("m1", MatchStatus::MatchedAuto)).await.unwrap();

        let result = store.save_match(&sample("m1", MatchStatus::Pending)).await;
        assert!(matches!(result, Err(ReconError::Storage(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let mut store = MemoryMatchStore::new();
        let mut m = sample("m1", MatchStatus::MatchedAuto);
        store.save_match(&m).await.unwrap();

        m.status = MatchStatus::Locked;
        store.update_match(&m).await.unwrap();
        assert_eq!(
            store.get_match("m1").await.unwrap().unwrap().status,
            MatchStatus::Locked
        );

        store.delete_match("m1").await.unwrap();
        assert!(store.is_empty().unwrap());
        assert!(matches!(
            store.delete_match("m1").await,
            Err(ReconError::MatchNotFound(_))
        ));
        assert!(matches!(
            store.update_match(&m).await,
            Err(ReconError::MatchNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let mut store = MemoryMatchStore::new();
        let view = store.clone();
        store.save_match(&sample("m1", MatchStatus::MatchedAuto)).await.unwrap();

        assert_eq!(view.len().unwrap(), 1);
        view.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_poisoned_lock_is_a_storage_error() {
        let store = MemoryMatchStore::new();
        let shared = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.matches.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(store.len(), Err(ReconError::Storage(_))));
        assert!(matches!(store.is_empty(), Err(ReconError::Storage(_))));
    }
}
