use crate::error::{LearnerError, Result};
use crate::learner::Learner;
use crate::registry::{LearnerId, LearnerStore};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// In-memory learner store (for MVP and testing)
///
/// The issued-id ledger lives behind a mutex so allocation is a single
/// read-modify-write critical section; two concurrent allocations can
/// never observe the same maximum.
#[derive(Clone)]
pub struct InMemoryStore {
    learners: Arc<DashMap<LearnerId, Learner>>,
    issued_ids: Arc<Mutex<BTreeSet<LearnerId>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            learners: Arc::new(DashMap::new()),
            issued_ids: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LearnerStore for InMemoryStore {
    async fn allocate_id(&self) -> Result<LearnerId> {
        let mut issued = self.issued_ids.lock();
        let id = match issued.iter().next_back() {
            Some(max) => max + 1,
            None => 0,
        };
        issued.insert(id);
        tracing::debug!(learner_id = id, "Id allocated");
        Ok(id)
    }

    async fn save(&self, id: LearnerId, learner: &Learner) -> Result<()> {
        self.learners.insert(id, learner.clone());
        tracing::debug!(learner_id = id, "Learner saved");
        Ok(())
    }

    async fn load(&self, id: LearnerId) -> Result<Learner> {
        self.learners
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or_else(|| LearnerError::NotFound(format!("Learner {} not found", id)))
    }

    async fn list_ids(&self) -> Result<Vec<LearnerId>> {
        let mut ids: Vec<LearnerId> = self.learners.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn all(&self) -> Result<BTreeMap<LearnerId, Learner>> {
        Ok(self
            .learners
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;

    fn test_learner() -> Learner {
        let observation = Observation::new(
            Some("a".to_string()),
            [("x".to_string(), 1.0)].into_iter().collect(),
        )
        .unwrap();
        Learner::new().with_observations(vec![observation])
    }

    #[tokio::test]
    async fn test_allocate_starts_at_zero_and_increments() {
        let store = InMemoryStore::new();
        assert_eq!(store.allocate_id().await.unwrap(), 0);
        assert_eq!(store.allocate_id().await.unwrap(), 1);
        assert_eq!(store.allocate_id().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_allocate_follows_seeded_maximum() {
        let store = InMemoryStore::new();
        store.issued_ids.lock().insert(2);

        // One past the maximum ever issued, independent of gaps.
        assert_eq!(store.allocate_id().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_record_removal() {
        let store = InMemoryStore::new();
        let id = store.allocate_id().await.unwrap();
        store.save(id, &test_learner()).await.unwrap();

        // Removing the record does not return the id to the pool.
        store.learners.remove(&id);
        assert_eq!(store.allocate_id().await.unwrap(), id + 1);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = InMemoryStore::new();
        let learner = test_learner();

        store.save(0, &learner).await.unwrap();
        let loaded = store.load(0).await.unwrap();
        assert_eq!(loaded.observations(), learner.observations());
    }

    #[tokio::test]
    async fn test_load_unknown_id() {
        let store = InMemoryStore::new();
        let err = store.load(99).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_ids_ascending() {
        let store = InMemoryStore::new();
        for id in [5, 1, 3] {
            store.save(id, &test_learner()).await.unwrap();
        }
        assert_eq!(store.list_ids().await.unwrap(), vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn test_all() {
        let store = InMemoryStore::new();
        store.save(0, &test_learner()).await.unwrap();
        store.save(1, &test_learner()).await.unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains_key(&0));
        assert!(all.contains_key(&1));
    }
}
