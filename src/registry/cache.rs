use crate::error::Result;
use crate::learner::Learner;
use crate::registry::{LearnerId, LearnerStore};
use async_trait::async_trait;
use moka::future::Cache;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Write-through read cache over any learner store, using Moka.
///
/// `save` hits the backing store first and only then the cache, so a
/// cached entry always reflects durable state and a write is visible to
/// an immediately following read from any caller. Allocation and
/// listing always go to the backing store.
#[derive(Clone)]
pub struct CachedStore {
    inner: Arc<dyn LearnerStore>,
    cache: Cache<LearnerId, Learner>,
}

impl CachedStore {
    pub fn new(inner: Arc<dyn LearnerStore>, max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl LearnerStore for CachedStore {
    async fn allocate_id(&self) -> Result<LearnerId> {
        self.inner.allocate_id().await
    }

    async fn save(&self, id: LearnerId, learner: &Learner) -> Result<()> {
        self.inner.save(id, learner).await?;
        self.cache.insert(id, learner.clone()).await;
        Ok(())
    }

    async fn load(&self, id: LearnerId) -> Result<Learner> {
        if let Some(learner) = self.cache.get(&id).await {
            tracing::debug!(learner_id = id, "Cache hit");
            return Ok(learner);
        }

        let learner = self.inner.load(id).await?;
        self.cache.insert(id, learner.clone()).await;
        Ok(learner)
    }

    async fn list_ids(&self) -> Result<Vec<LearnerId>> {
        self.inner.list_ids().await
    }

    async fn all(&self) -> Result<BTreeMap<LearnerId, Learner>> {
        self.inner.all().await
    }
}
