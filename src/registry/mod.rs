pub mod cache;
pub mod factory;
pub mod sled_store;
pub mod store;

pub use cache::CachedStore;
pub use factory::{create_in_memory_store, create_store};
pub use sled_store::SledStore;
pub use store::InMemoryStore;

use crate::error::Result;
use crate::learner::Learner;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Learner identifier: successive non-negative integers, never reused.
pub type LearnerId = u64;

/// Trait for learner storage operations
#[async_trait]
pub trait LearnerStore: Send + Sync {
    /// Allocate the next learner id: one past the maximum ever issued,
    /// starting at 0. Atomic with respect to concurrent allocations,
    /// and durably recorded as issued before being handed back.
    async fn allocate_id(&self) -> Result<LearnerId>;

    /// Save a learner under an id
    async fn save(&self, id: LearnerId, learner: &Learner) -> Result<()>;

    /// Load the learner stored under an id
    async fn load(&self, id: LearnerId) -> Result<Learner>;

    /// List stored learner ids, ascending
    async fn list_ids(&self) -> Result<Vec<LearnerId>>;

    /// Everything stored, keyed by id
    async fn all(&self) -> Result<BTreeMap<LearnerId, Learner>>;
}
