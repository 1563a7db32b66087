use crate::error::{LearnerError, Result};
use crate::learner::Learner;
use crate::registry::{LearnerId, LearnerStore};
use async_trait::async_trait;
use sled::Db;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Key of the allocation counter in the meta tree. The counter holds
/// the next unissued id, equivalent to one past the maximum ever
/// issued.
const NEXT_ID_KEY: &[u8] = b"next_id";

/// Persistent learner store using the Sled embedded database
///
/// Learner records live in the `learners` tree under big-endian u64
/// keys (sled's key order is then numeric order); the id-allocation
/// ledger is a single counter in the `meta` tree updated with a
/// compare-and-swap loop.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    learners_tree: sled::Tree,
    meta_tree: sled::Tree,
}

impl SledStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)
            .map_err(|e| LearnerError::Storage(format!("Failed to open Sled database: {}", e)))?;

        let learners_tree = db
            .open_tree("learners")
            .map_err(|e| LearnerError::Storage(format!("Failed to open learners tree: {}", e)))?;

        let meta_tree = db
            .open_tree("meta")
            .map_err(|e| LearnerError::Storage(format!("Failed to open meta tree: {}", e)))?;

        tracing::info!("Initialized Sled store at {:?}", path_ref);

        Ok(Self {
            db: Arc::new(db),
            learners_tree,
            meta_tree,
        })
    }

    fn learner_key(id: LearnerId) -> [u8; 8] {
        id.to_be_bytes()
    }

    fn decode_counter(bytes: &[u8]) -> u64 {
        bytes.try_into().map(u64::from_be_bytes).unwrap_or(0)
    }

    fn serialize_learner(learner: &Learner) -> Result<Vec<u8>> {
        bincode::serialize(learner)
            .map_err(|e| LearnerError::Serialization(format!("Failed to serialize learner: {}", e)))
    }

    fn deserialize_learner(bytes: &[u8]) -> Result<Learner> {
        bincode::deserialize(bytes).map_err(|e| {
            LearnerError::Serialization(format!("Failed to deserialize learner: {}", e))
        })
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| LearnerError::Storage(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl LearnerStore for SledStore {
    async fn allocate_id(&self) -> Result<LearnerId> {
        // update_and_fetch retries the closure under contention, so
        // concurrent allocations each see a distinct counter value.
        let counter = self
            .meta_tree
            .update_and_fetch(NEXT_ID_KEY, |old| {
                let next = old.map(Self::decode_counter).unwrap_or(0);
                Some(next.saturating_add(1).to_be_bytes().to_vec())
            })
            .map_err(|e| LearnerError::Storage(format!("Failed to allocate id: {}", e)))?
            .ok_or_else(|| {
                LearnerError::Storage("Allocation counter missing after update".to_string())
            })?;

        // Durably record issuance before handing the id back.
        self.meta_tree
            .flush()
            .map_err(|e| LearnerError::Storage(format!("Failed to flush meta tree: {}", e)))?;

        let id = Self::decode_counter(&counter) - 1;
        tracing::debug!(learner_id = id, "Id allocated");
        Ok(id)
    }

    async fn save(&self, id: LearnerId, learner: &Learner) -> Result<()> {
        let value = Self::serialize_learner(learner)?;

        self.learners_tree
            .insert(Self::learner_key(id), value)
            .map_err(|e| LearnerError::Storage(format!("Failed to save learner: {}", e)))?;

        // Flush to ensure durability
        self.learners_tree
            .flush()
            .map_err(|e| LearnerError::Storage(format!("Failed to flush learners tree: {}", e)))?;

        tracing::debug!(learner_id = id, "Learner saved to Sled");
        Ok(())
    }

    async fn load(&self, id: LearnerId) -> Result<Learner> {
        match self.learners_tree.get(Self::learner_key(id)) {
            Ok(Some(bytes)) => Self::deserialize_learner(&bytes),
            Ok(None) => Err(LearnerError::NotFound(format!("Learner {} not found", id))),
            Err(e) => Err(LearnerError::Storage(format!("Failed to get learner: {}", e))),
        }
    }

    async fn list_ids(&self) -> Result<Vec<LearnerId>> {
        let mut ids = Vec::new();
        for result in self.learners_tree.iter() {
            let (key, _) = result
                .map_err(|e| LearnerError::Storage(format!("Failed to iterate learners: {}", e)))?;
            ids.push(Self::decode_counter(&key));
        }
        Ok(ids)
    }

    async fn all(&self) -> Result<BTreeMap<LearnerId, Learner>> {
        let mut learners = BTreeMap::new();
        for result in self.learners_tree.iter() {
            let (key, value) = result
                .map_err(|e| LearnerError::Storage(format!("Failed to iterate learners: {}", e)))?;
            learners.insert(Self::decode_counter(&key), Self::deserialize_learner(&value)?);
        }
        Ok(learners)
    }
}
