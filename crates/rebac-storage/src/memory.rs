//! In-memory tuple store.
//!
//! Tuples live in a `HashSet<RelationshipTuple>` per store, so adds and
//! removes are O(1) and idempotency falls out of set semantics. `DashMap`
//! provides thread-safe access without a global lock; a write batch
//! mutates the store's set while holding its map entry, so concurrent
//! readers observe the set before or after the batch, never in between.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::instrument;

use rebac_domain::model::{AuthorizationModel, RelationshipTuple};

use crate::error::{StorageError, StorageResult};
use crate::traits::{validate_store_id, validate_tuple, StoreInfo, TupleFilter, TupleStore};

/// In-memory implementation of [`TupleStore`].
///
/// # Performance Characteristics
///
/// - **Add/remove tuple**: O(1) average (HashSet insert/remove)
/// - **Filtered read**: O(N) over the store's tuples (linear scan)
/// - **Store/model operations**: O(1) (DashMap lookup)
#[derive(Debug, Default)]
pub struct MemoryTupleStore {
    stores: DashMap<String, StoreInfo>,
    /// Tuples per store. HashSet gives constant-time membership tests and
    /// makes duplicate adds collapse to the existing row.
    tuples: DashMap<String, HashSet<RelationshipTuple>>,
    /// Installed authorization model per store, write-once.
    models: DashMap<String, AuthorizationModel>,
}

impl MemoryTupleStore {
    /// Creates a new in-memory tuple store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory tuple store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn ensure_store(&self, store_id: &str) -> StorageResult<()> {
        if !self.stores.contains_key(store_id) {
            return Err(StorageError::StoreNotFound {
                store_id: store_id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TupleStore for MemoryTupleStore {
    async fn create_store(&self, id: &str, name: &str) -> StorageResult<StoreInfo> {
        validate_store_id(id)?;

        let store = StoreInfo {
            id: id.to_string(),
            name: name.to_string(),
            created_at: chrono::Utc::now(),
        };

        // Entry API keeps check-and-insert atomic under concurrent callers.
        use dashmap::mapref::entry::Entry;
        match self.stores.entry(id.to_string()) {
            Entry::Occupied(_) => {
                return Err(StorageError::StoreAlreadyExists {
                    store_id: id.to_string(),
                });
            }
            Entry::Vacant(entry) => {
                entry.insert(store.clone());
            }
        }

        self.tuples.entry(id.to_string()).or_default();

        Ok(store)
    }

    async fn get_store(&self, id: &str) -> StorageResult<StoreInfo> {
        self.stores
            .get(id)
            .map(|s| s.value().clone())
            .ok_or_else(|| StorageError::StoreNotFound {
                store_id: id.to_string(),
            })
    }

    async fn delete_store(&self, id: &str) -> StorageResult<()> {
        if self.stores.remove(id).is_none() {
            return Err(StorageError::StoreNotFound {
                store_id: id.to_string(),
            });
        }
        self.tuples.remove(id);
        self.models.remove(id);
        Ok(())
    }

    async fn install_model(
        &self,
        store_id: &str,
        model: AuthorizationModel,
    ) -> StorageResult<AuthorizationModel> {
        self.ensure_store(store_id)?;

        use dashmap::mapref::entry::Entry;
        match self.models.entry(store_id.to_string()) {
            // Write-once: a repeated install keeps the installed model.
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                entry.insert(model.clone());
                Ok(model)
            }
        }
    }

    async fn get_model(&self, store_id: &str) -> StorageResult<AuthorizationModel> {
        self.ensure_store(store_id)?;
        self.models
            .get(store_id)
            .map(|m| m.value().clone())
            .ok_or_else(|| StorageError::ModelNotFound {
                store_id: store_id.to_string(),
            })
    }

    #[instrument(skip(self, adds, removes), fields(
        store_id = %store_id,
        adds = adds.len(),
        removes = removes.len(),
    ))]
    async fn write(
        &self,
        store_id: &str,
        adds: Vec<RelationshipTuple>,
        removes: Vec<RelationshipTuple>,
    ) -> StorageResult<()> {
        // Validate the whole batch before touching the set, so a bad
        // tuple leaves the store untouched (all-or-nothing).
        for tuple in adds.iter().chain(removes.iter()) {
            validate_tuple(tuple)?;
        }
        self.ensure_store(store_id)?;

        let mut tuples = self.tuples.entry(store_id.to_string()).or_default();

        for tuple in removes {
            tuples.remove(&tuple);
        }
        for tuple in adds {
            tuples.insert(tuple);
        }

        Ok(())
    }

    async fn contains(&self, store_id: &str, tuple: &RelationshipTuple) -> StorageResult<bool> {
        self.ensure_store(store_id)?;
        Ok(self
            .tuples
            .get(store_id)
            .map(|set| set.contains(tuple))
            .unwrap_or(false))
    }

    async fn read(
        &self,
        store_id: &str,
        filter: &TupleFilter,
    ) -> StorageResult<Vec<RelationshipTuple>> {
        self.ensure_store(store_id)?;

        Ok(self
            .tuples
            .get(store_id)
            .map(|set| set.iter().filter(|t| filter.matches(t)).cloned().collect())
            .unwrap_or_default())
    }
}
