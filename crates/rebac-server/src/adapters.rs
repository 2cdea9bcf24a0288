//! Adapter implementing the domain's tuple seam over a `TupleStore`.
//!
//! The domain resolver reads tuples through the [`TupleReader`] trait; the
//! storage layer exposes [`TupleStore`]. This adapter binds a store and a
//! store id and bridges the two, mapping storage failures into the domain
//! error taxonomy.

use std::sync::Arc;

use async_trait::async_trait;

use rebac_domain::error::{DomainError, DomainResult};
use rebac_domain::model::{ObjectRef, Subject};
use rebac_domain::resolver::TupleReader;
use rebac_storage::{StorageError, TupleFilter, TupleStore};

/// `TupleReader` over a `TupleStore`, scoped to one store.
pub struct StoreTupleReader<S: TupleStore> {
    store: Arc<S>,
    store_id: String,
}

impl<S: TupleStore> StoreTupleReader<S> {
    /// Creates a new adapter bound to the given store.
    pub fn new(store: Arc<S>, store_id: impl Into<String>) -> Self {
        Self {
            store,
            store_id: store_id.into(),
        }
    }
}

#[async_trait]
impl<S: TupleStore> TupleReader for StoreTupleReader<S> {
    async fn subjects_for(
        &self,
        object: &ObjectRef,
        relation: &str,
    ) -> DomainResult<Vec<Subject>> {
        let filter = TupleFilter::for_object_relation(object, relation);
        let tuples = self
            .store
            .read(&self.store_id, &filter)
            .await
            .map_err(storage_to_domain)?;

        Ok(tuples.into_iter().map(|t| t.subject).collect())
    }
}

/// Maps storage failures into the domain taxonomy. Anything that stops a
/// read mid-check (missing store included) is the transient class, so the
/// access layer fails closed on it.
pub(crate) fn storage_to_domain(error: StorageError) -> DomainError {
    match error {
        StorageError::Unavailable { message } => DomainError::StoreUnavailable { message },
        StorageError::InvalidTuple { message } => DomainError::InvalidTuple { message },
        other => DomainError::StoreUnavailable {
            message: other.to_string(),
        },
    }
}
