//! Relationship manager: schema-validated, atomic, idempotent writes.
//!
//! Entity lifecycle operations call this manager after their own mutation
//! commits, so the tuple graph tracks entity existence. Every batch is
//! validated against the schema registry before it reaches the store; one
//! bad tuple fails the whole batch with nothing applied.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::instrument;

use rebac_domain::error::DomainError;
use rebac_domain::model::{ObjectRef, RelationshipTuple, SchemaRegistry, Subject};
use rebac_storage::{StorageError, TupleFilter, TupleStore};

use crate::schema::{
    ADMIN_RELATION, MODERATOR_RELATION, ORGANIZATION_RELATION, ORGANIZATION_TYPE, SPACE_TYPE,
};

/// Errors surfaced by relationship-manager operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// A tuple in the batch violates the schema. Permanent; the whole
    /// batch was rejected and nothing was applied.
    #[error("invalid tuple: {0}")]
    InvalidTuple(#[source] DomainError),

    /// The store rejected or could not complete the batch.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Orchestrates tuple writes on behalf of entity lifecycle operations.
pub struct RelationshipManager<S: TupleStore> {
    store: Arc<S>,
    registry: Arc<SchemaRegistry>,
    store_id: String,
    write_timeout: Duration,
}

impl<S: TupleStore> RelationshipManager<S> {
    /// Creates a manager bound to one store.
    pub fn new(store: Arc<S>, registry: Arc<SchemaRegistry>, store_id: impl Into<String>) -> Self {
        Self {
            store,
            registry,
            store_id: store_id.into(),
            write_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the deadline applied to each store call.
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// The store id this manager writes to.
    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// The schema registry batches are validated against.
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Applies one atomic batch of adds and removes.
    ///
    /// Re-adding present tuples and removing absent ones succeed without
    /// effect; a schema-invalid tuple anywhere in the batch rejects the
    /// whole batch before the store is touched.
    #[instrument(skip_all, fields(
        store_id = %self.store_id,
        adds = adds.len(),
        removes = removes.len(),
    ))]
    pub async fn apply_batch(
        &self,
        adds: Vec<RelationshipTuple>,
        removes: Vec<RelationshipTuple>,
    ) -> Result<(), ManagerError> {
        for tuple in adds.iter().chain(removes.iter()) {
            self.registry
                .validate_tuple(tuple)
                .map_err(ManagerError::InvalidTuple)?;
        }

        let write = self.store.write(&self.store_id, adds, removes);
        match timeout(self.write_timeout, write).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ManagerError::Storage(StorageError::Unavailable {
                message: format!("write deadline of {:?} elapsed", self.write_timeout),
            })),
        }
    }

    /// Seeds the root organization admin. Idempotent: succeeds whether or
    /// not the tuple already exists.
    pub async fn initialize_root_admin(
        &self,
        org_id: &str,
        admin: Subject,
    ) -> Result<(), ManagerError> {
        let tuple = RelationshipTuple::new(
            admin,
            ADMIN_RELATION,
            ObjectRef::new(ORGANIZATION_TYPE, org_id),
        );
        self.apply_batch(vec![tuple], Vec::new()).await
    }

    /// Space created: one batch writing the initial moderator and the
    /// organization link.
    #[instrument(skip(self, moderator), fields(space_id = %space_id, org_id = %org_id))]
    pub async fn space_created(
        &self,
        space_id: &str,
        moderator: Subject,
        org_id: &str,
    ) -> Result<(), ManagerError> {
        let space = ObjectRef::new(SPACE_TYPE, space_id);
        let adds = vec![
            RelationshipTuple::new(moderator, MODERATOR_RELATION, space.clone()),
            RelationshipTuple::new(
                Subject::Object(ObjectRef::new(ORGANIZATION_TYPE, org_id)),
                ORGANIZATION_RELATION,
                space,
            ),
        ];
        self.apply_batch(adds, Vec::new()).await
    }

    /// Moderator handover as a single batch, so no check can observe a
    /// space with zero or two moderators.
    #[instrument(skip(self, old_moderator, new_moderator), fields(space_id = %space_id))]
    pub async fn moderator_changed(
        &self,
        space_id: &str,
        old_moderator: Subject,
        new_moderator: Subject,
    ) -> Result<(), ManagerError> {
        let space = ObjectRef::new(SPACE_TYPE, space_id);
        self.apply_batch(
            vec![RelationshipTuple::new(
                new_moderator,
                MODERATOR_RELATION,
                space.clone(),
            )],
            vec![RelationshipTuple::new(
                old_moderator,
                MODERATOR_RELATION,
                space,
            )],
        )
        .await
    }

    /// Space deleted: removes every tuple whose object is the space.
    #[instrument(skip(self), fields(space_id = %space_id))]
    pub async fn space_deleted(&self, space_id: &str) -> Result<(), ManagerError> {
        let space = ObjectRef::new(SPACE_TYPE, space_id);
        let filter = TupleFilter::for_object(&space);

        let read = self.store.read(&self.store_id, &filter);
        let existing = match timeout(self.write_timeout, read).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ManagerError::Storage(StorageError::Unavailable {
                    message: format!("read deadline of {:?} elapsed", self.write_timeout),
                }))
            }
        };

        if existing.is_empty() {
            return Ok(());
        }
        self.apply_batch(Vec::new(), existing).await
    }

    /// Grants a role on an organization (e.g., membership).
    pub async fn org_role_granted(
        &self,
        org_id: &str,
        subject: Subject,
        relation: &str,
    ) -> Result<(), ManagerError> {
        let tuple = RelationshipTuple::new(
            subject,
            relation,
            ObjectRef::new(ORGANIZATION_TYPE, org_id),
        );
        self.apply_batch(vec![tuple], Vec::new()).await
    }

    /// Revokes a role on an organization. Removing an absent grant is a
    /// no-op success.
    pub async fn org_role_revoked(
        &self,
        org_id: &str,
        subject: Subject,
        relation: &str,
    ) -> Result<(), ManagerError> {
        let tuple = RelationshipTuple::new(
            subject,
            relation,
            ObjectRef::new(ORGANIZATION_TYPE, org_id),
        );
        self.apply_batch(Vec::new(), vec![tuple]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::default_model;
    use rebac_storage::MemoryTupleStore;

    async fn manager() -> (Arc<MemoryTupleStore>, RelationshipManager<MemoryTupleStore>) {
        let store = MemoryTupleStore::new_shared();
        store.create_store("default", "test").await.unwrap();
        let registry = Arc::new(SchemaRegistry::load(default_model()).unwrap());
        let manager = RelationshipManager::new(Arc::clone(&store), registry, "default");
        (store, manager)
    }

    #[tokio::test]
    async fn schema_invalid_tuple_rejects_the_whole_batch() {
        let (store, manager) = manager().await;

        let valid = RelationshipTuple::new(
            Subject::object("user", "carol"),
            MODERATOR_RELATION,
            ObjectRef::new(SPACE_TYPE, "eng"),
        );
        let invalid = RelationshipTuple::new(
            Subject::object("user", "carol"),
            "owner",
            ObjectRef::new(SPACE_TYPE, "eng"),
        );

        let result = manager.apply_batch(vec![valid, invalid], Vec::new()).await;
        assert!(matches!(result, Err(ManagerError::InvalidTuple(_))));

        let all = store.read("default", &TupleFilter::default()).await.unwrap();
        assert!(all.is_empty(), "no part of the rejected batch may apply");
    }

    #[tokio::test]
    async fn space_created_writes_moderator_and_link() {
        let (store, manager) = manager().await;

        manager
            .space_created("eng", Subject::object("user", "carol"), "default")
            .await
            .unwrap();

        let space = ObjectRef::new(SPACE_TYPE, "eng");
        let all = store
            .read("default", &TupleFilter::for_object(&space))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn moderator_change_swaps_in_one_batch() {
        let (store, manager) = manager().await;
        let space = ObjectRef::new(SPACE_TYPE, "eng");

        manager
            .space_created("eng", Subject::object("user", "carol"), "default")
            .await
            .unwrap();
        manager
            .moderator_changed(
                "eng",
                Subject::object("user", "carol"),
                Subject::object("user", "dave"),
            )
            .await
            .unwrap();

        let moderators = store
            .read(
                "default",
                &TupleFilter::for_object_relation(&space, MODERATOR_RELATION),
            )
            .await
            .unwrap();
        assert_eq!(
            moderators,
            vec![RelationshipTuple::new(
                Subject::object("user", "dave"),
                MODERATOR_RELATION,
                space,
            )]
        );
    }

    #[tokio::test]
    async fn space_deleted_removes_every_tuple_for_the_space() {
        let (store, manager) = manager().await;

        manager
            .space_created("eng", Subject::object("user", "carol"), "default")
            .await
            .unwrap();
        manager.space_deleted("eng").await.unwrap();

        let space = ObjectRef::new(SPACE_TYPE, "eng");
        let remaining = store
            .read("default", &TupleFilter::for_object(&space))
            .await
            .unwrap();
        assert!(remaining.is_empty());

        // Deleting an already-clean space stays a success.
        manager.space_deleted("eng").await.unwrap();
    }

    #[tokio::test]
    async fn root_admin_seeding_is_idempotent() {
        let (store, manager) = manager().await;
        let root = Subject::object("user", "root");

        manager
            .initialize_root_admin("default", root.clone())
            .await
            .unwrap();
        manager.initialize_root_admin("default", root).await.unwrap();

        let admins = store
            .read(
                "default",
                &TupleFilter::for_object_relation(
                    &ObjectRef::new(ORGANIZATION_TYPE, "default"),
                    ADMIN_RELATION,
                ),
            )
            .await
            .unwrap();
        assert_eq!(admins.len(), 1);
    }

    #[tokio::test]
    async fn org_role_grant_and_revoke_round_trip() {
        let (store, manager) = manager().await;
        let bob = Subject::object("user", "bob");

        manager
            .org_role_granted("default", bob.clone(), "member")
            .await
            .unwrap();
        manager
            .org_role_revoked("default", bob.clone(), "member")
            .await
            .unwrap();
        // Revoking again is still a success.
        manager
            .org_role_revoked("default", bob, "member")
            .await
            .unwrap();

        let all = store.read("default", &TupleFilter::default()).await.unwrap();
        assert!(all.is_empty());
    }
}
