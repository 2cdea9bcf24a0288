//! TupleStore trait definition.

use async_trait::async_trait;

use rebac_domain::model::{AuthorizationModel, ObjectRef, RelationshipTuple, Subject};

use crate::error::{StorageError, StorageResult};

/// Filter for reading tuples. Set fields are conjunctive; `None` matches
/// anything.
#[derive(Debug, Clone, Default)]
pub struct TupleFilter {
    /// Filter by object type.
    pub object_type: Option<String>,
    /// Filter by object ID.
    pub object_id: Option<String>,
    /// Filter by relation.
    pub relation: Option<String>,
    /// Filter by exact subject.
    pub subject: Option<Subject>,
}

impl TupleFilter {
    /// Matches every tuple referencing the given object, across relations.
    /// Used when an entity is deleted and all its tuples must go.
    pub fn for_object(object: &ObjectRef) -> Self {
        Self {
            object_type: Some(object.object_type.clone()),
            object_id: Some(object.object_id.clone()),
            ..Self::default()
        }
    }

    /// Matches tuples for one `(object, relation)` pair.
    pub fn for_object_relation(object: &ObjectRef, relation: &str) -> Self {
        Self {
            object_type: Some(object.object_type.clone()),
            object_id: Some(object.object_id.clone()),
            relation: Some(relation.to_string()),
            ..Self::default()
        }
    }

    /// Whether a tuple satisfies every set field.
    pub fn matches(&self, tuple: &RelationshipTuple) -> bool {
        self.object_type
            .as_ref()
            .map_or(true, |t| &tuple.object.object_type == t)
            && self
                .object_id
                .as_ref()
                .map_or(true, |i| &tuple.object.object_id == i)
            && self.relation.as_ref().map_or(true, |r| &tuple.relation == r)
            && self.subject.as_ref().map_or(true, |s| &tuple.subject == s)
    }
}

/// Store metadata.
#[derive(Debug, Clone)]
pub struct StoreInfo {
    pub id: String,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Abstract storage interface for relationship tuples.
///
/// Implementations must be thread-safe and support many concurrent readers
/// and writers. Two contract points every backend must honor:
///
/// - **Atomic batches**: a [`write`](TupleStore::write) either applies all
///   of its adds and removes or none of them; a half-applied batch is
///   never observable by a concurrent read.
/// - **Idempotency**: adding a tuple that is already present and removing
///   a tuple that is absent are both no-op successes. The store never
///   holds two structurally equal tuples.
///
/// A read issued by a caller strictly after its own completed write must
/// observe that write's effects (read-your-writes).
#[async_trait]
pub trait TupleStore: Send + Sync + 'static {
    // Store operations

    /// Creates a new store.
    async fn create_store(&self, id: &str, name: &str) -> StorageResult<StoreInfo>;

    /// Gets a store by ID.
    async fn get_store(&self, id: &str) -> StorageResult<StoreInfo>;

    /// Deletes a store with its tuples and model.
    async fn delete_store(&self, id: &str) -> StorageResult<()>;

    // Model operations

    /// Installs the authorization model for a store. The model is written
    /// once; if one is already installed, the installed model is returned
    /// unchanged (idempotent bootstrap re-run).
    async fn install_model(
        &self,
        store_id: &str,
        model: AuthorizationModel,
    ) -> StorageResult<AuthorizationModel>;

    /// Gets the installed authorization model for a store.
    async fn get_model(&self, store_id: &str) -> StorageResult<AuthorizationModel>;

    // Tuple operations

    /// Applies one atomic batch of adds and removes.
    async fn write(
        &self,
        store_id: &str,
        adds: Vec<RelationshipTuple>,
        removes: Vec<RelationshipTuple>,
    ) -> StorageResult<()>;

    /// Exact existence check for a tuple.
    async fn contains(&self, store_id: &str, tuple: &RelationshipTuple) -> StorageResult<bool>;

    /// Reads tuples matching the filter.
    async fn read(
        &self,
        store_id: &str,
        filter: &TupleFilter,
    ) -> StorageResult<Vec<RelationshipTuple>>;
}

/// Validates a store ID.
pub fn validate_store_id(id: &str) -> StorageResult<()> {
    if id.is_empty() {
        return Err(StorageError::InvalidInput {
            message: "store id cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// Structural tuple validation: no empty components. Schema-level
/// validation (relation known for the object type) happens above the
/// store, in the relationship manager.
pub fn validate_tuple(tuple: &RelationshipTuple) -> StorageResult<()> {
    let invalid = |message: String| StorageError::InvalidTuple { message };

    if tuple.relation.is_empty() {
        return Err(invalid(format!("empty relation in tuple '{tuple}'")));
    }
    if tuple.object.object_type.is_empty() || tuple.object.object_id.is_empty() {
        return Err(invalid(format!("empty object component in tuple '{tuple}'")));
    }
    let subject_ok = match &tuple.subject {
        Subject::Object(object) => !object.object_type.is_empty() && !object.object_id.is_empty(),
        Subject::Userset { object, relation } => {
            !object.object_type.is_empty() && !object.object_id.is_empty() && !relation.is_empty()
        }
    };
    if !subject_ok {
        return Err(invalid(format!("empty subject component in tuple '{tuple}'")));
    }
    Ok(())
}
