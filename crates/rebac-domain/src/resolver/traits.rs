//! Traits at the resolver's data-access seam.

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::model::{ObjectRef, SchemaRegistry, Subject, UsersetExpression};

/// Read access to stored tuples, scoped to one logical store.
///
/// The resolver only ever asks one question of the store: which subjects
/// are tied to `(object, relation)`. Userset-reference subjects and link
/// targets are expanded by recursion, not by the reader.
#[async_trait]
pub trait TupleReader: Send + Sync {
    /// All subjects tied to `(object, relation)` by stored tuples.
    async fn subjects_for(&self, object: &ObjectRef, relation: &str)
        -> DomainResult<Vec<Subject>>;
}

/// Read access to the authorization schema.
#[async_trait]
pub trait SchemaReader: Send + Sync {
    /// The userset expression defining `relation` on `object_type`.
    async fn userset_expression(
        &self,
        object_type: &str,
        relation: &str,
    ) -> DomainResult<UsersetExpression>;
}

#[async_trait]
impl SchemaReader for SchemaRegistry {
    async fn userset_expression(
        &self,
        object_type: &str,
        relation: &str,
    ) -> DomainResult<UsersetExpression> {
        self.expression(object_type, relation)
    }
}
