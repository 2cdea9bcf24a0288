//! Access controller: the fail-closed decision facade.
//!
//! Permission-gated callers ask this facade, not the resolver directly.
//! Transient infrastructure failures (store unreachable, deadline elapsed)
//! come back as a plain deny, so an outage can never widen access and the
//! caller-facing signal does not distinguish "no grant" from "failed
//! closed". Schema misuse still surfaces as an error.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use rebac_domain::error::DomainResult;
use rebac_domain::model::ObjectRef;
use rebac_domain::resolver::{
    CheckOutcome, CheckRequest, PermissionResolver, SchemaReader, TupleReader,
};

/// Pass-through decision counters.
#[derive(Debug, Default)]
pub struct DecisionMetrics {
    /// Checks that found a grant path.
    pub allowed: AtomicU64,
    /// Checks that found no grant path.
    pub denied: AtomicU64,
    /// Checks denied because of a transient store failure.
    pub failed_closed: AtomicU64,
}

impl DecisionMetrics {
    /// Returns a snapshot of the current counters.
    pub fn snapshot(&self) -> DecisionMetricsSnapshot {
        DecisionMetricsSnapshot {
            allowed: self.allowed.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            failed_closed: self.failed_closed.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of decision metrics.
#[derive(Debug, Clone, Copy)]
pub struct DecisionMetricsSnapshot {
    pub allowed: u64,
    pub denied: u64,
    pub failed_closed: u64,
}

/// Fail-closed wrapper around the permission resolver.
pub struct AccessController<T, S> {
    resolver: PermissionResolver<T, S>,
    metrics: DecisionMetrics,
}

impl<T, S> AccessController<T, S>
where
    T: TupleReader + 'static,
    S: SchemaReader + 'static,
{
    /// Creates a new access controller.
    pub fn new(resolver: PermissionResolver<T, S>) -> Self {
        Self {
            resolver,
            metrics: DecisionMetrics::default(),
        }
    }

    /// Returns the decision metrics for monitoring.
    pub fn metrics(&self) -> &DecisionMetrics {
        &self.metrics
    }

    /// Can `subject` exercise `relation` on `object`?
    ///
    /// `Ok(false)` covers both "no grant" and "store unavailable, failed
    /// closed"; callers treat it as deny and stop before mutating.
    pub async fn allowed(
        &self,
        subject: ObjectRef,
        relation: &str,
        object: ObjectRef,
    ) -> DomainResult<bool> {
        let request = CheckRequest::new(subject, relation, object);

        match self.resolver.check(&request).await {
            Ok(CheckOutcome { allowed: true }) => {
                self.metrics.allowed.fetch_add(1, Ordering::Relaxed);
                Ok(true)
            }
            Ok(CheckOutcome { allowed: false }) => {
                self.metrics.denied.fetch_add(1, Ordering::Relaxed);
                Ok(false)
            }
            Err(e) if e.is_transient() => {
                warn!(
                    subject = %request.subject,
                    relation = %request.relation,
                    object = %request.object,
                    error = %e,
                    "permission check hit a transient failure, denying"
                );
                self.metrics.failed_closed.fetch_add(1, Ordering::Relaxed);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use rebac_domain::error::{DomainError, DomainResult};
    use rebac_domain::model::{
        AuthorizationModel, ObjectRef, SchemaRegistry, Subject, TypeDefinition, UsersetExpression,
    };
    use rebac_domain::resolver::{PermissionResolver, TupleReader};

    use super::*;

    struct UnavailableTupleReader;

    #[async_trait]
    impl TupleReader for UnavailableTupleReader {
        async fn subjects_for(
            &self,
            _object: &ObjectRef,
            _relation: &str,
        ) -> DomainResult<Vec<Subject>> {
            Err(DomainError::StoreUnavailable {
                message: "connection refused".to_string(),
            })
        }
    }

    struct EmptyTupleReader;

    #[async_trait]
    impl TupleReader for EmptyTupleReader {
        async fn subjects_for(
            &self,
            _object: &ObjectRef,
            _relation: &str,
        ) -> DomainResult<Vec<Subject>> {
            Ok(Vec::new())
        }
    }

    fn registry() -> Arc<SchemaRegistry> {
        let model = AuthorizationModel::with_types(
            "1.0",
            vec![
                TypeDefinition::new("user"),
                TypeDefinition::new("space").with_relation("moderator", UsersetExpression::Direct),
            ],
        );
        Arc::new(SchemaRegistry::load(model).unwrap())
    }

    #[tokio::test]
    async fn transient_failure_denies_and_counts_failed_closed() {
        let controller = AccessController::new(PermissionResolver::new(
            Arc::new(UnavailableTupleReader),
            registry(),
        ));

        let allowed = controller
            .allowed(
                ObjectRef::new("user", "alice"),
                "moderator",
                ObjectRef::new("space", "eng"),
            )
            .await
            .unwrap();

        assert!(!allowed);
        let snapshot = controller.metrics().snapshot();
        assert_eq!(snapshot.failed_closed, 1);
        assert_eq!(snapshot.allowed, 0);
    }

    #[tokio::test]
    async fn schema_misuse_still_surfaces_as_error() {
        let controller = AccessController::new(PermissionResolver::new(
            Arc::new(EmptyTupleReader),
            registry(),
        ));

        let result = controller
            .allowed(
                ObjectRef::new("user", "alice"),
                "owner",
                ObjectRef::new("space", "eng"),
            )
            .await;

        assert!(matches!(result, Err(DomainError::RelationNotFound { .. })));
    }

    #[tokio::test]
    async fn plain_deny_counts_denied() {
        let controller = AccessController::new(PermissionResolver::new(
            Arc::new(EmptyTupleReader),
            registry(),
        ));

        let allowed = controller
            .allowed(
                ObjectRef::new("user", "alice"),
                "moderator",
                ObjectRef::new("space", "eng"),
            )
            .await
            .unwrap();

        assert!(!allowed);
        assert_eq!(controller.metrics().snapshot().denied, 1);
    }
}
