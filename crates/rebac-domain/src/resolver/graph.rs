//! Permission resolver: recursive evaluation of userset expressions.
//!
//! The resolver is a pure function of the schema, a tuple snapshot, and a
//! query. It performs only reads, so any number of checks may run in
//! parallel with each other and with unrelated write batches.
//!
//! Evaluation is structural recursion over the four-case expression
//! algebra, with union branches raced in parallel and short-circuited on
//! the first allow.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::timeout;
use tracing::instrument;

use crate::error::{DomainError, DomainResult};
use crate::model::{ObjectRef, Subject, UsersetExpression};

use super::config::ResolverConfig;
use super::context::TraversalContext;
use super::traits::{SchemaReader, TupleReader};
use super::types::{CheckOutcome, CheckRequest};

/// Type alias for boxed future to handle async recursion.
type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Evaluates permission checks against a schema and a tuple store.
pub struct PermissionResolver<T, S> {
    tuples: Arc<T>,
    schema: Arc<S>,
    config: ResolverConfig,
}

impl<T, S> PermissionResolver<T, S>
where
    T: TupleReader + 'static,
    S: SchemaReader + 'static,
{
    /// Creates a new resolver with default configuration.
    pub fn new(tuples: Arc<T>, schema: Arc<S>) -> Self {
        Self {
            tuples,
            schema,
            config: ResolverConfig::default(),
        }
    }

    /// Creates a new resolver with custom configuration.
    pub fn with_config(tuples: Arc<T>, schema: Arc<S>, config: ResolverConfig) -> Self {
        Self {
            tuples,
            schema,
            config,
        }
    }

    /// Performs a permission check.
    ///
    /// Returns `Ok(CheckOutcome { allowed: false })` when no grant path
    /// exists; errors are reserved for schema misuse and store failure.
    /// The whole evaluation runs under the configured deadline.
    #[instrument(skip_all, fields(
        subject = %request.subject,
        relation = %request.relation,
        object = %request.object,
    ))]
    pub async fn check(&self, request: &CheckRequest) -> DomainResult<CheckOutcome> {
        if request.relation.is_empty() {
            return Err(DomainError::InvalidReference {
                value: "empty relation".to_string(),
            });
        }

        let evaluation = self.resolve(
            request.subject.clone(),
            request.relation.clone(),
            request.object.clone(),
            TraversalContext::new(),
        );

        match timeout(self.config.timeout, evaluation).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DomainError::Timeout {
                duration_ms: self.config.timeout.as_millis() as u64,
            }),
        }
    }

    /// Resolves `subject holds relation on object` by looking up the
    /// relation's expression and evaluating it (boxed for recursion).
    fn resolve(
        &self,
        subject: ObjectRef,
        relation: String,
        object: ObjectRef,
        ctx: TraversalContext,
    ) -> BoxFuture<'_, DomainResult<CheckOutcome>> {
        Box::pin(async move {
            if ctx.depth >= self.config.max_depth {
                return Err(DomainError::DepthLimitExceeded {
                    max_depth: self.config.max_depth,
                });
            }

            let expression = self
                .schema
                .userset_expression(&object.object_type, &relation)
                .await?;

            self.evaluate(subject, relation, object, expression, ctx)
                .await
        })
    }

    /// Evaluates one userset expression (boxed for recursion).
    fn evaluate(
        &self,
        subject: ObjectRef,
        relation: String,
        object: ObjectRef,
        expression: UsersetExpression,
        ctx: TraversalContext,
    ) -> BoxFuture<'_, DomainResult<CheckOutcome>> {
        Box::pin(async move {
            match expression {
                UsersetExpression::Direct => {
                    self.evaluate_direct(subject, relation, object, ctx).await
                }

                UsersetExpression::ComputedUserset { relation: aliased } => {
                    // Same object, other relation.
                    self.resolve(subject, aliased, object, ctx.child()).await
                }

                UsersetExpression::TupleToUserset { tupleset, computed } => {
                    self.evaluate_tuple_to_userset(subject, tupleset, computed, object, ctx)
                        .await
                }

                UsersetExpression::Union { children } => {
                    self.evaluate_union(subject, relation, object, children, ctx)
                        .await
                }
            }
        })
    }

    /// Direct membership: an exact stored tuple for the subject, or
    /// indirect membership through a userset-reference subject.
    async fn evaluate_direct(
        &self,
        subject: ObjectRef,
        relation: String,
        object: ObjectRef,
        ctx: TraversalContext,
    ) -> DomainResult<CheckOutcome> {
        let stored = self.tuples.subjects_for(&object, &relation).await?;

        if stored
            .iter()
            .any(|s| matches!(s, Subject::Object(o) if *o == subject))
        {
            return Ok(CheckOutcome::ALLOWED);
        }

        for entry in stored {
            if let Subject::Userset {
                object: via,
                relation: via_relation,
            } = entry
            {
                let outcome = self
                    .resolve(subject.clone(), via_relation, via, ctx.child())
                    .await?;
                if outcome.allowed {
                    return Ok(CheckOutcome::ALLOWED);
                }
            }
        }

        Ok(CheckOutcome::DENIED)
    }

    /// Follows link tuples to other objects and re-evaluates there.
    /// Logical OR over link targets; normally there is exactly one.
    async fn evaluate_tuple_to_userset(
        &self,
        subject: ObjectRef,
        tupleset: String,
        computed: String,
        object: ObjectRef,
        ctx: TraversalContext,
    ) -> DomainResult<CheckOutcome> {
        let links = self.tuples.subjects_for(&object, &tupleset).await?;

        for link in links {
            // Link relations hold object references only; userset subjects
            // are rejected on the write path.
            let Subject::Object(target) = link else {
                continue;
            };

            let outcome = self
                .resolve(subject.clone(), computed.clone(), target, ctx.child())
                .await?;
            if outcome.allowed {
                return Ok(CheckOutcome::ALLOWED);
            }
        }

        Ok(CheckOutcome::DENIED)
    }

    /// Races all union branches and short-circuits on the first allow.
    async fn evaluate_union(
        &self,
        subject: ObjectRef,
        relation: String,
        object: ObjectRef,
        children: Vec<UsersetExpression>,
        ctx: TraversalContext,
    ) -> DomainResult<CheckOutcome> {
        let child_ctx = ctx.child();

        let mut branches: FuturesUnordered<_> = children
            .into_iter()
            .map(|child| {
                self.evaluate(
                    subject.clone(),
                    relation.clone(),
                    object.clone(),
                    child,
                    child_ctx,
                )
            })
            .collect();

        // A branch error is only surfaced when no other branch allows:
        // union semantics are satisfied by any single grant path.
        let mut first_error: Option<DomainError> = None;

        while let Some(result) = branches.next().await {
            match result {
                Ok(CheckOutcome { allowed: true }) => return Ok(CheckOutcome::ALLOWED),
                Ok(_) => {}
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(CheckOutcome::DENIED),
        }
    }
}
