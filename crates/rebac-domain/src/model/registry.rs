//! Schema registry: validated, immutable lookups into an authorization model.
//!
//! The registry is created once by [`SchemaRegistry::load`], which enforces
//! the model invariants, and is read-only afterwards. Lookups are cached in
//! `DashMap`s so concurrent checks never contend on a lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{DomainError, DomainResult};

use super::types::{
    AuthorizationModel, RelationDefinition, RelationshipTuple, Subject, TypeDefinition,
    UsersetExpression,
};

/// Validated authorization model with cached type and relation lookups.
///
/// # Thread Safety
///
/// Immutable after load; safe to share across tasks behind an `Arc`.
#[derive(Debug)]
pub struct SchemaRegistry {
    /// The underlying authorization model.
    model: Arc<AuthorizationModel>,
    /// Cache for type definitions, keyed by type name.
    type_cache: DashMap<String, Arc<TypeDefinition>>,
    /// Cache for relation definitions, keyed by "type_name#relation_name".
    relation_cache: DashMap<String, Arc<RelationDefinition>>,
    /// Relations named as a tupleset by some TupleToUserset expression,
    /// keyed by "type_name#relation_name". These are link relations and
    /// only accept object subjects.
    tupleset_relations: HashSet<String>,
}

impl SchemaRegistry {
    /// Validates the model and builds a registry from it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SchemaError` if the model is empty, defines a
    /// type or relation twice, references an undefined relation, uses a
    /// non-direct relation as a tupleset, or contains a computed-userset
    /// cycle.
    pub fn load(model: AuthorizationModel) -> DomainResult<Self> {
        validate_model(&model)?;

        let mut tupleset_relations = HashSet::new();
        for type_def in &model.type_definitions {
            for relation_def in &type_def.relations {
                collect_tupleset_relations(
                    &type_def.type_name,
                    &relation_def.rewrite,
                    &mut tupleset_relations,
                );
            }
        }

        Ok(Self {
            model: Arc::new(model),
            type_cache: DashMap::new(),
            relation_cache: DashMap::new(),
            tupleset_relations,
        })
    }

    /// Returns a reference to the underlying authorization model.
    pub fn model(&self) -> &AuthorizationModel {
        &self.model
    }

    /// Gets a type definition by name, using the cache if available.
    pub fn get_type(&self, type_name: &str) -> DomainResult<Arc<TypeDefinition>> {
        if let Some(cached) = self.type_cache.get(type_name) {
            return Ok(Arc::clone(cached.value()));
        }

        let type_def = self
            .model
            .type_definitions
            .iter()
            .find(|td| td.type_name == type_name)
            .ok_or_else(|| DomainError::TypeNotFound {
                type_name: type_name.to_string(),
            })?;

        let type_def_arc = Arc::new(type_def.clone());
        self.type_cache
            .insert(type_name.to_string(), Arc::clone(&type_def_arc));
        Ok(type_def_arc)
    }

    /// Gets a relation definition for a specific type.
    pub fn get_relation(
        &self,
        type_name: &str,
        relation: &str,
    ) -> DomainResult<Arc<RelationDefinition>> {
        let cache_key = relation_key(type_name, relation);

        if let Some(cached) = self.relation_cache.get(&cache_key) {
            return Ok(Arc::clone(cached.value()));
        }

        let type_def = self.get_type(type_name)?;
        let relation_def = type_def
            .relations
            .iter()
            .find(|r| r.name == relation)
            .ok_or_else(|| DomainError::RelationNotFound {
                type_name: type_name.to_string(),
                relation: relation.to_string(),
            })?;

        let relation_def_arc = Arc::new(relation_def.clone());
        self.relation_cache
            .insert(cache_key, Arc::clone(&relation_def_arc));
        Ok(relation_def_arc)
    }

    /// Gets the userset expression for a relation on a type.
    pub fn expression(&self, type_name: &str, relation: &str) -> DomainResult<UsersetExpression> {
        Ok(self.get_relation(type_name, relation)?.rewrite.clone())
    }

    /// Checks if a type exists in the model.
    pub fn has_type(&self, type_name: &str) -> bool {
        self.get_type(type_name).is_ok()
    }

    /// Checks if a relation exists on a type.
    pub fn has_relation(&self, type_name: &str, relation: &str) -> bool {
        self.get_relation(type_name, relation).is_ok()
    }

    /// Whether some expression in the model names this relation as its
    /// tupleset (making it a link relation).
    pub fn is_tupleset_relation(&self, type_name: &str, relation: &str) -> bool {
        self.tupleset_relations
            .contains(&relation_key(type_name, relation))
    }

    /// Validates a tuple against the schema (write-path validation).
    ///
    /// Checks that the tuple's relation exists for the object's type, that
    /// the subject's type is known, that a userset subject names an
    /// existing relation, and that link relations only carry object
    /// subjects.
    pub fn validate_tuple(&self, tuple: &RelationshipTuple) -> DomainResult<()> {
        self.get_relation(&tuple.object.object_type, &tuple.relation)?;
        self.get_type(tuple.subject.object_type())?;

        if let Subject::Userset { object, relation } = &tuple.subject {
            self.get_relation(&object.object_type, relation)?;

            if self.is_tupleset_relation(&tuple.object.object_type, &tuple.relation) {
                return Err(DomainError::InvalidTuple {
                    message: format!(
                        "link relation '{}' on type '{}' only accepts object subjects, got userset '{}'",
                        tuple.relation, tuple.object.object_type, tuple.subject
                    ),
                });
            }
        }

        Ok(())
    }
}

fn relation_key(type_name: &str, relation: &str) -> String {
    format!("{type_name}#{relation}")
}

fn collect_tupleset_relations(
    type_name: &str,
    expression: &UsersetExpression,
    out: &mut HashSet<String>,
) {
    match expression {
        UsersetExpression::TupleToUserset { tupleset, .. } => {
            out.insert(relation_key(type_name, tupleset));
        }
        UsersetExpression::Union { children } => {
            for child in children {
                collect_tupleset_relations(type_name, child, out);
            }
        }
        UsersetExpression::Direct | UsersetExpression::ComputedUserset { .. } => {}
    }
}

/// Validates the model invariants. Collects every violation before failing
/// so a bad model is reported in one pass.
fn validate_model(model: &AuthorizationModel) -> DomainResult<()> {
    if model.type_definitions.is_empty() {
        return Err(DomainError::SchemaError {
            message: "model defines no types".to_string(),
        });
    }

    let mut errors = Vec::new();

    let mut types: HashMap<&str, &TypeDefinition> = HashMap::new();
    for type_def in &model.type_definitions {
        if types.insert(&type_def.type_name, type_def).is_some() {
            errors.push(format!("type '{}' defined twice", type_def.type_name));
        }
    }

    for type_def in &model.type_definitions {
        let mut seen = HashSet::new();
        for relation_def in &type_def.relations {
            if !seen.insert(relation_def.name.as_str()) {
                errors.push(format!(
                    "relation '{}' defined twice on type '{}'",
                    relation_def.name, type_def.type_name
                ));
            }
            validate_expression(
                type_def,
                &relation_def.name,
                &relation_def.rewrite,
                &types,
                &mut errors,
            );
        }
        detect_computed_cycles(type_def, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(DomainError::SchemaError {
            message: errors.join("; "),
        })
    }
}

fn validate_expression(
    type_def: &TypeDefinition,
    relation_name: &str,
    expression: &UsersetExpression,
    types: &HashMap<&str, &TypeDefinition>,
    errors: &mut Vec<String>,
) {
    let has_relation = |name: &str| type_def.relations.iter().any(|r| r.name == name);

    match expression {
        UsersetExpression::Direct => {}
        UsersetExpression::ComputedUserset { relation } => {
            if !has_relation(relation) {
                errors.push(format!(
                    "type '{}' relation '{}': computed userset references undefined relation '{}'",
                    type_def.type_name, relation_name, relation
                ));
            }
        }
        UsersetExpression::TupleToUserset { tupleset, computed } => {
            match type_def.relations.iter().find(|r| r.name == *tupleset) {
                None => errors.push(format!(
                    "type '{}' relation '{}': tupleset references undefined relation '{}'",
                    type_def.type_name, relation_name, tupleset
                )),
                // A tupleset names a link relation holding object references,
                // so it must be directly assigned, never computed.
                Some(link) if link.rewrite != UsersetExpression::Direct => errors.push(format!(
                    "type '{}' relation '{}': tupleset relation '{}' must be direct",
                    type_def.type_name, relation_name, tupleset
                )),
                Some(_) => {}
            }

            let computed_exists = types
                .values()
                .any(|td| td.relations.iter().any(|r| r.name == *computed));
            if !computed_exists {
                errors.push(format!(
                    "type '{}' relation '{}': computed relation '{}' not defined on any type",
                    type_def.type_name, relation_name, computed
                ));
            }
        }
        UsersetExpression::Union { children } => {
            if children.is_empty() {
                errors.push(format!(
                    "type '{}' relation '{}': union with no members",
                    type_def.type_name, relation_name
                ));
            }
            for child in children {
                validate_expression(type_def, relation_name, child, types, errors);
            }
        }
    }
}

/// Detects cycles among same-type computed-userset references. A cycle-free
/// computed graph plus the cross-object guarantee of tuple-to-userset is
/// what lets the resolver run without a visited set.
fn detect_computed_cycles(type_def: &TypeDefinition, errors: &mut Vec<String>) {
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for relation_def in &type_def.relations {
        let targets = edges.entry(relation_def.name.as_str()).or_default();
        collect_computed_targets(&relation_def.rewrite, targets);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    fn visit<'a>(
        node: &'a str,
        edges: &HashMap<&'a str, Vec<&'a str>>,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match marks.get(node) {
            Some(Mark::Done) => return None,
            Some(Mark::InProgress) => {
                let mut cycle: Vec<String> = path.iter().map(|s| s.to_string()).collect();
                cycle.push(node.to_string());
                return Some(cycle);
            }
            None => {}
        }
        marks.insert(node, Mark::InProgress);
        path.push(node);
        for next in edges.get(node).into_iter().flatten() {
            if let Some(cycle) = visit(*next, edges, marks, path) {
                return Some(cycle);
            }
        }
        path.pop();
        marks.insert(node, Mark::Done);
        None
    }

    let mut marks = HashMap::new();
    for relation_def in &type_def.relations {
        let mut path = Vec::new();
        if let Some(cycle) = visit(relation_def.name.as_str(), &edges, &mut marks, &mut path) {
            errors.push(format!(
                "type '{}': computed userset cycle: {}",
                type_def.type_name,
                cycle.join(" -> ")
            ));
            return;
        }
    }
}

fn collect_computed_targets<'a>(expression: &'a UsersetExpression, out: &mut Vec<&'a str>) {
    match expression {
        UsersetExpression::ComputedUserset { relation } => out.push(relation),
        UsersetExpression::Union { children } => {
            for child in children {
                collect_computed_targets(child, out);
            }
        }
        UsersetExpression::Direct | UsersetExpression::TupleToUserset { .. } => {}
    }
}
