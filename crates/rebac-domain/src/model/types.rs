//! Core type definitions for the authorization model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A typed reference to an object (e.g., a user, a space, an organization).
///
/// Renders as `type:id`. Identifier strings are opaque; the type is drawn
/// from the vocabulary of the installed authorization model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// The type portion (e.g., "space").
    pub object_type: String,
    /// The ID portion (e.g., "eng").
    pub object_id: String,
}

impl ObjectRef {
    /// Creates a new ObjectRef from type and ID.
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }

    /// Parses an object reference from `type:id` text.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.split_once(':') {
            Some((object_type, object_id))
                if !object_type.is_empty() && !object_id.is_empty() && !object_id.contains('#') =>
            {
                Ok(Self::new(object_type, object_id))
            }
            _ => Err(DomainError::InvalidReference {
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.object_id)
    }
}

impl FromStr for ObjectRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The subject of a relationship tuple.
///
/// Either a concrete object (`user:alice`) or a userset reference
/// (`organization:default#admin`, meaning every subject that holds `admin`
/// on `organization:default`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    /// A concrete object.
    Object(ObjectRef),
    /// Every subject holding `relation` on `object`.
    Userset { object: ObjectRef, relation: String },
}

impl Subject {
    /// Creates an object subject.
    pub fn object(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Subject::Object(ObjectRef::new(object_type, object_id))
    }

    /// Creates a userset-reference subject.
    pub fn userset(
        object_type: impl Into<String>,
        object_id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Subject::Userset {
            object: ObjectRef::new(object_type, object_id),
            relation: relation.into(),
        }
    }

    /// The subject's object type, regardless of variant.
    pub fn object_type(&self) -> &str {
        match self {
            Subject::Object(object) => &object.object_type,
            Subject::Userset { object, .. } => &object.object_type,
        }
    }

    /// Parses a subject from `type:id` or `type:id#relation` text.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.split_once('#') {
            Some((object, relation)) if !relation.is_empty() => Ok(Subject::Userset {
                object: ObjectRef::parse(object)?,
                relation: relation.to_string(),
            }),
            Some(_) => Err(DomainError::InvalidReference {
                value: value.to_string(),
            }),
            None => Ok(Subject::Object(ObjectRef::parse(value)?)),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Object(object) => write!(f, "{object}"),
            Subject::Userset { object, relation } => write!(f, "{object}#{relation}"),
        }
    }
}

impl FromStr for Subject {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<ObjectRef> for Subject {
    fn from(object: ObjectRef) -> Self {
        Subject::Object(object)
    }
}

/// A stored relationship fact: (subject, relation, object).
///
/// Structural equality is the uniqueness key; the store keeps tuples in a
/// set, so writing the identical triple twice collapses to one row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipTuple {
    /// The subject of the relationship.
    pub subject: Subject,
    /// The relation between subject and object.
    pub relation: String,
    /// The object of the relationship.
    pub object: ObjectRef,
}

impl RelationshipTuple {
    /// Creates a new RelationshipTuple.
    pub fn new(subject: Subject, relation: impl Into<String>, object: ObjectRef) -> Self {
        Self {
            subject,
            relation: relation.into(),
            object,
        }
    }
}

impl fmt::Display for RelationshipTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.object, self.relation, self.subject)
    }
}

/// How a relation's grantee set is computed.
///
/// Evaluated by structural recursion in the resolver; the four cases are a
/// closed algebra (no runtime case-name dispatch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UsersetExpression {
    /// Grantees are whoever a stored tuple ties to this relation.
    Direct,
    /// Grantees equal those of another relation on the same object.
    ComputedUserset { relation: String },
    /// Follow `tupleset` link tuples to other objects, then evaluate
    /// `computed` there (cross-object inheritance).
    TupleToUserset { tupleset: String, computed: String },
    /// Union of the member expressions' grantees.
    Union { children: Vec<UsersetExpression> },
}

/// An authorization model defining types and their relations.
///
/// Created once at bootstrap and read-only for the lifetime of a store;
/// shipping a new model version means reinstalling, not mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationModel {
    /// Schema version (e.g., "1.0").
    pub schema_version: String,
    /// Type definitions in the model.
    pub type_definitions: Vec<TypeDefinition>,
}

impl AuthorizationModel {
    /// Creates an empty model with the given schema version.
    pub fn new(schema_version: impl Into<String>) -> Self {
        Self {
            schema_version: schema_version.into(),
            type_definitions: Vec::new(),
        }
    }

    /// Creates a model with the given type definitions.
    pub fn with_types(
        schema_version: impl Into<String>,
        type_definitions: Vec<TypeDefinition>,
    ) -> Self {
        Self {
            schema_version: schema_version.into(),
            type_definitions,
        }
    }
}

/// A type definition within the authorization model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// The type name (e.g., "space", "organization").
    pub type_name: String,
    /// Relations defined on this type.
    pub relations: Vec<RelationDefinition>,
}

impl TypeDefinition {
    /// Creates a type definition with no relations (subject-only types).
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            relations: Vec::new(),
        }
    }

    /// Adds a relation to this type definition.
    pub fn with_relation(mut self, name: impl Into<String>, rewrite: UsersetExpression) -> Self {
        self.relations.push(RelationDefinition {
            name: name.into(),
            rewrite,
        });
        self
    }
}

/// A relation definition on a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDefinition {
    /// The relation name.
    pub name: String,
    /// The userset expression defining who holds the relation.
    pub rewrite: UsersetExpression,
}
