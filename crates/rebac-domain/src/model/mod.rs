//! Authorization model types and schema registry.
//!
//! This module contains:
//! - Core type definitions (ObjectRef, Subject, RelationshipTuple)
//! - Userset expressions and the authorization model
//! - The validated, immutable schema registry

mod registry;
mod types;
#[cfg(test)]
mod types_proptest;

pub use registry::SchemaRegistry;
pub use types::*;
