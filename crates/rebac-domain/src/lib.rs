//! rebac-domain: Core authorization domain logic
//!
//! This crate contains the relationship-based access-control core:
//! - Authorization model types and the schema registry
//! - Permission resolver (userset-expression evaluation)
//! - Typed domain errors
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                rebac-domain                  │
//! ├─────────────────────────────────────────────┤
//! │  model/     - Types & schema registry       │
//! │  resolver/  - Userset evaluation engine     │
//! │  error.rs   - Domain error taxonomy         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Storage is abstracted behind the [`resolver::TupleReader`] and
//! [`resolver::SchemaReader`] traits so the resolver stays a pure function
//! of a schema, a tuple snapshot, and a query.

pub mod error;
pub mod model;
pub mod resolver;

pub use error::{DomainError, DomainResult};
