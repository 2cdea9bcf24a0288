//! rebac-server: write orchestration and access decisions
//!
//! This crate ties the domain engine to a tuple store:
//! - Relationship manager: schema-validated, atomic, idempotent batches
//!   plus the entity-lifecycle bindings
//! - Access controller: the fail-closed check facade callers gate on
//! - Bootstrap: one-time store/model/root-admin setup
//! - Configuration and logging setup
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               rebac-server                   │
//! ├─────────────────────────────────────────────┤
//! │  schema.rs    - Product vocabulary & model  │
//! │  adapters.rs  - TupleStore -> domain seam   │
//! │  manager.rs   - Relationship manager        │
//! │  access.rs    - Fail-closed check facade    │
//! │  bootstrap.rs - Startup state machine       │
//! │  config.rs    - Layered configuration       │
//! │  logging.rs   - tracing-subscriber setup    │
//! └─────────────────────────────────────────────┘
//! ```

pub mod access;
pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod logging;
pub mod manager;
pub mod schema;

pub use access::{AccessController, DecisionMetrics, DecisionMetricsSnapshot};
pub use adapters::StoreTupleReader;
pub use bootstrap::{Bootstrap, BootstrapError, BootstrapStage, Bootstrapped};
pub use config::{ConfigLoadError, RebacConfig};
pub use manager::{ManagerError, RelationshipManager};
