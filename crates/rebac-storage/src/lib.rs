//! rebac-storage: Tuple store abstraction
//!
//! This crate provides the storage seam for the ReBAC core:
//! - `TupleStore` trait: store lifecycle, model install, atomic idempotent
//!   tuple batches, point and filtered reads
//! - In-memory implementation for tests and single-node deployments
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               rebac-storage                  │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs  - TupleStore trait definition   │
//! │  memory.rs  - In-memory implementation      │
//! │  error.rs   - Storage error taxonomy        │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryTupleStore;
pub use traits::{StoreInfo, TupleFilter, TupleStore};
