//! Reference adapters shipped with the core.
//!
//! - **LocalAdapter**: real filesystem access under a root directory
//! - **MemoryAdapter**: in-process object store with directory marker keys

mod local;
mod memory;

pub use local::LocalAdapter;
pub use memory::{MemoryAdapter, ObjectStoreError};
