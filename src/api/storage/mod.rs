//! Storage module for the API.
//!
//! Provides the `StorageBackend` trait plus PostgreSQL and in-memory
//! implementations.

pub mod error;
pub mod traits;

// Storage backend implementations
pub mod memory;
pub mod postgres;

pub use error::StorageError;
pub use memory::MemoryStorageBackend;
pub use postgres::PostgresStorageBackend;
pub use traits::{AutomationFilter, StorageBackend, StorageTx};
