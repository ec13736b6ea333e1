//! Model store module - Abstraction for persisting state machine models
//!
//! The core only needs get-by-id / put-by-id semantics; there is no
//! transaction logic. Callers hold single-writer access to a model while
//! editing it.

use crate::state_machine::FsmModel;
use crate::{Config, Error, Result};
use async_trait::async_trait;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Store for models keyed by their id
///
/// Implementations:
/// - `FileStore`: one JSON document per model on disk
/// - `MemoryStore`: process-local map, for tests and one-shot runs
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Fetch a model by id, `None` if unknown
    async fn get(&self, id: &str) -> Result<Option<FsmModel>>;

    /// Insert or replace the model stored under its id
    async fn put(&self, model: &FsmModel) -> Result<()>;

    /// Fetch a model by id, failing if unknown
    async fn require(&self, id: &str) -> Result<FsmModel> {
        self.get(id)
            .await?
            .ok_or_else(|| Error::ModelNotFound(id.to_string()))
    }
}

/// Create the configured store
pub fn create_store(config: &Config) -> Box<dyn ModelStore> {
    Box::new(FileStore::new(config.store_directory()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_require_missing_model() {
        let store = MemoryStore::new();
        let err = store.require("nope").await.unwrap_err();
        assert!(matches!(err, Error::ModelNotFound(id) if id == "nope"));
    }
}
