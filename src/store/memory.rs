//! In-memory model store

use super::ModelStore;
use crate::{Result, state_machine::FsmModel};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Models kept in a process-local map
#[derive(Debug, Default)]
pub struct MemoryStore {
    models: RwLock<HashMap<String, FsmModel>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.models.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.models.read().await.is_empty()
    }
}

#[async_trait]
impl ModelStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<FsmModel>> {
        Ok(self.models.read().await.get(id).cloned())
    }

    async fn put(&self, model: &FsmModel) -> Result<()> {
        self.models
            .write()
            .await
            .insert(model.id().to_string(), model.clone());
        Ok(())
    }
}
