//! File-backed model store
//!
//! Each model lives in `<directory>/<id>.json`, wrapped in an envelope that
//! records when it was last written.

use super::ModelStore;
use crate::{Error, Result, state_machine::FsmModel};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// On-disk document
#[derive(Debug, Serialize, Deserialize)]
struct StoredModel {
    updated_at: DateTime<Utc>,
    model: FsmModel,
}

/// Model Store backed by a directory of JSON files
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Create a new store instance. The directory is created on first write.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Get model file path, refusing ids that could escape the directory
    fn model_path(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::store(format!("invalid model id {:?}", id)));
        }
        Ok(self.directory.join(format!("{}.json", id)))
    }

    /// Ensure store directory exists
    async fn ensure_directory(&self) -> Result<()> {
        if !self.directory.exists() {
            fs::create_dir_all(&self.directory)
                .await
                .map_err(Error::Io)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ModelStore for FileStore {
    async fn get(&self, id: &str) -> Result<Option<FsmModel>> {
        let path = self.model_path(id)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No stored model {}", id);
                return Ok(None);
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let stored: StoredModel = serde_json::from_str(&content).map_err(|e| Error::FileParse {
            file: path.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!("Loaded model {} written at {}", id, stored.updated_at);
        Ok(Some(stored.model))
    }

    async fn put(&self, model: &FsmModel) -> Result<()> {
        let path = self.model_path(model.id())?;
        self.ensure_directory().await?;

        let stored = StoredModel {
            updated_at: Utc::now(),
            model: model.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        // Write then rename so readers never see a partial document
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;

        tracing::info!("Stored model {} at {:?}", model.id(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{EventId, GraphBuilder, StateId, Transition};

    fn sample() -> FsmModel {
        GraphBuilder::default()
            .build(
                &[
                    Transition::new(
                        StateId::new("idle").unwrap(),
                        EventId::new("start").unwrap(),
                        "go",
                        StateId::new("running").unwrap(),
                    ),
                    Transition::new(
                        StateId::new("running").unwrap(),
                        EventId::new("stop").unwrap(),
                        "halt",
                        StateId::new("idle").unwrap(),
                    )
                    .with_guard("safe"),
                ],
                "file store",
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("models"));
        let model = sample();

        store.put(&model).await.unwrap();
        let loaded = store.get(model.id()).await.unwrap();
        assert_eq!(loaded, Some(model));
    }

    #[tokio::test]
    async fn test_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("does-not-exist").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.get("../etc/passwd").await.is_err());
        assert!(store.get("").await.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        fs::write(dir.path().join("broken.json"), "{not json")
            .await
            .unwrap();
        let err = store.get("broken").await.unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }
}
