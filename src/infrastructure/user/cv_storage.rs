//! CV document storage backends

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::user::CvStorage;
use crate::domain::DomainError;

/// Stores CVs as files in a single directory
#[derive(Debug, Clone)]
pub struct FsCvStorage {
    root: PathBuf,
}

impl FsCvStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a stored file name, refusing anything that is not a bare name
    fn path_for(&self, file_name: &str) -> Result<PathBuf, DomainError> {
        let bare = Path::new(file_name)
            .file_name()
            .is_some_and(|name| name == file_name);

        if !bare {
            return Err(DomainError::validation(format!(
                "Invalid CV file name '{}'",
                file_name
            )));
        }

        Ok(self.root.join(file_name))
    }
}

#[async_trait]
impl CvStorage for FsCvStorage {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<(), DomainError> {
        let path = self.path_for(file_name)?;

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            DomainError::storage(format!("Failed to create CV directory: {}", e))
        })?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to write CV: {}", e)))?;

        debug!(path = %path.display(), size = bytes.len(), "CV stored");
        Ok(())
    }

    async fn load(&self, file_name: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let path = self.path_for(file_name)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DomainError::storage(format!("Failed to read CV: {}", e))),
        }
    }

    async fn remove(&self, file_name: &str) -> Result<(), DomainError> {
        let path = self.path_for(file_name)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::storage(format!("Failed to remove CV: {}", e))),
        }
    }
}

/// Keeps CVs in memory; pairs with the in-memory storage backend
#[derive(Debug, Clone, Default)]
pub struct InMemoryCvStorage {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryCvStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CvStorage for InMemoryCvStorage {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<(), DomainError> {
        self.files
            .write()
            .await
            .insert(file_name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn load(&self, file_name: &str) -> Result<Option<Vec<u8>>, DomainError> {
        Ok(self.files.read().await.get(file_name).cloned())
    }

    async fn remove(&self, file_name: &str) -> Result<(), DomainError> {
        self.files.write().await.remove(file_name);
        Ok(())
    }
}
