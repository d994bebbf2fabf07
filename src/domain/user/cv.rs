//! CV file storage seam

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Stores uploaded CV documents by file name
#[async_trait]
pub trait CvStorage: Send + Sync + Debug {
    /// Persist a document under `file_name`, replacing any existing one
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<(), DomainError>;

    /// Read a document, `Ok(None)` when it does not exist
    async fn load(&self, file_name: &str) -> Result<Option<Vec<u8>>, DomainError>;

    /// Remove a document; removing a missing file is not an error
    async fn remove(&self, file_name: &str) -> Result<(), DomainError>;
}
