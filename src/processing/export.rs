//! Export artifacts and the download mechanism they are written to.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::core::ItemId;
use crate::utils::{StudioError, StudioResult, create_dir_all};

/// Destination of exported files.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> StudioResult<()>;
}

/// Writes exports into a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ExportSink for DirectorySink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> StudioResult<()> {
        create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        fs::write(&path, bytes)
            .await
            .map_err(|e| StudioError::IO(format!("Failed to write {}: {}", path.display(), e)))?;
        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// `<prefix>-<item-id>.png`
pub fn export_file_name(prefix: &str, id: &ItemId) -> String {
    format!("{prefix}-{id}.png")
}
