//! Seams to the outside world: the generation service and upload reading.

use std::path::Path;
use async_trait::async_trait;
use crate::core::{GeneratedImage, GenerationSettings, SourceImage};
use crate::utils::{StudioResult, read_upload};

/// Turns a product photo into its studio variant.
///
/// Implementations report every failure (transport, quota, malformed or
/// missing output) as [`crate::utils::StudioError::Generation`]; the caller
/// records it on the item.
#[async_trait]
pub trait StudioGenerator: Send + Sync {
    async fn generate(
        &self,
        source: &SourceImage,
        settings: &GenerationSettings,
    ) -> StudioResult<GeneratedImage>;
}

/// Reads an uploaded file into memory.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    async fn load(&self, path: &Path) -> StudioResult<SourceImage>;
}

/// Loads uploads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceLoader;

#[async_trait]
impl SourceLoader for FsSourceLoader {
    async fn load(&self, path: &Path) -> StudioResult<SourceImage> {
        read_upload(path).await
    }
}
