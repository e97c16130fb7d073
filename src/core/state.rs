//! Application state shared by every front end.

use std::path::PathBuf;
use std::sync::Arc;
use futures::future::try_join_all;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::core::{
    AspectRatio, AttemptOutcome, BackgroundOption, BatchSettings, ExportConfig,
    ImageItem, ItemId, ItemStore, Progress, SourceImage, StudioConfig,
};
use crate::processing::batch::render_item;
use crate::processing::{
    BatchOrchestrator, BatchReport, ExportSink, FsSourceLoader, ItemLifecycleManager,
    SourceLoader, StudioGenerator, export_file_name,
};
use crate::utils::{StudioError, StudioResult, validate_settings};

/// Owns the item store, the mutable batch settings and the export sink.
///
/// Cloning shares everything; every generation attempt snapshots the settings
/// at the moment it is issued.
#[derive(Clone)]
pub struct AppState {
    lifecycle: ItemLifecycleManager,
    orchestrator: BatchOrchestrator,
    settings: Arc<RwLock<BatchSettings>>,
    loader: Arc<dyn SourceLoader>,
    sink: Arc<dyn ExportSink>,
    export: ExportConfig,
}

impl AppState {
    /// Creates a new application state from a loaded configuration.
    pub fn new(
        config: &StudioConfig,
        generator: Arc<dyn StudioGenerator>,
        sink: Arc<dyn ExportSink>,
    ) -> Self {
        let lifecycle = ItemLifecycleManager::new(ItemStore::new(), generator);
        let orchestrator = BatchOrchestrator::new(lifecycle.clone(), config.batch.clone());
        let settings = BatchSettings {
            generation: config.generation.clone(),
            frame: None,
        };
        debug!("AppState initialized");

        Self {
            lifecycle,
            orchestrator,
            settings: Arc::new(RwLock::new(settings)),
            loader: Arc::new(FsSourceLoader),
            sink,
            export: config.export.clone(),
        }
    }

    /// Replaces the upload reader.
    pub fn with_loader(mut self, loader: Arc<dyn SourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn store(&self) -> &ItemStore {
        self.lifecycle.store()
    }

    /// Reads every file, then creates one `Pending` item per file.
    ///
    /// Nothing is created unless all files could be read.
    pub async fn upload_files(&self, paths: &[PathBuf]) -> StudioResult<Vec<ItemId>> {
        let sources = try_join_all(paths.iter().map(|path| self.loader.load(path))).await?;
        let ids = self
            .store()
            .insert_many(sources.into_iter().map(ImageItem::new).collect())
            .await;
        info!("Uploaded {} images", ids.len());
        Ok(ids)
    }

    pub async fn add_source(&self, source: SourceImage) -> ItemId {
        self.lifecycle.add_item(source).await
    }

    pub async fn items(&self) -> Vec<ImageItem> {
        self.store().snapshot().await
    }

    pub async fn item(&self, id: &ItemId) -> Option<ImageItem> {
        self.store().get(id).await
    }

    /// Snapshot of the current batch settings
    pub async fn settings(&self) -> BatchSettings {
        self.settings.read().await.clone()
    }

    pub async fn set_aspect_ratio(&self, ratio: AspectRatio) {
        debug!("Aspect ratio set to {}", ratio);
        self.settings.write().await.generation.aspect_ratio = ratio;
    }

    pub async fn set_background(&self, background: Option<BackgroundOption>) {
        self.settings.write().await.generation.background = background;
    }

    pub async fn set_prompt_modifier(&self, modifier: Option<String>) -> StudioResult<()> {
        let mut settings = self.settings.write().await;
        let mut generation = settings.generation.clone();
        generation.prompt_modifier = modifier.filter(|m| !m.trim().is_empty());
        validate_settings(&generation)?;
        settings.generation = generation;
        Ok(())
    }

    /// Loads a frame overlay used by every later export.
    pub async fn set_frame(&self, path: impl Into<PathBuf>) -> StudioResult<()> {
        let path = path.into();
        let frame = self.loader.load(&path).await?;
        self.set_frame_image(frame).await;
        Ok(())
    }

    pub async fn set_frame_image(&self, frame: SourceImage) {
        debug!("Frame set ({} bytes)", frame.bytes.len());
        self.settings.write().await.frame = Some(frame);
    }

    pub async fn clear_frame(&self) {
        self.settings.write().await.frame = None;
    }

    /// Issues a new attempt for one item, whatever its status.
    pub async fn regenerate(&self, id: &ItemId) -> StudioResult<AttemptOutcome> {
        let generation = self.settings.read().await.generation.clone();
        self.lifecycle.issue_generation(id, &generation).await
    }

    pub async fn remove(&self, id: &ItemId) -> bool {
        self.lifecycle.remove_item(id).await
    }

    pub async fn process_all(&self, progress: &(dyn Fn(Progress) + Send + Sync)) -> BatchReport {
        let generation = self.settings.read().await.generation.clone();
        self.orchestrator.process_all(&generation, progress).await
    }

    /// Composites one item's result with the current frame and writes it.
    pub async fn download_item(&self, id: &ItemId) -> StudioResult<String> {
        let item = self
            .item(id)
            .await
            .ok_or_else(|| StudioError::not_found(id.to_string()))?;
        let frame = self.settings.read().await.frame.clone();

        let bytes = render_item(&item, frame.as_ref()).await?;
        let name = export_file_name(&self.export.file_prefix, id);
        self.sink.save(&name, &bytes).await?;
        info!("Downloaded {}", name);
        Ok(name)
    }

    pub async fn download_all(&self) -> StudioResult<Vec<String>> {
        let frame = self.settings.read().await.frame.clone();
        self.orchestrator
            .download_all(frame.as_ref(), self.sink.as_ref(), &self.export)
            .await
    }

    pub async fn download_zip(&self) -> StudioResult<String> {
        let frame = self.settings.read().await.frame.clone();
        self.orchestrator
            .download_zip(frame.as_ref(), self.sink.as_ref(), &self.export)
            .await
    }
}
