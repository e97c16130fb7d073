use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::core::{
    AttemptOutcome, ExportConfig, GenerationSettings, ImageItem, ItemId, ItemStatus, Progress,
    ProgressType, SourceImage,
};
use crate::processing::archive::{ArchiveEntry, archive};
use crate::processing::compositor::compose_async;
use crate::processing::export::{ExportSink, export_file_name};
use crate::processing::{BatchConfig, ItemLifecycleManager};
use crate::utils::{StudioError, StudioResult};

/// Summary of one `process_all` pass
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Items the pass issued an attempt for
    pub issued: Vec<ItemId>,
    pub completed: usize,
    pub failed: usize,
    /// Attempts whose outcome was dropped (superseded or item removed)
    pub dropped: usize,
}

/// Runs batch generation and batch export over the item store.
#[derive(Clone)]
pub struct BatchOrchestrator {
    lifecycle: ItemLifecycleManager,
    config: BatchConfig,
}

impl BatchOrchestrator {
    pub fn new(lifecycle: ItemLifecycleManager, config: BatchConfig) -> Self {
        debug!("Creating BatchOrchestrator (max concurrency {:?})", config.max_concurrency);
        Self { lifecycle, config }
    }

    /// Issues one attempt for every `Pending` or `Error` item and waits for all
    /// of them to settle. A failing item never cancels its siblings.
    pub async fn process_all(
        &self,
        settings: &GenerationSettings,
        progress: &(dyn Fn(Progress) + Send + Sync),
    ) -> BatchReport {
        let started = self.lifecycle.begin_batch().await;
        let total = started.len();

        if total == 0 {
            debug!("No pending or failed items to process");
            progress(Progress::new(ProgressType::Complete, 0, 0, "nothing to process"));
            return BatchReport::default();
        }

        info!("Processing batch of {} items", total);
        progress(Progress::new(ProgressType::Start, 0, total, "processing"));

        let selected: Vec<ItemId> = started.iter().map(|attempt| attempt.id).collect();
        let limiter = self
            .config
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));
        let settled = AtomicUsize::new(0);

        // Items are already `Processing` here; only the generator call waits
        // for a permit.
        let attempts = started.into_iter().map(|attempt| {
            let limiter = limiter.clone();
            let settled = &settled;
            async move {
                let _permit = match &limiter {
                    Some(semaphore) => semaphore.acquire().await.ok(),
                    None => None,
                };

                let id = attempt.id;
                let outcome = self.lifecycle.resolve_attempt(attempt, settings).await;

                let done = settled.fetch_add(1, Ordering::SeqCst) + 1;
                let update = match outcome {
                    AttemptOutcome::Applied(ItemStatus::Error) => {
                        let message = self
                            .lifecycle
                            .store()
                            .get(&id)
                            .await
                            .and_then(|item| item.error_message().map(str::to_string))
                            .unwrap_or_default();
                        Progress::new(ProgressType::Error, done, total, "failed").with_error(message)
                    }
                    AttemptOutcome::Applied(status) => {
                        Progress::new(ProgressType::Progress, done, total, &status.to_string())
                    }
                    AttemptOutcome::Superseded | AttemptOutcome::Discarded => {
                        Progress::new(ProgressType::Progress, done, total, "dropped")
                    }
                };
                progress(update.for_item(id));

                outcome
            }
        });

        let outcomes = join_all(attempts).await;

        let mut report = BatchReport { issued: selected, ..Default::default() };
        for outcome in outcomes {
            match outcome {
                AttemptOutcome::Applied(ItemStatus::Completed) => report.completed += 1,
                AttemptOutcome::Applied(_) => report.failed += 1,
                AttemptOutcome::Superseded | AttemptOutcome::Discarded => report.dropped += 1,
            }
        }

        if report.failed > 0 {
            warn!(
                "Batch finished with {} failed items out of {}",
                report.failed, total
            );
        } else {
            info!("Batch finished: {} items completed", report.completed);
        }
        progress(Progress::new(ProgressType::Complete, total, total, "complete"));

        report
    }

    /// Composites and writes every exportable item, one at a time in insertion
    /// order, pausing between successive downloads. Stops at the first failure.
    pub async fn download_all(
        &self,
        frame: Option<&SourceImage>,
        sink: &dyn ExportSink,
        export: &ExportConfig,
    ) -> StudioResult<Vec<String>> {
        let items = self.exportable_items().await;
        let delay = export.download_delay();
        info!("Downloading {} items", items.len());

        let mut written = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let name = export_file_name(&export.file_prefix, &item.id());
            let bytes = render_item(item, frame).await.inspect_err(|e| {
                warn!("Download stopped at item {}: {}", item.id(), e);
            })?;
            sink.save(&name, &bytes).await?;
            debug!("Downloaded {} ({}/{})", name, index + 1, items.len());
            written.push(name);
        }

        Ok(written)
    }

    /// Packages every exportable item into one archive and writes it under
    /// the configured archive name.
    pub async fn download_zip(
        &self,
        frame: Option<&SourceImage>,
        sink: &dyn ExportSink,
        export: &ExportConfig,
    ) -> StudioResult<String> {
        let items = self.exportable_items().await;

        let mut entries = Vec::with_capacity(items.len());
        for item in &items {
            let bytes = render_item(item, frame).await?;
            entries.push(ArchiveEntry::new(export_file_name(&export.file_prefix, &item.id()), bytes));
        }

        let packed = tokio::task::spawn_blocking(move || archive(entries))
            .await
            .map_err(|e| StudioError::archive(format!("Archive task panicked: {e}")))??;

        sink.save(&export.archive_name, &packed).await?;
        info!("Wrote archive {} with {} items", export.archive_name, items.len());
        Ok(export.archive_name.clone())
    }

    async fn exportable_items(&self) -> Vec<ImageItem> {
        self.lifecycle
            .store()
            .snapshot()
            .await
            .into_iter()
            .filter(ImageItem::is_exportable)
            .collect()
    }
}

/// Composites an item's current result with the frame, if any.
pub(crate) async fn render_item(item: &ImageItem, frame: Option<&SourceImage>) -> StudioResult<Vec<u8>> {
    let result = item
        .result()
        .ok_or_else(|| StudioError::not_found(format!("No generated image for item {}", item.id())))?;
    compose_async(Arc::clone(&result.bytes), frame.map(|f| Arc::clone(&f.bytes))).await
}
