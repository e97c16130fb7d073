//! Item lifecycle manager: mediates generation attempts for stored items.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::{AttemptOutcome, GenerationSettings, ImageItem, ItemId, ItemStore, SourceImage};
use crate::processing::StudioGenerator;
use crate::utils::{StudioError, StudioResult};

/// Drives the per-item state machine against the generation service.
///
/// Attempts only ever touch their own item, looked up by id when the attempt
/// starts and again when it resolves.
#[derive(Clone)]
pub struct ItemLifecycleManager {
    store: ItemStore,
    generator: Arc<dyn StudioGenerator>,
}

impl ItemLifecycleManager {
    pub fn new(store: ItemStore, generator: Arc<dyn StudioGenerator>) -> Self {
        Self { store, generator }
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    /// Creates a `Pending` item for an uploaded image.
    pub async fn add_item(&self, source: SourceImage) -> ItemId {
        let id = self.store.insert(ImageItem::new(source)).await;
        debug!("Added item {}", id);
        id
    }

    /// Removes an item whatever its status. An attempt still in flight for it
    /// resolves into [`AttemptOutcome::Discarded`].
    pub async fn remove_item(&self, id: &ItemId) -> bool {
        let removed = self.store.remove(id).await;
        match &removed {
            Some(item) => debug!("Removed item {} ({})", id, item.status()),
            None => debug!("Remove ignored, no item {}", id),
        }
        removed.is_some()
    }

    /// Runs one generation attempt for `id` with the given settings snapshot.
    ///
    /// Only an unknown id is returned as an error. Generation failures are
    /// stored on the item and reported through the outcome.
    pub async fn issue_generation(
        &self,
        id: &ItemId,
        settings: &GenerationSettings,
    ) -> StudioResult<AttemptOutcome> {
        let started = self
            .store
            .update(id, StartedAttempt::begin)
            .await
            .ok_or_else(|| StudioError::not_found(id.to_string()))?;

        Ok(self.resolve_attempt(started, settings).await)
    }

    /// Moves every `Pending` or `Error` item to `Processing` under one store
    /// lock, so a concurrent pass cannot pick the same items up again.
    pub async fn begin_batch(&self) -> Vec<StartedAttempt> {
        self.store
            .update_where(
                |item| item.status().is_eligible_for_batch(),
                StartedAttempt::begin,
            )
            .await
    }

    /// Calls the generator for an attempt that has already begun and records
    /// its outcome on the item.
    pub async fn resolve_attempt(
        &self,
        started: StartedAttempt,
        settings: &GenerationSettings,
    ) -> AttemptOutcome {
        let StartedAttempt { id, attempt, source } = started;

        debug!(
            "Item {} attempt {} started (ratio {}, background {})",
            id,
            attempt,
            settings.aspect_ratio,
            settings.background.as_ref().map(|b| b.as_hint()).unwrap_or_else(|| "default".to_string())
        );

        let generated = self.generator.generate(&source, settings).await;

        let outcome = match generated {
            Ok(result) => {
                let size = result.bytes.len();
                self.store
                    .update(&id, |item| item.resolve_success(attempt, result))
                    .await
                    .inspect(|_| info!("Item {} attempt {} produced {} bytes", id, attempt, size))
            }
            Err(e) => {
                let message = e.item_message();
                warn!("Item {} attempt {} failed: {}", id, attempt, message);
                self.store
                    .update(&id, |item| item.resolve_failure(attempt, message))
                    .await
            }
        };

        match outcome {
            Some(AttemptOutcome::Superseded) => {
                debug!("Item {} attempt {} superseded by a newer attempt", id, attempt);
                AttemptOutcome::Superseded
            }
            Some(applied) => applied,
            None => {
                debug!("Item {} was removed during attempt {}, result dropped", id, attempt);
                AttemptOutcome::Discarded
            }
        }
    }
}

/// An attempt that has entered `Processing` but not yet called the generator.
#[derive(Debug, Clone)]
pub struct StartedAttempt {
    pub id: ItemId,
    pub attempt: u64,
    source: SourceImage,
}

impl StartedAttempt {
    fn begin(item: &mut ImageItem) -> Self {
        Self {
            id: item.id(),
            attempt: item.begin_attempt(),
            source: item.source().clone(),
        }
    }
}
