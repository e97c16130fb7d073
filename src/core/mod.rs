//! Core application types and state management.
//!
//! This module contains the fundamental types used throughout the application:
//! - [`AppState`]: Facade owning the item store, batch settings and export sink
//! - [`ImageItem`]: One uploaded photograph and its generation state machine
//! - [`ItemStore`]: Authoritative, id-addressed item collection
//! - [`BatchSettings`]: Process-wide generation configuration
//! - [`Progress`]: Progress tracking for batch operations

mod config;
mod item;
mod progress;
mod state;
mod store;
mod types;

pub use config::{
    DEFAULT_ARCHIVE_NAME, DEFAULT_DOWNLOAD_DELAY_MS, DEFAULT_FILE_PREFIX, ExportConfig,
    GeneratorConfig, StudioConfig,
};
pub use item::{AttemptOutcome, ImageItem, ItemId, ItemStatus};
pub use progress::{Progress, ProgressType};
pub use state::AppState;
pub use store::ItemStore;
pub use types::{
    AspectRatio, BackgroundOption, BatchSettings, GeneratedImage, GenerationSettings, HexColor,
    SourceImage,
};
