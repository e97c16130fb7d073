pub mod archive;
pub mod batch;
pub mod compositor;
pub mod export;
mod generator;
mod lifecycle;
mod sidecar;

pub use archive::{ArchiveEntry, archive};
pub use batch::{BatchConfig, BatchOrchestrator, BatchReport};
pub use compositor::{compose, compose_async};
pub use export::{DirectorySink, ExportSink, export_file_name};
pub use generator::{FsSourceLoader, SourceLoader, StudioGenerator};
pub use lifecycle::{ItemLifecycleManager, StartedAttempt};
pub use sidecar::{STUDIO_PROMPT, SidecarGenerator};
