mod config;
mod processor;

pub use config::BatchConfig;
pub use processor::{BatchOrchestrator, BatchReport};
pub(crate) use processor::render_item;
