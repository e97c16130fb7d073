//! Deterministic fakes shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tokio::sync::{Barrier, oneshot};
use tokio::time::Instant;

use studio_gen_lib::core::{GeneratedImage, GenerationSettings, SourceImage, StudioConfig};
use studio_gen_lib::processing::{ExportSink, SourceLoader, StudioGenerator};
use studio_gen_lib::{AppState, StudioError, StudioResult};

pub fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

pub fn source(name: &str) -> SourceImage {
    SourceImage::new(png(8, 6, [120, 120, 120, 255]), "image/png").with_file_name(name)
}

/// One scripted generator answer.
pub struct Step {
    outcome: Result<Vec<u8>, String>,
    release: Option<oneshot::Receiver<()>>,
}

impl Step {
    pub fn ok(bytes: Vec<u8>) -> Self {
        Self { outcome: Ok(bytes), release: None }
    }

    pub fn fail(message: &str) -> Self {
        Self { outcome: Err(message.to_string()), release: None }
    }

    /// Holds the answer until the returned sender fires.
    pub fn held(mut self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        self.release = Some(rx);
        (self, tx)
    }
}

/// Generator answering from per-file scripts; unscripted calls succeed with a
/// small red PNG.
#[derive(Default)]
pub struct FakeGenerator {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    barrier: Option<Arc<Barrier>>,
    hold_for: Option<std::time::Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    seen: Mutex<Vec<GenerationSettings>>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call waits until `parties` calls are in flight at once.
    pub fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Every call takes `duration` before answering.
    pub fn with_latency(mut self, duration: std::time::Duration) -> Self {
        self.hold_for = Some(duration);
        self
    }

    pub fn script(self, file_name: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(file_name.to_string(), steps.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn seen_settings(&self) -> Vec<GenerationSettings> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl StudioGenerator for FakeGenerator {
    async fn generate(
        &self,
        source: &SourceImage,
        settings: &GenerationSettings,
    ) -> StudioResult<GeneratedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(settings.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let step = source
            .file_name
            .as_ref()
            .and_then(|name| self.scripts.lock().unwrap().get_mut(name)?.pop_front());

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(duration) = self.hold_for {
            tokio::time::sleep(duration).await;
        }

        let outcome = match step {
            Some(Step { outcome, release }) => {
                if let Some(release) = release {
                    let _ = release.await;
                }
                outcome
            }
            None => Ok(png(8, 6, [255, 0, 0, 255])),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
            .map(|bytes| GeneratedImage::new(bytes, "image/png"))
            .map_err(StudioError::generation)
    }
}

/// Sink remembering every write and when it happened.
#[derive(Default)]
pub struct RecordingSink {
    writes: Mutex<Vec<(String, Vec<u8>, Instant)>>,
}

impl RecordingSink {
    pub fn names(&self) -> Vec<String> {
        self.writes.lock().unwrap().iter().map(|(name, _, _)| name.clone()).collect()
    }

    pub fn bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, bytes, _)| bytes.clone())
    }

    pub fn times(&self) -> Vec<Instant> {
        self.writes.lock().unwrap().iter().map(|(_, _, at)| *at).collect()
    }
}

#[async_trait]
impl ExportSink for RecordingSink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> StudioResult<()> {
        self.writes
            .lock()
            .unwrap()
            .push((file_name.to_string(), bytes.to_vec(), Instant::now()));
        Ok(())
    }
}

pub fn state_with(generator: Arc<FakeGenerator>, sink: Arc<RecordingSink>) -> AppState {
    AppState::new(&StudioConfig::default(), generator, sink)
}

/// Loader serving uploads from memory; unknown paths fail like unreadable
/// files.
#[derive(Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, SourceImage>,
    loads: AtomicUsize,
}

impl MemoryLoader {
    pub fn with(mut self, path: &str, image: SourceImage) -> Self {
        self.files.insert(PathBuf::from(path), image);
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceLoader for MemoryLoader {
    async fn load(&self, path: &Path) -> StudioResult<SourceImage> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| StudioError::upload(format!("{}: unreadable", path.display())))
    }
}
