//! Studio configuration loaded from a JSON file.
//!
//! Every section is optional in the file; missing values fall back to the
//! defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::core::GenerationSettings;
use crate::processing::BatchConfig;
use crate::utils::{StudioError, StudioResult, validate_config};

/// Default prefix of exported file names
pub const DEFAULT_FILE_PREFIX: &str = "studio-gen";
/// Default name of the batch archive
pub const DEFAULT_ARCHIVE_NAME: &str = "studio-gen-batch.zip";
/// Pause between successive downloads of a sequential batch export
pub const DEFAULT_DOWNLOAD_DELAY_MS: u64 = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudioConfig {
    pub generation: GenerationSettings,
    pub generator: GeneratorConfig,
    pub batch: BatchConfig,
    pub export: ExportConfig,
}

/// External program that performs the studio transformation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Executable to spawn per attempt
    pub program: Option<PathBuf>,
    /// Extra arguments placed before the generation hints
    pub args: Vec<String>,
    /// Upper bound for one attempt; unbounded when absent
    pub timeout_secs: Option<u64>,
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Naming and pacing of exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    pub file_prefix: String,
    pub archive_name: String,
    pub download_delay_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            download_delay_ms: DEFAULT_DOWNLOAD_DELAY_MS,
        }
    }
}

impl ExportConfig {
    pub fn download_delay(&self) -> Duration {
        Duration::from_millis(self.download_delay_ms)
    }
}

impl StudioConfig {
    /// Loads and validates a configuration file.
    pub async fn load(path: impl AsRef<Path>) -> StudioResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StudioError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config = Self::from_json(&raw)
            .map_err(|e| StudioError::config(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(raw: &str) -> StudioResult<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| StudioError::config(format!("Invalid config: {e}")))?;
        validate_config(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AspectRatio, BackgroundOption};

    #[test]
    fn empty_object_yields_defaults() {
        let config = StudioConfig::from_json("{}").unwrap();
        assert_eq!(config.export.file_prefix, DEFAULT_FILE_PREFIX);
        assert_eq!(config.export.archive_name, DEFAULT_ARCHIVE_NAME);
        assert_eq!(config.export.download_delay(), Duration::from_millis(200));
        assert_eq!(config.batch.max_concurrency, None);
        assert!(config.generator.program.is_none());
    }

    #[test]
    fn parses_full_config() {
        let raw = r#"{
            "generation": { "aspectRatio": "16:9", "background": "transparent", "promptModifier": "marble table" },
            "generator": { "program": "/usr/local/bin/studio-sidecar", "args": ["--model", "pro"], "timeoutSecs": 90 },
            "batch": { "maxConcurrency": 4 },
            "export": { "filePrefix": "shop", "archiveName": "shop.zip", "downloadDelayMs": 350 }
        }"#;
        let config = StudioConfig::from_json(raw).unwrap();

        assert_eq!(config.generation.aspect_ratio, AspectRatio::Widescreen);
        assert_eq!(config.generation.background, Some(BackgroundOption::Transparent));
        assert_eq!(config.generator.args, vec!["--model", "pro"]);
        assert_eq!(config.generator.timeout(), Some(Duration::from_secs(90)));
        assert_eq!(config.batch.max_concurrency, Some(4));
        assert_eq!(config.export.file_prefix, "shop");
        assert_eq!(config.export.download_delay_ms, 350);
    }

    #[test]
    fn invalid_values_are_config_or_validation_errors() {
        assert!(matches!(
            StudioConfig::from_json(r#"{"generation":{"aspectRatio":"5:4"}}"#),
            Err(StudioError::Config(_))
        ));
        assert!(matches!(
            StudioConfig::from_json(r#"{"batch":{"maxConcurrency":0}}"#),
            Err(StudioError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let err = StudioConfig::load("/no/such/studio.json").await.unwrap_err();
        assert!(matches!(err, StudioError::Config(_)));
    }
}
