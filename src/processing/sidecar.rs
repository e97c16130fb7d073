//! Generation through an external sidecar program.
//!
//! The sidecar receives the source image on stdin and the generation hints as
//! arguments, and answers with the generated image on stdout. Anything written
//! to stderr by a failing sidecar becomes the item's error message.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::core::{GeneratedImage, GenerationSettings, GeneratorConfig, SourceImage};
use crate::processing::StudioGenerator;
use crate::utils::{StudioError, StudioResult, mime_for_output};

/// Instructions sent with every attempt; the prompt modifier is appended.
pub const STUDIO_PROMPT: &str = "Turn this product photo into a polished studio shot: \
soft even lighting, no background clutter, light color correction and a clean modern \
look for an online catalog. Preserve the product's shape, texture and true colors.";

#[derive(Debug, Clone)]
pub struct SidecarGenerator {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl SidecarGenerator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> StudioResult<Self> {
        let program = config.program.clone().ok_or_else(|| {
            StudioError::validation("No generator program configured")
        })?;

        Ok(Self {
            program,
            args: config.args.clone(),
            timeout: config.timeout(),
        })
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Full argument list for one attempt: configured args, then the hints.
    pub fn build_args(&self, source: &SourceImage, settings: &GenerationSettings) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--mime-type".to_string());
        args.push(source.mime_type.clone());
        args.push("--aspect-ratio".to_string());
        args.push(settings.aspect_ratio.as_str().to_string());
        if let Some(background) = &settings.background {
            args.push("--background".to_string());
            args.push(background.as_hint());
        }
        args.push("--prompt".to_string());
        args.push(match settings.prompt_modifier.as_deref().map(str::trim) {
            Some(modifier) if !modifier.is_empty() => format!("{STUDIO_PROMPT} {modifier}"),
            _ => STUDIO_PROMPT.to_string(),
        });
        args
    }

    async fn run(&self, source: &SourceImage, settings: &GenerationSettings) -> StudioResult<GeneratedImage> {
        let mut child = Command::new(&self.program)
            .args(self.build_args(source, settings))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| StudioError::generation(format!(
                "Failed to start generator {}: {}", self.program.display(), e
            )))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| StudioError::generation("Generator stdin unavailable"))?;

        // Feed stdin from its own task so a sidecar that streams output while
        // still reading input cannot deadlock against us.
        let bytes = Arc::clone(&source.bytes);
        let writer = tokio::spawn(async move {
            let written = stdin.write_all(&bytes).await;
            drop(stdin);
            written
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| StudioError::generation(format!("Generator did not finish: {e}")))?;

        match writer.await {
            Ok(Err(e)) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                warn!("Failed to send image to generator: {}", e);
            }
            Err(e) => warn!("Generator input task failed: {}", e),
            _ => {}
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!("Generator failed ({}): {}", output.status, stderr);
            return Err(StudioError::generation(if stderr.is_empty() {
                format!("Generator exited with {}", output.status)
            } else {
                stderr
            }));
        }

        if output.stdout.is_empty() {
            return Err(StudioError::generation("No image data received from generator"));
        }

        let mime_type = mime_for_output(&output.stdout);
        debug!("Generator returned {} bytes ({})", output.stdout.len(), mime_type);
        Ok(GeneratedImage::new(output.stdout, mime_type))
    }
}

#[async_trait]
impl StudioGenerator for SidecarGenerator {
    async fn generate(
        &self,
        source: &SourceImage,
        settings: &GenerationSettings,
    ) -> StudioResult<GeneratedImage> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(source, settings))
                .await
                .map_err(|_| StudioError::generation(format!(
                    "Generator timed out after {}s", limit.as_secs_f32()
                )))?,
            None => self.run(source, settings).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AspectRatio, BackgroundOption};

    fn source() -> SourceImage {
        SourceImage::new(b"fake-jpeg-bytes".to_vec(), "image/jpeg")
    }

    #[test]
    fn args_carry_every_hint() {
        let generator = SidecarGenerator::new("studio-sidecar").with_args(["--model", "pro"]);
        let settings = GenerationSettings {
            aspect_ratio: AspectRatio::Portrait,
            background: Some(BackgroundOption::Transparent),
            prompt_modifier: Some("on a marble slab".to_string()),
        };

        let args = generator.build_args(&source(), &settings);
        assert_eq!(&args[..8], &[
            "--model", "pro",
            "--mime-type", "image/jpeg",
            "--aspect-ratio", "3:4",
            "--background", "transparent",
        ]);
        assert_eq!(args[8], "--prompt");
        assert!(args[9].starts_with(STUDIO_PROMPT));
        assert!(args[9].ends_with("on a marble slab"));
    }

    #[test]
    fn background_flag_is_omitted_when_unset() {
        let args = SidecarGenerator::new("x").build_args(&source(), &GenerationSettings::default());
        assert!(!args.iter().any(|a| a == "--background"));
        assert_eq!(args.last().map(String::as_str), Some(STUDIO_PROMPT));
    }

    #[test]
    fn from_config_requires_program() {
        assert!(SidecarGenerator::from_config(&GeneratorConfig::default()).is_err());
    }

    #[cfg(unix)]
    fn shell(script: &str) -> SidecarGenerator {
        SidecarGenerator::new("sh").with_args(["-c", script, "sh"])
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn echoes_stdout_as_result() {
        let result = shell("cat")
            .generate(&source(), &GenerationSettings::default())
            .await
            .unwrap();
        assert_eq!(result.bytes.as_slice(), b"fake-jpeg-bytes");
        assert_eq!(result.mime_type, "image/png");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stderr_becomes_generation_error() {
        let err = shell("cat >/dev/null; echo 'quota exceeded' >&2; exit 3")
            .generate(&source(), &GenerationSettings::default())
            .await
            .unwrap_err();
        match err {
            StudioError::Generation(msg) => assert_eq!(msg, "quota exceeded"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn empty_output_is_an_error() {
        let err = shell("cat >/dev/null")
            .generate(&source(), &GenerationSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Generation(msg) if msg.contains("No image data")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_is_an_error() {
        let err = shell("sleep 5")
            .with_timeout(Duration::from_millis(100))
            .generate(&source(), &GenerationSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Generation(msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let err = SidecarGenerator::new("/definitely/not/a/generator")
            .generate(&source(), &GenerationSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Generation(_)));
    }
}
