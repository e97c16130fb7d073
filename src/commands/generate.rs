use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context as _, bail};
use clap::Args;
use tracing::{debug, info, warn};

use crate::core::{
    AppState, AspectRatio, BackgroundOption, ItemStatus, Progress, ProgressType, StudioConfig,
};
use crate::processing::{DirectorySink, SidecarGenerator};
use crate::utils::validate_config;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Product photos to transform (JPEG, PNG or WebP).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output directory.
    #[arg(long)]
    pub out: PathBuf,

    /// Aspect ratio of the generated images (1:1, 3:4, 4:3, 9:16, 16:9).
    #[arg(long)]
    pub ratio: Option<AspectRatio>,

    /// Background: white, black, gray, green, transparent or a #hex color.
    #[arg(long)]
    pub background: Option<BackgroundOption>,

    /// Extra instructions appended to the studio prompt.
    #[arg(long)]
    pub prompt: Option<String>,

    /// Frame overlay composited onto every export.
    #[arg(long)]
    pub frame: Option<PathBuf>,

    /// Write one archive instead of individual files.
    #[arg(long, default_value_t = false)]
    pub zip: bool,

    /// Generator program (overrides the config file).
    #[arg(long)]
    pub generator: Option<PathBuf>,

    /// Extra argument for the generator program (repeatable).
    #[arg(long = "generator-arg", allow_hyphen_values = true)]
    pub generator_args: Vec<String>,

    /// JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl GenerateArgs {
    /// Loads the config file, if any, and applies flag overrides.
    pub async fn resolve_config(&self) -> anyhow::Result<StudioConfig> {
        let mut config = match &self.config {
            Some(path) => StudioConfig::load(path).await?,
            None => StudioConfig::default(),
        };

        if let Some(ratio) = self.ratio {
            config.generation.aspect_ratio = ratio;
        }
        if let Some(background) = &self.background {
            config.generation.background = Some(background.clone());
        }
        if let Some(prompt) = &self.prompt {
            config.generation.prompt_modifier = Some(prompt.clone());
        }
        if let Some(program) = &self.generator {
            config.generator.program = Some(program.clone());
            config.generator.args = self.generator_args.clone();
        } else if !self.generator_args.is_empty() {
            config.generator.args.extend(self.generator_args.iter().cloned());
        }

        validate_config(&config)?;
        Ok(config)
    }
}

pub async fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let config = args.resolve_config().await?;
    let generator = SidecarGenerator::from_config(&config.generator)
        .context("pass --generator or set generator.program in the config file")?;

    let state = AppState::new(
        &config,
        Arc::new(generator),
        Arc::new(DirectorySink::new(&args.out)),
    );

    if let Some(frame) = &args.frame {
        state
            .set_frame(frame)
            .await
            .with_context(|| format!("loading frame {}", frame.display()))?;
    }

    let ids = state.upload_files(&args.files).await.context("reading uploads")?;
    info!("Generating {} images ({})", ids.len(), config.generation.aspect_ratio);

    let report = state.process_all(&log_progress).await;

    for item in state.items().await {
        match item.status() {
            ItemStatus::Completed => debug!("{}: completed", item.id()),
            status => warn!(
                "{}: {} ({})",
                item.source().file_name.as_deref().unwrap_or("upload"),
                status,
                item.error_message().unwrap_or("no details")
            ),
        }
    }

    if report.completed > 0 {
        if args.zip {
            let name = state.download_zip().await.context("writing archive")?;
            info!("Wrote {}", args.out.join(name).display());
        } else {
            let written = state.download_all().await.context("writing images")?;
            info!("Wrote {} images to {}", written.len(), args.out.display());
        }
    }

    if report.failed > 0 {
        bail!("{} of {} images failed to generate", report.failed, report.issued.len());
    }
    Ok(())
}

fn log_progress(progress: Progress) {
    match progress.progress_type {
        ProgressType::Start => info!("Started {} attempts", progress.total_tasks),
        ProgressType::Progress => debug!(
            "{}/{} ({}%) {}",
            progress.completed_tasks, progress.total_tasks, progress.progress_percentage, progress.status
        ),
        ProgressType::Error => warn!(
            "{}/{} failed: {}",
            progress.completed_tasks,
            progress.total_tasks,
            progress.error.as_deref().unwrap_or_default()
        ),
        ProgressType::Complete => info!("All {} attempts settled", progress.total_tasks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: GenerateArgs,
    }

    fn parse(argv: &[&str]) -> GenerateArgs {
        Harness::try_parse_from(std::iter::once("studio-gen").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[tokio::test]
    async fn flags_override_defaults() {
        let args = parse(&[
            "a.png", "b.jpg",
            "--out", "exports",
            "--ratio", "9:16",
            "--background", "#ABC",
            "--prompt", "on linen",
            "--generator", "/bin/sidecar",
            "--generator-arg", "--model",
            "--generator-arg", "fast",
        ]);
        let config = args.resolve_config().await.unwrap();

        assert_eq!(args.files.len(), 2);
        assert_eq!(config.generation.aspect_ratio, AspectRatio::Story);
        assert_eq!(config.generation.background.unwrap().as_hint(), "#aabbcc");
        assert_eq!(config.generation.prompt_modifier.as_deref(), Some("on linen"));
        assert_eq!(config.generator.program, Some(PathBuf::from("/bin/sidecar")));
        assert_eq!(config.generator.args, vec!["--model", "fast"]);
    }

    #[test]
    fn rejects_unknown_ratio() {
        let parsed = Harness::try_parse_from(["studio-gen", "a.png", "--out", "x", "--ratio", "2:1"]);
        assert!(parsed.is_err());
    }
}
