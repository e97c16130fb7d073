use std::path::PathBuf;
use anyhow::Context as _;
use clap::Args;
use tracing::info;

use crate::core::{DEFAULT_ARCHIVE_NAME, DEFAULT_FILE_PREFIX};
use crate::processing::{ArchiveEntry, DirectorySink, ExportSink, archive, compose_async};
use crate::utils::{extract_stem, read_upload};

#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Images to frame.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Frame overlay, stretched onto each image.
    #[arg(long)]
    pub frame: PathBuf,

    /// Output directory.
    #[arg(long)]
    pub out: PathBuf,

    /// Write one archive instead of individual files.
    #[arg(long, default_value_t = false)]
    pub zip: bool,
}

/// Applies a frame to existing images without generation.
pub async fn compose(args: ComposeArgs) -> anyhow::Result<()> {
    let frame = read_upload(&args.frame)
        .await
        .with_context(|| format!("loading frame {}", args.frame.display()))?;
    let sink = DirectorySink::new(&args.out);

    let mut entries = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let source = read_upload(path).await?;
        let bytes = compose_async(source.bytes, Some(frame.bytes.clone()))
            .await
            .with_context(|| format!("framing {}", path.display()))?;
        let name = format!("{}-{}.png", DEFAULT_FILE_PREFIX, extract_stem(path));

        if args.zip {
            entries.push(ArchiveEntry::new(name, bytes));
        } else {
            sink.save(&name, &bytes).await?;
            info!("Wrote {}", name);
        }
    }

    if args.zip {
        let packed = archive(entries)?;
        sink.save(DEFAULT_ARCHIVE_NAME, &packed).await?;
        info!("Wrote {}", sink.dir().join(DEFAULT_ARCHIVE_NAME).display());
    }
    Ok(())
}
