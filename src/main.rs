// This is the primary entry point for the studio-gen command line.
// The lib.rs file serves as the public API; commands live there.

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use studio_gen_lib::commands::{ComposeArgs, GenerateArgs, compose, generate};

const DEFAULT_LOG_FILTER: &str = "studio_gen_lib=debug,studio_gen=debug,info";

#[derive(Parser, Debug)]
#[command(name = "studio-gen", version)]
#[command(about = "Turn product photos into studio shots, then frame and export them")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate studio images and export them.
    Generate(GenerateArgs),
    /// Apply a frame to existing images without generation.
    Compose(ComposeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)         // Remove file path
        .with_line_number(false)  // Remove line numbers
        .with_thread_ids(false)   // Remove thread IDs
        .with_thread_names(false) // Remove thread names
        .with_target(false)       // Remove module path
        .with_ansi(true)          // Keep colored output
        .with_writer(std::io::stdout)
        .compact()                // Use compact formatter instead of pretty
        .init();

    let cli = Cli::parse();
    info!("=== studio-gen {} ===", env!("CARGO_PKG_VERSION"));

    match cli.cmd {
        Command::Generate(args) => generate(args).await,
        Command::Compose(args) => compose(args).await,
    }
}
