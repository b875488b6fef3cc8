//! Command-line front end for the image generation engine

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use engine::{EngineConfig, GenerationRequest, Orchestrator};

#[derive(Parser)]
#[command(name = "studio")]
#[command(about = "Generate or edit images through the multi-backend engine")]
struct Args {
    /// Prompt describing the image, or the edit to apply
    #[arg(long)]
    prompt: String,

    /// Source image to edit; switches from generation to editing
    #[arg(long)]
    image: Option<PathBuf>,

    /// Output file (default: generated-<timestamp>.<ext>)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Verbose engine logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = EngineConfig::from_env();
    let orchestrator = Orchestrator::from_config(&config)
        .await
        .context("engine startup failed")?;

    let request = match &args.image {
        Some(path) => {
            let source = fs::read(path)
                .with_context(|| format!("failed to read source image {}", path.display()))?;
            GenerationRequest::edit(args.prompt.as_str(), source)?
        }
        None => GenerationRequest::generate(args.prompt.as_str())?,
    };

    tracing::info!("🎨 {} request: \"{}\"", request.mode(), request.prompt());

    match orchestrator.dispatch(&request).await {
        Ok(image) => {
            let out = args
                .out
                .unwrap_or_else(|| default_output_path(&image.mime_type));
            fs::write(&out, &image.bytes)
                .with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!(
                "✅ Saved {} ({}x{}, {} bytes, backend: {})",
                out.display(),
                image.width,
                image.height,
                image.bytes.len(),
                image.backend
            );
            Ok(())
        }
        Err(err) => {
            tracing::error!("❌ {err}");
            process::exit(1);
        }
    }
}

fn default_output_path(mime_type: &str) -> PathBuf {
    let extension = match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "img",
    };
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    PathBuf::from(format!("generated-{timestamp}.{extension}"))
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose {
        "studio=debug,engine=debug"
    } else {
        "studio=info,engine=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
