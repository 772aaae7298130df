//! Upload CLI for a pixconv server.
//!
//! Converts the given JPEGs one request per file, writes each result to
//! `--out-dir`, and with `--zip` also fetches the bundled archive.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pixconv_client::{
    ClientEvent, ClientFile, ClientOrchestrator, FileStatus, HttpTransport, TransportConfig,
};
use pixconv_core::TargetFormat;

#[derive(Parser, Debug)]
#[command(
    name = "pixconv-upload",
    version,
    about = "Convert JPEG images on a pixconv server"
)]
struct Cli {
    /// JPEG files to convert.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Base URL of the server.
    #[arg(long, env = "PIXCONV_SERVER", default_value = "http://localhost:3000")]
    server: String,

    /// Target format: png, webp, gif or tiff.
    #[arg(short, long, default_value = "png", value_parser = parse_format)]
    format: TargetFormat,

    /// Directory converted files are written to.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Also download every converted file as one ZIP archive to this path.
    #[arg(long)]
    zip: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "PIXCONV_TIMEOUT_SECS", default_value_t = 120)]
    timeout_secs: u64,
}

fn parse_format(value: &str) -> Result<TargetFormat, String> {
    TargetFormat::from_str(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let transport = HttpTransport::new(
        TransportConfig::new(&cli.server).with_timeout_secs(cli.timeout_secs),
    )
    .context("Failed to create HTTP client")?;
    let orchestrator = ClientOrchestrator::new(Arc::new(transport));

    let mut files = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let file = ClientFile::from_path(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))?;
        if !file.is_jpeg() {
            warn!("Skipping {:?}: not a JPEG", path);
        }
        files.push(file);
    }

    let added = orchestrator.add_files(files).await;
    if added.is_empty() {
        bail!("No JPEG files to convert");
    }

    let mut events = orchestrator.subscribe();
    let progress = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let ClientEvent::StatusChanged { key, status } = event {
                match status {
                    FileStatus::Converting => info!("{}: converting", key),
                    FileStatus::Success => info!("{}: done", key),
                    FileStatus::Error => warn!("{}: failed", key),
                    FileStatus::Pending => {}
                }
            }
        }
    });

    let summary = orchestrator.convert_all(cli.format).await?;
    info!(
        "Converted {} of {} files",
        summary.succeeded,
        summary.succeeded + summary.failed
    );

    tokio::fs::create_dir_all(&cli.out_dir)
        .await
        .with_context(|| format!("Failed to create {:?}", cli.out_dir))?;

    for tracked in orchestrator.files().await {
        match (&tracked.status, &tracked.converted, &tracked.error) {
            (FileStatus::Success, Some(converted), _) => {
                let path = cli.out_dir.join(&converted.file_name);
                write_file(&path, &converted.bytes).await?;
                println!("{} -> {}", tracked.file.name, path.display());
            }
            (_, _, Some(error)) => {
                eprintln!("{}: {}", tracked.file.name, error);
            }
            _ => {}
        }
    }

    if let Some(zip_path) = &cli.zip {
        if summary.succeeded == 0 {
            warn!("Nothing converted, skipping archive");
        } else {
            let download = orchestrator.download_all(cli.format).await?;
            write_file(zip_path, &download.bytes).await?;
            println!("{} -> {}", download.file_name, zip_path.display());
        }
    }

    drop(orchestrator);
    let _ = progress.await;

    if summary.failed > 0 {
        bail!("{} file(s) failed to convert", summary.failed);
    }
    Ok(())
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {:?}", path))
}
