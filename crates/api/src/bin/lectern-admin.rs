//! Operator tooling for transcript maintenance outside the HTTP surface.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lectern_api::state::build_services;
use lectern_config::Settings;
use lectern_db::models::VideoBlock;
use lectern_services::transcripts::{
    TranscriptFormat, TranscriptService, Unrestricted, VideoSource,
    filenames::{html5_id, split_extension},
    service::TranscriptUpload,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Lectern transcript administration", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-download the English YouTube transcript, backing up the current one
    Refetch {
        #[arg(long)]
        locator: String,
    },
    /// Write a stored transcript to stdout
    Export {
        #[arg(long)]
        locator: String,
        /// Transcript id; defaults to the block's current `sub`
        #[arg(long)]
        subs_id: Option<String>,
        #[arg(long, default_value = "srt")]
        format: String,
    },
    /// Upload a transcript file for every source of the block
    Import {
        #[arg(long)]
        locator: String,
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        lang: Option<String>,
    },
}

/// The block's configured sources in the shape the authoring UI sends them.
fn block_videos(item: &VideoBlock) -> Vec<VideoSource> {
    let mut videos = Vec::new();
    if !item.youtube_id_1_0.is_empty() {
        videos.push(VideoSource::youtube(&item.youtube_id_1_0));
    }
    for source in &item.html5_sources {
        let (_, ext) = split_extension(source);
        videos.push(VideoSource::html5(&html5_id(source), &ext.unwrap_or_default()));
    }
    videos
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lectern_services=info,lectern_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let settings = Settings::load()?;
    let services = build_services(&settings).await?;
    let transcripts = TranscriptService::new(services, &settings.transcripts);

    match args.command {
        Command::Refetch { locator } => {
            let outcome = transcripts.refetch(&locator).await?;
            info!(
                youtube_id = %outcome.youtube_id,
                backup = ?outcome.backup,
                "Transcript refetched"
            );
        }
        Command::Export {
            locator,
            subs_id,
            format,
        } => {
            let format = TranscriptFormat::from_extension(&format)?;
            let file = transcripts
                .download(&Unrestricted, &locator, subs_id.as_deref(), format)
                .await?;
            use std::io::Write;
            std::io::stdout().write_all(&file.content)?;
        }
        Command::Import {
            locator,
            file,
            lang,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let item = transcripts.load_item(&locator).await?;
            let subs = transcripts
                .upload(
                    &Unrestricted,
                    TranscriptUpload {
                        locator,
                        language: lang,
                        filename,
                        data,
                        videos: block_videos(&item),
                    },
                )
                .await?;
            info!(%subs, "Transcript imported");
        }
    }

    Ok(())
}
