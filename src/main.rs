use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use colorcard::assets::AssetStore;
use colorcard::extract;
use colorcard::models::{CardState, SizeProfile, SourceImage};
use colorcard::rendering::CardRenderer;
use colorcard::services::{Exporter, ImageSlot};

/// Upload size cap: 10 MiB
const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "colorcard")]
#[command(about = "Turn a photo into a personal Pantone-style color card")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dominant color of an image
    Extract {
        /// Image file (JPEG/PNG/GIF/WebP)
        image: PathBuf,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Render a card to a PNG file
    Render {
        /// Image file (JPEG/PNG/GIF/WebP)
        image: PathBuf,

        /// Name printed on the card
        #[arg(short, long, default_value = "")]
        name: String,

        /// Size profile: "normal", "instagram-post" or "instagram-story"
        #[arg(short, long, default_value = "normal")]
        size: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Extra fonts directory for card text
        #[arg(long)]
        fonts_dir: Option<PathBuf>,

        /// Replacement logo SVG
        #[arg(long)]
        logo: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "colorcard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { image, json } => run_extract(&image, json),
        Commands::Render {
            image,
            name,
            size,
            output,
            fonts_dir,
            logo,
        } => run_render(&image, &name, &size, &output, fonts_dir, logo).await,
    }
}

/// Machine-readable `extract --json` output
#[derive(serde::Serialize)]
struct ExtractReport<'a> {
    color: &'a str,
    width: u32,
    height: u32,
}

fn run_extract(image: &Path, json: bool) -> anyhow::Result<()> {
    let bytes = read_validated(image)?;
    let source = SourceImage::from_bytes(&bytes)?;
    let color = extract::dominant_color(&source)?;

    if json {
        let report = ExtractReport {
            color: color.hex(),
            width: source.width(),
            height: source.height(),
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", color.hex());
    }
    Ok(())
}

async fn run_render(
    image: &Path,
    name: &str,
    size: &str,
    output: &Path,
    fonts_dir: Option<PathBuf>,
    logo: Option<PathBuf>,
) -> anyhow::Result<()> {
    let profile = SizeProfile::by_name(size).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown size profile: {size} (expected \"normal\", \"instagram-post\" or \"instagram-story\")"
        )
    })?;
    let bytes = read_validated(image)?;
    std::fs::create_dir_all(output)
        .with_context(|| format!("Cannot create output directory {}", output.display()))?;

    let state = Arc::new(Mutex::new(CardState::new()));
    {
        let mut card = state.lock().unwrap();
        card.set_name(name);
        card.select_profile(profile);
        card.set_image(Arc::new(ImageSlot::new(bytes.clone())));
    }

    // Informational extraction; failure degrades to the white default and
    // never aborts the export.
    state.lock().unwrap().begin_processing();
    let extracted = tokio::task::spawn_blocking(move || {
        let source = SourceImage::from_bytes(&bytes)?;
        extract::dominant_color(&source)
    })
    .await?;
    {
        let mut card = state.lock().unwrap();
        match extracted {
            Ok(color) => {
                println!("Dominant color: {}", color.hex());
                card.set_dominant_color(color);
            }
            Err(e) => {
                tracing::warn!(%e, "Color extraction failed; falling back to white");
            }
        }
        card.end_processing();
    }

    let assets = AssetStore::new(logo, fonts_dir);
    let renderer = Arc::new(CardRenderer::new(&assets)?);
    let exporter = Exporter::new(renderer, output);

    let outcome = exporter.export(&state, profile).await?;
    if outcome.timed_out {
        tracing::warn!("Image readiness timed out; the card may have shipped incomplete");
    }
    println!("Saved {}", outcome.path.display());
    Ok(())
}

/// Read the upload, enforcing the media-type and size rules.
fn read_validated(path: &Path) -> anyhow::Result<Vec<u8>> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    if metadata.len() > MAX_UPLOAD_BYTES {
        anyhow::bail!(
            "File too large: {} bytes (max {MAX_UPLOAD_BYTES})",
            metadata.len()
        );
    }

    let bytes = std::fs::read(path)?;
    image::guess_format(&bytes)
        .with_context(|| format!("{} is not a supported image", path.display()))?;
    Ok(bytes)
}
