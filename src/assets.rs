//! Asset loading with embedded fallbacks.
//!
//! The card logo ships embedded in the binary and can be overridden with a
//! filesystem path. Fonts come from an optional user-supplied directory plus
//! whatever the system provides.

use rust_embed::RustEmbed;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Embedded card assets (logo artwork)
#[derive(RustEmbed)]
#[folder = "assets/"]
#[include = "*.svg"]
struct EmbeddedAssets;

const LOGO_ASSET: &str = "logo.svg";

/// Resolves the logo artwork and the font set used for card text.
#[derive(Debug, Default)]
pub struct AssetStore {
    logo_path: Option<PathBuf>,
    fonts_dir: Option<PathBuf>,
}

impl AssetStore {
    pub fn new(logo_path: Option<PathBuf>, fonts_dir: Option<PathBuf>) -> Self {
        Self {
            logo_path,
            fonts_dir,
        }
    }

    /// Logo SVG bytes: the filesystem override when configured, otherwise the
    /// embedded artwork.
    pub fn logo_svg(&self) -> io::Result<Vec<u8>> {
        if let Some(path) = &self.logo_path {
            let bytes = fs::read(path)?;
            tracing::debug!(path = %path.display(), "Loaded logo override");
            return Ok(bytes);
        }

        EmbeddedAssets::get(LOGO_ASSET)
            .map(|file| file.data.into_owned())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "embedded logo asset missing")
            })
    }

    /// Build the font database for text rendering: fonts from the configured
    /// directory first, system fonts as fallback.
    pub fn font_database(&self) -> fontdb::Database {
        let mut fontdb = fontdb::Database::new();

        if let Some(dir) = &self.fonts_dir {
            fontdb.load_fonts_dir(dir);
            tracing::debug!(dir = %dir.display(), "Loaded fonts directory");
        }

        fontdb.load_system_fonts();

        tracing::info!(font_count = fontdb.len(), "Loaded fonts for card text");

        fontdb
    }
}
