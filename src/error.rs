use thiserror::Error;

/// Errors from the dominant-color extraction pass.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("No scratch drawing surface available")]
    RenderingUnavailable,

    #[error("Image failed to load")]
    ImageLoadFailed,
}

/// Errors from compositing and encoding the card bitmap.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to allocate pixmap")]
    PixmapAllocation,

    #[error("SVG parse error: {0}")]
    SvgParse(String),

    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("An export is already in progress for this card")]
    ExportInProgress,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image failed to load")]
    ImageLoadFailed,

    #[error("Compositing error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
