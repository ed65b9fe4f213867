use thiserror::Error;

/// Errors surfaced by the analysis and styling stages.
///
/// Per-candidate region failures (empty or degenerate slices) are not
/// errors: they are represented as absent entries in the placement map.
/// Only requests that cannot be satisfied at all end up here.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// A caller-supplied box has non-positive width/height after clipping,
    /// or lies entirely outside the image bounds.
    #[error("invalid box {0:?}: empty after clipping to {1}x{2}")]
    InvalidBox((i64, i64, i64, i64), u32, u32),

    /// No valid placement option exists for the requested position.
    #[error("no placement option available for position '{0}'")]
    PlacementNotFound(String),

    /// An unrecognized color name was supplied where a curated palette
    /// lookup was required.
    #[error("unrecognized color name '{0}'")]
    InvalidColor(String),

    /// A supplied style mapping is missing required fields or carries
    /// out-of-range values.
    #[error("invalid style configuration: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
