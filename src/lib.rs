//! Region analysis and text layout for unobtrusive photo overlays.
//!
//! The pipeline scores candidate regions of an image against saliency,
//! edge and texture maps, picks the least obtrusive one, fits the text
//! into it (orientation, wrapping, font size) and renders it with an
//! auto-recommended or user-supplied style, optionally behind the
//! subject.

pub mod analysis;
pub mod cli;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod pipeline;
pub mod render;
pub mod style;
pub mod utils;
pub mod vision;

pub use analysis::{
    analyze_regions, select_placement, BBox, BehindSubject, PlacementMap, PlacementOption,
    Position, ScoringWeights,
};
pub use error::OverlayError;
pub use fonts::FontContext;
pub use layout::{choose_optimal_layout, LayoutPolicy, LayoutResult, Orientation, TextMeasure};
pub use pipeline::{OverlayConfig, OverlayEngine, OverlayResult};
pub use render::render_overlay;
pub use style::{recommend_styles, validate_color, StyleOverrides, TextStyleConfig};
pub use vision::{FeatureMap, FeatureMaps};
