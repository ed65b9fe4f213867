use image::RgbImage;
use serde::Serialize;

use crate::analysis::regions::{BBox, Position};
use crate::vision::FeatureMaps;

/// Tunable weights for the region suitability score.
///
/// The score must stay monotone: raising mean saliency, edge density or
/// variance never raises it, and more area (up to `comfort_area_fraction`
/// of the image) never lowers it. Keep that property when retuning.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    /// Weight of the low-saliency term (avoid occluding the subject).
    pub saliency: f32,
    /// Weight of the low-edge-density term (avoid fine detail).
    pub edge: f32,
    /// Weight of the low-variance term (prefer flat background).
    pub variance: f32,
    /// Weight of the size-adequacy term.
    pub area: f32,
    /// Fraction of the image area at which the size reward saturates.
    pub comfort_area_fraction: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            saliency: 0.5,
            edge: 0.2,
            variance: 0.2,
            area: 0.1,
            comfort_area_fraction: 0.2,
        }
    }
}

/// A scored candidate region with its background statistics.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementOption {
    pub position: Position,
    pub bbox: BBox,
    pub bg_color: [u8; 3],
    pub score: f32,
    pub mean_saliency: f32,
    pub mean_edge: f32,
    pub mean_variance: f32,
    pub recommended_font_size: u32,
}

/// Score one candidate box against the feature maps.
///
/// Returns `None` when the slice is empty or does not line up with the
/// maps; a well-formed non-empty box always produces an option.
pub fn score_region(
    img: &RgbImage,
    maps: &FeatureMaps,
    position: Position,
    bbox: BBox,
    weights: &ScoringWeights,
) -> Option<PlacementOption> {
    let mean_saliency = maps.saliency.mean_over(&bbox)?;
    let mean_edge = maps.edge.mean_over(&bbox)?;
    let mean_variance = maps.variance.mean_over(&bbox)?;
    let bg_color = mean_color(img, &bbox)?;

    let image_area = img.width() as u64 * img.height() as u64;
    let score = suitability_score(
        mean_saliency,
        mean_edge,
        mean_variance,
        bbox.area(),
        image_area,
        weights,
    );

    Some(PlacementOption {
        position,
        bbox,
        bg_color,
        score,
        mean_saliency,
        mean_edge,
        mean_variance,
        recommended_font_size: recommended_font_size(&bbox, img.width(), img.height()),
    })
}

/// The weighted suitability heuristic.
///
/// Each penalty term maps its statistic through a strictly decreasing
/// curve, so the monotonicity contract holds by construction.
pub(crate) fn suitability_score(
    mean_saliency: f32,
    mean_edge: f32,
    mean_variance: f32,
    region_area: u64,
    image_area: u64,
    weights: &ScoringWeights,
) -> f32 {
    let saliency_term = 1.0 - mean_saliency.clamp(0.0, 1.0);
    let edge_term = 1.0 / (1.0 + 8.0 * mean_edge.max(0.0));
    let variance_term = 1.0 / (1.0 + 25.0 * mean_variance.max(0.0));

    let area_fraction = if image_area == 0 {
        0.0
    } else {
        region_area as f32 / image_area as f32
    };
    let size_term = (area_fraction / weights.comfort_area_fraction).min(1.0);

    weights.saliency * saliency_term
        + weights.edge * edge_term
        + weights.variance * variance_term
        + weights.area * size_term
}

/// Fast font-size estimate from the box dimensions, capped relative to
/// the image's shorter side so a huge region does not suggest banner
/// text. Independent of the exact layout fitting search.
pub(crate) fn recommended_font_size(bbox: &BBox, img_width: u32, img_height: u32) -> u32 {
    let cap = ((img_width.min(img_height) as f32 * 0.05) as u32).max(16);
    (bbox.height() / 6).clamp(12, cap)
}

fn mean_color(img: &RgbImage, bbox: &BBox) -> Option<[u8; 3]> {
    if bbox.x1 > img.width() || bbox.y1 > img.height() || bbox.area() == 0 {
        return None;
    }
    let mut sums = [0u64; 3];
    for y in bbox.y0..bbox.y1 {
        for x in bbox.x0..bbox.x1 {
            let pixel = img.get_pixel(x, y);
            sums[0] += pixel[0] as u64;
            sums[1] += pixel[1] as u64;
            sums[2] += pixel[2] as u64;
        }
    }
    let count = bbox.area();
    Some([
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    ])
}
