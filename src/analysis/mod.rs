//! Region analysis: candidate generation, scoring, selection and the
//! behind-subject decision.
//!
//! The pipeline is synchronous per request. Candidate scoring is
//! side-effect-free over read-only inputs, so the candidates are
//! evaluated in parallel; everything downstream consumes the full
//! mapping. Identical inputs always produce identical outputs.

pub mod behind;
pub mod regions;
pub mod scoring;
pub mod selection;

use image::RgbImage;
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::vision::FeatureMaps;

pub use behind::{subject_intrudes, BehindSubject};
pub use regions::{candidate_boxes, BBox, Position};
pub use scoring::{score_region, PlacementOption, ScoringWeights};
pub use selection::select_placement;

/// Position label to scored option. Positions whose region degenerated
/// or produced an empty slice are simply absent; that is a normal
/// outcome, not a failure.
pub type PlacementMap = BTreeMap<Position, PlacementOption>;

/// Run candidate generation and scoring for one image.
///
/// `custom` adds a caller-supplied box under the `custom` key; it is
/// clipped to the image and rejected with `InvalidBox` only when nothing
/// of it remains.
pub fn analyze_regions(
    img: &RgbImage,
    maps: &FeatureMaps,
    custom: Option<(i64, i64, i64, i64)>,
    weights: &ScoringWeights,
) -> Result<PlacementMap> {
    let candidates = regions::candidate_boxes(img.width(), img.height(), custom)?;

    let scored: Vec<(Position, PlacementOption)> = candidates
        .par_iter()
        .filter_map(|&(position, bbox)| {
            scoring::score_region(img, maps, position, bbox, weights)
                .map(|option| (position, option))
        })
        .collect();

    Ok(scored.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::FeatureMap;
    use image::{ImageBuffer, Rgb};

    fn gradient_image(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, _| {
            let v = (x * 255 / width.max(1)) as u8;
            Rgb([v, v, v])
        })
    }

    /// Subject parked in the right third of the frame.
    fn right_subject_maps(width: u32, height: u32) -> FeatureMaps {
        FeatureMaps {
            saliency: FeatureMap::from_fn(width, height, |x, _| {
                if x >= 2 * width / 3 {
                    0.9
                } else {
                    0.05
                }
            }),
            edge: FeatureMap::from_fn(width, height, |_, _| 0.05),
            variance: FeatureMap::from_fn(width, height, |_, _| 0.01),
        }
    }

    #[test]
    fn test_analyze_produces_canonical_positions() {
        let img = gradient_image(900, 600);
        let maps = right_subject_maps(900, 600);
        let options = analyze_regions(&img, &maps, None, &ScoringWeights::default()).unwrap();

        assert!(options.contains_key(&Position::Left));
        assert!(options.contains_key(&Position::Right));
        assert!(!options.contains_key(&Position::Custom));
    }

    #[test]
    fn test_subject_side_scores_lower() {
        let img = gradient_image(900, 600);
        let maps = right_subject_maps(900, 600);
        let options = analyze_regions(&img, &maps, None, &ScoringWeights::default()).unwrap();

        let left = options.get(&Position::Left).unwrap();
        let right = options.get(&Position::Right).unwrap();
        assert!(left.score > right.score);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let img = gradient_image(300, 200);
        let maps = right_subject_maps(300, 200);
        let weights = ScoringWeights::default();

        let first = analyze_regions(&img, &maps, Some((10, 10, 150, 150)), &weights).unwrap();
        let second = analyze_regions(&img, &maps, Some((10, 10, 150, 150)), &weights).unwrap();

        assert_eq!(first.len(), second.len());
        for (position, option) in &first {
            let other = second.get(position).unwrap();
            assert_eq!(option.score, other.score);
            assert_eq!(option.bbox, other.bbox);
        }
    }

    #[test]
    fn test_custom_box_included() {
        let img = gradient_image(300, 200);
        let maps = right_subject_maps(300, 200);
        let options =
            analyze_regions(&img, &maps, Some((20, 20, 120, 120)), &ScoringWeights::default())
                .unwrap();
        let custom = options.get(&Position::Custom).unwrap();
        assert_eq!(custom.bbox, BBox { x0: 20, y0: 20, x1: 120, y1: 120 });
    }
}
