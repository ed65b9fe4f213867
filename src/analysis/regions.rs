use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::{OverlayError, Result};

/// Axis-aligned box in image pixel coordinates.
///
/// Invariant: `x1 > x0` and `y1 > y0`, and all corners lie inside the
/// image the box was clipped against. Construct through [`BBox::clip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl BBox {
    /// Clamp a raw box to `[0,width]x[0,height]`.
    ///
    /// Returns `None` if the box has zero area after clipping (including
    /// boxes entirely outside the image). Never panics on negative or
    /// oversized input coordinates.
    pub fn clip(raw: (i64, i64, i64, i64), width: u32, height: u32) -> Option<Self> {
        let (rx0, ry0, rx1, ry1) = raw;
        let x0 = rx0.clamp(0, width as i64) as u32;
        let y0 = ry0.clamp(0, height as i64) as u32;
        let x1 = rx1.clamp(0, width as i64) as u32;
        let y1 = ry1.clamp(0, height as i64) as u32;

        if x1 > x0 && y1 > y0 {
            Some(BBox { x0, y0, x1, y1 })
        } else {
            None
        }
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Width over height. The non-zero height is guaranteed by the
    /// construction invariant.
    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }
}

/// Canonical placement positions.
///
/// The declaration order is the canonical ordering used to break score
/// ties during selection, so keep it stable.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Left,
    CenterLeft,
    Center,
    Right,
    Top,
    Bottom,
    BottomRight,
    Custom,
}

/// Produce the candidate boxes to evaluate for an image of `width` x
/// `height` pixels.
///
/// Canonical positions are fixed fractional subdivisions of the image.
/// Positions that degenerate to zero area (tiny images) are silently
/// dropped; partial availability is normal. A caller-supplied custom box
/// is clipped to the image, but one that is empty after clipping is a
/// caller error.
pub fn candidate_boxes(
    width: u32,
    height: u32,
    custom: Option<(i64, i64, i64, i64)>,
) -> Result<Vec<(Position, BBox)>> {
    let w = width as i64;
    let h = height as i64;

    let canonical: [(Position, (i64, i64, i64, i64)); 7] = [
        (Position::Left, (0, 0, w / 3, h)),
        (Position::CenterLeft, (w / 6, h / 8, w / 2, h - h / 8)),
        (Position::Center, (w / 3, h / 4, 2 * w / 3, h - h / 4)),
        (Position::Right, (2 * w / 3, 0, w, h)),
        (Position::Top, (0, 0, w, h / 3)),
        (Position::Bottom, (0, 2 * h / 3, w, h)),
        (Position::BottomRight, (w / 2, 2 * h / 3, w, h)),
    ];

    let mut candidates = Vec::with_capacity(canonical.len() + 1);
    for (position, raw) in canonical {
        if let Some(bbox) = BBox::clip(raw, width, height) {
            candidates.push((position, bbox));
        }
    }

    if let Some(raw) = custom {
        let bbox = BBox::clip(raw, width, height)
            .ok_or(OverlayError::InvalidBox(raw, width, height))?;
        candidates.push((Position::Custom, bbox));
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_clip_inside() {
        let bbox = BBox::clip((10, 20, 110, 220), 800, 600).unwrap();
        assert_eq!((bbox.width(), bbox.height()), (100, 200));
        assert_eq!(bbox.area(), 20_000);
    }

    #[test]
    fn test_clip_partially_outside() {
        // Negative origin and oversized extent are clamped, not rejected
        let bbox = BBox::clip((-50, -50, 100, 100), 800, 600).unwrap();
        assert_eq!(bbox, BBox { x0: 0, y0: 0, x1: 100, y1: 100 });

        let bbox = BBox::clip((700, 500, 2000, 2000), 800, 600).unwrap();
        assert_eq!(bbox, BBox { x0: 700, y0: 500, x1: 800, y1: 600 });
    }

    #[test]
    fn test_clip_degenerate() {
        assert!(BBox::clip((100, 100, 100, 300), 800, 600).is_none()); // zero width
        assert!(BBox::clip((100, 100, 50, 300), 800, 600).is_none()); // inverted
        assert!(BBox::clip((900, 0, 1000, 600), 800, 600).is_none()); // outside
    }

    #[test]
    fn test_aspect_ratio() {
        let wide = BBox::clip((50, 250, 750, 350), 800, 600).unwrap();
        assert!((wide.aspect_ratio() - 7.0).abs() < 1e-6);

        let narrow = BBox::clip((50, 50, 200, 400), 800, 600).unwrap();
        assert!((narrow.aspect_ratio() - 150.0 / 350.0).abs() < 1e-6);
    }

    #[test]
    fn test_canonical_candidates() {
        let candidates = candidate_boxes(900, 600, None).unwrap();
        assert_eq!(candidates.len(), 7);

        // Every generated box is valid and inside the image
        for (_, bbox) in &candidates {
            assert!(bbox.x1 > bbox.x0 && bbox.y1 > bbox.y0);
            assert!(bbox.x1 <= 900 && bbox.y1 <= 600);
        }

        // "left" is the left third of the frame
        let left = candidates
            .iter()
            .find(|(p, _)| *p == Position::Left)
            .map(|(_, b)| *b)
            .unwrap();
        assert_eq!(left, BBox { x0: 0, y0: 0, x1: 300, y1: 600 });
    }

    #[test]
    fn test_tiny_image_drops_candidates() {
        // 2x2 image: thirds and quarters collapse, survivors still valid
        let candidates = candidate_boxes(2, 2, None).unwrap();
        for (_, bbox) in &candidates {
            assert!(bbox.area() > 0);
        }
    }

    #[test]
    fn test_custom_box_clipped() {
        let candidates = candidate_boxes(800, 600, Some((-100, 0, 400, 700))).unwrap();
        let custom = candidates
            .iter()
            .find(|(p, _)| *p == Position::Custom)
            .map(|(_, b)| *b)
            .unwrap();
        assert_eq!(custom, BBox { x0: 0, y0: 0, x1: 400, y1: 600 });
    }

    #[test]
    fn test_custom_box_outside_is_error() {
        let result = candidate_boxes(800, 600, Some((900, 0, 1200, 600)));
        assert!(matches!(result, Err(crate::error::OverlayError::InvalidBox(..))));
    }

    #[test]
    fn test_position_labels_round_trip() {
        assert_eq!(Position::CenterLeft.to_string(), "center_left");
        assert_eq!(Position::from_str("bottom_right").unwrap(), Position::BottomRight);
        assert!(Position::from_str("middle").is_err());
    }

    #[test]
    fn test_canonical_ordering() {
        // Tie-break order depends on the declaration order staying put
        assert!(Position::Left < Position::Center);
        assert!(Position::Center < Position::BottomRight);
        assert!(Position::BottomRight < Position::Custom);
    }
}
