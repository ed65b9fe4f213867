use std::str::FromStr;

use crate::analysis::regions::BBox;
use crate::vision::FeatureMap;

/// Saliency above this marks a pixel as belonging to the subject.
const SUBJECT_SALIENCY_THRESHOLD: f32 = 0.5;

/// Minimum subject fraction inside the box before text goes behind it.
const BEHIND_SUBJECT_MIN_FRACTION: f32 = 0.15;

/// Whether the text layer composites behind the detected subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehindSubject {
    /// Decide from the saliency content of the chosen box.
    Auto,
    /// Caller override.
    Forced(bool),
}

impl BehindSubject {
    pub fn resolve(self, saliency: &FeatureMap, bbox: &BBox) -> bool {
        match self {
            BehindSubject::Forced(value) => value,
            BehindSubject::Auto => subject_intrudes(saliency, bbox),
        }
    }
}

impl FromStr for BehindSubject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(BehindSubject::Auto),
            "true" | "yes" | "on" => Ok(BehindSubject::Forced(true)),
            "false" | "no" | "off" => Ok(BehindSubject::Forced(false)),
            other => Err(format!(
                "invalid behind-subject mode '{}' (expected auto, true or false)",
                other
            )),
        }
    }
}

/// True when enough of the box is covered by the subject for behind-
/// subject compositing to look intentional: at least 15% of its pixels
/// above the 0.5 saliency threshold (boundary inclusive). An empty or
/// out-of-range box never goes behind.
pub fn subject_intrudes(saliency: &FeatureMap, bbox: &BBox) -> bool {
    let clipped = match BBox::clip(
        (bbox.x0 as i64, bbox.y0 as i64, bbox.x1 as i64, bbox.y1 as i64),
        saliency.width(),
        saliency.height(),
    ) {
        Some(clipped) => clipped,
        None => return false,
    };

    match saliency.fraction_above(&clipped, SUBJECT_SALIENCY_THRESHOLD) {
        Some(fraction) => fraction >= BEHIND_SUBJECT_MIN_FRACTION,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Map whose first `salient_columns` columns read 0.9, rest 0.1.
    fn striped_map(width: u32, height: u32, salient_columns: u32) -> FeatureMap {
        FeatureMap::from_fn(width, height, |x, _| {
            if x < salient_columns {
                0.9
            } else {
                0.1
            }
        })
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // 3 of 20 columns salient: fraction exactly 0.15
        let map = striped_map(20, 10, 3);
        let bbox = BBox { x0: 0, y0: 0, x1: 20, y1: 10 };
        assert!(subject_intrudes(&map, &bbox));
    }

    #[test]
    fn test_below_threshold_is_false() {
        // 149 of 1000 columns salient: fraction 0.149
        let map = striped_map(1000, 4, 149);
        let bbox = BBox { x0: 0, y0: 0, x1: 1000, y1: 4 };
        assert!(!subject_intrudes(&map, &bbox));
    }

    #[test]
    fn test_out_of_bounds_box_is_false() {
        let map = striped_map(20, 10, 20);
        let outside = BBox { x0: 100, y0: 100, x1: 200, y1: 200 };
        assert!(!subject_intrudes(&map, &outside));
    }

    #[test]
    fn test_box_partially_outside_is_clipped() {
        // Fully salient map, box hanging over the right edge still decides true
        let map = striped_map(20, 10, 20);
        let hanging = BBox { x0: 10, y0: 0, x1: 200, y1: 10 };
        assert!(subject_intrudes(&map, &hanging));
    }

    #[test]
    fn test_forced_overrides_saliency() {
        let map = striped_map(20, 10, 20);
        let bbox = BBox { x0: 0, y0: 0, x1: 20, y1: 10 };
        assert!(!BehindSubject::Forced(false).resolve(&map, &bbox));
        assert!(BehindSubject::Forced(true).resolve(&map, &bbox));
        assert!(BehindSubject::Auto.resolve(&map, &bbox));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("auto".parse::<BehindSubject>().unwrap(), BehindSubject::Auto);
        assert_eq!("true".parse::<BehindSubject>().unwrap(), BehindSubject::Forced(true));
        assert_eq!("FALSE".parse::<BehindSubject>().unwrap(), BehindSubject::Forced(false));
        assert!("maybe".parse::<BehindSubject>().is_err());
    }
}
