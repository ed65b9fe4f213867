//! Text layout fitting: orientation choice, line wrapping and the
//! maximal-font-size search for a chosen region.
//!
//! Measurement goes through the [`TextMeasure`] trait so the fitting
//! logic stays independent of any particular font backend.

use serde::Serialize;

use crate::analysis::regions::BBox;

/// Width/height measurement of text at a given pixel size.
pub trait TextMeasure {
    /// Advance width of a single line, in pixels.
    fn line_width(&self, text: &str, px: f32) -> f32;
    /// Vertical space one line occupies, including leading.
    fn line_height(&self, px: f32) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// What wins in the near-square band when both orientations fit at the
/// same font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Fewer wrapped lines.
    FewerLines,
    /// Always horizontal on a tie.
    PreferHorizontal,
}

/// Tunable layout constants.
#[derive(Debug, Clone, Copy)]
pub struct LayoutPolicy {
    /// Aspect ratio at or above which the box counts as wide.
    pub wide_threshold: f32,
    /// Aspect ratio at or below which the box counts as narrow.
    pub narrow_threshold: f32,
    /// Inner margin kept clear on every side of the box, in pixels.
    pub margin: f32,
    /// The search never goes below this size; at the floor the layout is
    /// returned best-effort even if it overflows.
    pub min_font_size: u32,
    pub tie_break: TieBreak,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            wide_threshold: 2.0,
            narrow_threshold: 0.5,
            margin: 8.0,
            min_font_size: 12,
            tie_break: TieBreak::FewerLines,
        }
    }
}

/// The layout decision for one (box, text) pair.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutResult {
    pub orientation: Orientation,
    pub lines: Vec<String>,
    pub font_size: u32,
}

impl LayoutResult {
    /// Strict post-check for callers that need a hard guarantee: the
    /// fitting search degrades to the minimum size instead of failing,
    /// so an overflowing result is possible and flagged here.
    pub fn fits_within(&self, measure: &dyn TextMeasure, bbox: &BBox, policy: &LayoutPolicy) -> bool {
        lines_fit(measure, &self.lines, self.font_size as f32, bbox, policy)
    }
}

/// Decide orientation and fit the text into the box.
///
/// Clearly wide boxes go horizontal, clearly tall boxes vertical. In the
/// near-square band both orientations are fitted and the one reaching
/// the larger font size wins; ties fall to the policy's tie-break.
/// `base_size` is the upper bound of the size search.
pub fn choose_optimal_layout(
    measure: &dyn TextMeasure,
    text: &str,
    bbox: &BBox,
    base_size: u32,
    policy: &LayoutPolicy,
) -> LayoutResult {
    let ratio = bbox.aspect_ratio();

    if ratio >= policy.wide_threshold {
        return fit_orientation(measure, text, bbox, Orientation::Horizontal, base_size, policy);
    }
    if ratio <= policy.narrow_threshold {
        return fit_orientation(measure, text, bbox, Orientation::Vertical, base_size, policy);
    }

    let horizontal =
        fit_orientation(measure, text, bbox, Orientation::Horizontal, base_size, policy);
    let vertical = fit_orientation(measure, text, bbox, Orientation::Vertical, base_size, policy);

    if horizontal.font_size != vertical.font_size {
        if horizontal.font_size > vertical.font_size {
            horizontal
        } else {
            vertical
        }
    } else {
        match policy.tie_break {
            TieBreak::PreferHorizontal => horizontal,
            TieBreak::FewerLines => {
                if horizontal.lines.len() <= vertical.lines.len() {
                    horizontal
                } else {
                    vertical
                }
            }
        }
    }
}

/// Search downward for the largest font size whose wrapped lines fit the
/// box with margin.
///
/// Greedy wrapping makes the fit monotone in size (smaller sizes never
/// produce wider lines or more of them), so the first fitting size on
/// the way down is the maximum. Below `min_font_size` the layout is
/// returned best-effort.
pub fn fit_orientation(
    measure: &dyn TextMeasure,
    text: &str,
    bbox: &BBox,
    orientation: Orientation,
    base_size: u32,
    policy: &LayoutPolicy,
) -> LayoutResult {
    let avail_height = (bbox.height() as f32 - 2.0 * policy.margin).max(1.0);
    let upper = base_size.min(avail_height as u32).max(policy.min_font_size);

    for size in (policy.min_font_size..=upper).rev() {
        let lines = wrap_lines(measure, text, orientation, size as f32, bbox, policy);
        if lines_fit(measure, &lines, size as f32, bbox, policy) {
            return LayoutResult { orientation, lines, font_size: size };
        }
    }

    // Nothing fits at or above the floor; hand back the floor layout.
    let size = policy.min_font_size;
    let lines = wrap_lines(measure, text, orientation, size as f32, bbox, policy);
    LayoutResult { orientation, lines, font_size: size }
}

fn wrap_lines(
    measure: &dyn TextMeasure,
    text: &str,
    orientation: Orientation,
    px: f32,
    bbox: &BBox,
    policy: &LayoutPolicy,
) -> Vec<String> {
    match orientation {
        Orientation::Horizontal => {
            let max_width = (bbox.width() as f32 - 2.0 * policy.margin).max(1.0);
            wrap_greedy(measure, text, px, max_width)
        }
        Orientation::Vertical => wrap_column(text),
    }
}

/// Greedy word wrap: pack words onto a line while the line still fits
/// `max_width`. A single word wider than the line becomes its own line
/// and overflows; the fit check catches that.
fn wrap_greedy(measure: &dyn TextMeasure, text: &str, px: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if measure.line_width(&candidate, px) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Narrow-column wrap: one word per line.
fn wrap_column(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn lines_fit(
    measure: &dyn TextMeasure,
    lines: &[String],
    px: f32,
    bbox: &BBox,
    policy: &LayoutPolicy,
) -> bool {
    let avail_width = bbox.width() as f32 - 2.0 * policy.margin;
    let avail_height = bbox.height() as f32 - 2.0 * policy.margin;

    let widest = lines
        .iter()
        .map(|line| measure.line_width(line, px))
        .fold(0.0f32, f32::max);
    let total_height = lines.len() as f32 * measure.line_height(px);

    widest <= avail_width && total_height <= avail_height
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic measurer: every glyph advances 0.55 em, lines lead
    /// at 1.2 em. Keeps the tests independent of installed fonts.
    struct FixedAdvance;

    impl TextMeasure for FixedAdvance {
        fn line_width(&self, text: &str, px: f32) -> f32 {
            text.chars().count() as f32 * px * 0.55
        }

        fn line_height(&self, px: f32) -> f32 {
            px * 1.2
        }
    }

    const TEXT: &str = "Choose Super Choose Better";

    #[test]
    fn test_wide_box_goes_horizontal() {
        // 700x100, aspect ratio 7.0
        let bbox = BBox { x0: 50, y0: 250, x1: 750, y1: 350 };
        let layout = choose_optimal_layout(&FixedAdvance, TEXT, &bbox, 48, &LayoutPolicy::default());
        assert_eq!(layout.orientation, Orientation::Horizontal);
        assert!(layout.fits_within(&FixedAdvance, &bbox, &LayoutPolicy::default()));
    }

    #[test]
    fn test_narrow_box_goes_vertical() {
        // 150x350, aspect ratio ~0.43
        let bbox = BBox { x0: 50, y0: 50, x1: 200, y1: 400 };
        let layout = choose_optimal_layout(&FixedAdvance, TEXT, &bbox, 48, &LayoutPolicy::default());
        assert_eq!(layout.orientation, Orientation::Vertical);
        // One word per line
        assert_eq!(layout.lines.len(), 4);
        assert!(layout.fits_within(&FixedAdvance, &bbox, &LayoutPolicy::default()));
    }

    #[test]
    fn test_near_square_picks_larger_font() {
        let bbox = BBox { x0: 0, y0: 0, x1: 300, y1: 300 };
        let policy = LayoutPolicy::default();
        let chosen = choose_optimal_layout(&FixedAdvance, TEXT, &bbox, 60, &policy);

        let horizontal =
            fit_orientation(&FixedAdvance, TEXT, &bbox, Orientation::Horizontal, 60, &policy);
        let vertical =
            fit_orientation(&FixedAdvance, TEXT, &bbox, Orientation::Vertical, 60, &policy);
        assert_eq!(
            chosen.font_size,
            horizontal.font_size.max(vertical.font_size)
        );
    }

    #[test]
    fn test_fit_monotonicity() {
        let bbox = BBox { x0: 0, y0: 0, x1: 320, y1: 180 };
        let policy = LayoutPolicy::default();
        let fitted =
            fit_orientation(&FixedAdvance, TEXT, &bbox, Orientation::Horizontal, 72, &policy);
        assert!(fitted.fits_within(&FixedAdvance, &bbox, &policy));

        // Every size below the fitted maximum also fits
        for size in policy.min_font_size..fitted.font_size {
            let lines = wrap_greedy(
                &FixedAdvance,
                TEXT,
                size as f32,
                bbox.width() as f32 - 2.0 * policy.margin,
            );
            assert!(lines_fit(&FixedAdvance, &lines, size as f32, &bbox, &policy));
            assert!(lines.len() <= fitted.lines.len());
        }
    }

    #[test]
    fn test_line_count_non_increasing_as_size_decreases() {
        let bbox = BBox { x0: 0, y0: 0, x1: 320, y1: 600 };
        let max_width = bbox.width() as f32 - 16.0;
        let mut previous = usize::MAX;
        for size in (12..=60).rev() {
            let lines = wrap_greedy(&FixedAdvance, TEXT, size as f32, max_width);
            assert!(lines.len() <= previous);
            previous = lines.len();
        }
    }

    #[test]
    fn test_best_effort_at_minimum_size() {
        // Box too small for the text at any legal size: no panic, the
        // floor size comes back and the strict check reports overflow.
        let bbox = BBox { x0: 0, y0: 0, x1: 40, y1: 30 };
        let policy = LayoutPolicy::default();
        let layout = choose_optimal_layout(&FixedAdvance, TEXT, &bbox, 48, &policy);
        assert_eq!(layout.font_size, policy.min_font_size);
        assert!(!layout.fits_within(&FixedAdvance, &bbox, &policy));
    }

    #[test]
    fn test_greedy_wrap_packs_words() {
        // Width for ~13 chars at size 10 (0.55 * 10 * 13 = 71.5)
        let lines = wrap_greedy(&FixedAdvance, TEXT, 10.0, 72.0);
        assert_eq!(lines, vec!["Choose Super", "Choose Better"]);
    }

    #[test]
    fn test_oversized_word_gets_own_line() {
        let lines = wrap_greedy(&FixedAdvance, "tiny incomprehensibilities tiny", 10.0, 60.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "incomprehensibilities");
    }

    #[test]
    fn test_tie_break_policy() {
        let bbox = BBox { x0: 0, y0: 0, x1: 300, y1: 300 };
        let policy = LayoutPolicy {
            tie_break: TieBreak::PreferHorizontal,
            ..LayoutPolicy::default()
        };
        let horizontal =
            fit_orientation(&FixedAdvance, TEXT, &bbox, Orientation::Horizontal, 60, &policy);
        let vertical =
            fit_orientation(&FixedAdvance, TEXT, &bbox, Orientation::Vertical, 60, &policy);
        if horizontal.font_size == vertical.font_size {
            let chosen = choose_optimal_layout(&FixedAdvance, TEXT, &bbox, 60, &policy);
            assert_eq!(chosen.orientation, Orientation::Horizontal);
        }
    }
}
