//! Text style configuration and background-driven style recommendation.
//!
//! The recommender is a pure lookup: given the region's average
//! background color it ranks curated text colors by contrast and pairs
//! them with curated fonts, best-first. Callers take the top entry as
//! the default when no explicit style is supplied.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{OverlayError, Result};

/// Curated named colors accepted for `text_color` style fields.
/// Names resolve case-insensitively and always to the same triple.
pub const PALETTE: &[(&str, [u8; 3])] = &[
    ("white", [245, 245, 245]),
    ("black", [20, 20, 20]),
    ("charcoal", [54, 69, 79]),
    ("cream", [255, 253, 240]),
    ("navy", [28, 40, 65]),
    ("teal", [0, 128, 128]),
    ("coral", [255, 127, 80]),
    ("gold", [212, 175, 55]),
    ("slate", [112, 128, 144]),
    ("burgundy", [128, 0, 32]),
    ("sage", [158, 178, 145]),
];

/// The font the recommender reaches for first; also the fallback when
/// neither an explicit flag nor a style file names one.
pub const DEFAULT_FONT: &str = "OpenSans-Regular";

/// Curated font identifiers paired with recommended colors, in
/// preference order.
const CURATED_FONTS: &[&str] = &[
    DEFAULT_FONT,
    "Montserrat-SemiBold",
    "Lato-Regular",
    "Merriweather-Regular",
];

/// Resolve a palette color name to its RGB triple.
pub fn validate_color(name: &str) -> Result<[u8; 3]> {
    let wanted = name.trim().to_ascii_lowercase();
    PALETTE
        .iter()
        .find(|(candidate, _)| *candidate == wanted)
        .map(|(_, rgb)| *rgb)
        .ok_or_else(|| OverlayError::InvalidColor(name.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    Normal,
    Overlay,
}

impl FromStr for BlendMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(BlendMode::Normal),
            "overlay" => Ok(BlendMode::Overlay),
            other => Err(format!("invalid blend mode '{}' (expected normal or overlay)", other)),
        }
    }
}

/// The full style a renderer needs. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyleConfig {
    pub font: String,
    pub font_size: u32,
    /// `None` means auto-contrast against `bg_color` at render time.
    pub text_color: Option<[u8; 3]>,
    pub bg_color: [u8; 3],
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub shadow: bool,
}

/// Explicit caller overrides; any set field wins over the same field in
/// a supplied or recommended style.
#[derive(Debug, Clone, Default)]
pub struct StyleOverrides {
    pub font: Option<String>,
    pub font_size: Option<u32>,
    pub text_color: Option<[u8; 3]>,
    pub opacity: Option<f32>,
    pub blend_mode: Option<BlendMode>,
    pub shadow: Option<bool>,
}

impl TextStyleConfig {
    /// Convert a loose JSON mapping into a validated config.
    ///
    /// Required fields: `font` (string), `font_size` (positive integer),
    /// `bg_color` ([r,g,b]). Optional: `text_color` (palette name,
    /// [r,g,b], or null for auto), `opacity` (default 0.9, must be in
    /// [0,1]), `blend_mode` (default "overlay"), `shadow` (default true).
    pub fn from_loose_config(value: &serde_json::Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| OverlayError::Configuration("style must be a JSON object".into()))?;

        let font = map
            .get("font")
            .and_then(|v| v.as_str())
            .ok_or_else(|| OverlayError::Configuration("missing string field 'font'".into()))?
            .to_string();

        let font_size = map
            .get("font_size")
            .and_then(|v| v.as_u64())
            .filter(|&size| size > 0 && size <= u32::MAX as u64)
            .ok_or_else(|| {
                OverlayError::Configuration("missing or non-positive field 'font_size'".into())
            })? as u32;

        let bg_color = map
            .get("bg_color")
            .map(parse_rgb)
            .transpose()?
            .ok_or_else(|| OverlayError::Configuration("missing field 'bg_color'".into()))?;

        let text_color = match map.get("text_color") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(name)) => Some(validate_color(name)?),
            Some(other) => Some(parse_rgb(other)?),
        };

        let opacity = match map.get("opacity") {
            None => 0.9,
            Some(v) => {
                let opacity = v.as_f64().ok_or_else(|| {
                    OverlayError::Configuration("field 'opacity' must be a number".into())
                })? as f32;
                if !(0.0..=1.0).contains(&opacity) {
                    return Err(OverlayError::Configuration(format!(
                        "opacity {} outside [0, 1]",
                        opacity
                    )));
                }
                opacity
            }
        };

        let blend_mode = match map.get("blend_mode") {
            None => BlendMode::Overlay,
            Some(v) => v
                .as_str()
                .ok_or_else(|| {
                    OverlayError::Configuration("field 'blend_mode' must be a string".into())
                })?
                .parse::<BlendMode>()
                .map_err(OverlayError::Configuration)?,
        };

        let shadow = match map.get("shadow") {
            None => true,
            Some(v) => v.as_bool().ok_or_else(|| {
                OverlayError::Configuration("field 'shadow' must be a boolean".into())
            })?,
        };

        Ok(Self { font, font_size, text_color, bg_color, opacity, blend_mode, shadow })
    }

    /// Apply explicit caller fields on top of this style.
    pub fn with_overrides(mut self, overrides: &StyleOverrides) -> Self {
        if let Some(font) = &overrides.font {
            self.font = font.clone();
        }
        if let Some(size) = overrides.font_size {
            self.font_size = size;
        }
        if let Some(color) = overrides.text_color {
            self.text_color = Some(color);
        }
        if let Some(opacity) = overrides.opacity {
            self.opacity = opacity;
        }
        if let Some(blend) = overrides.blend_mode {
            self.blend_mode = blend;
        }
        if let Some(shadow) = overrides.shadow {
            self.shadow = shadow;
        }
        self
    }

    /// The color text will actually be drawn with: the explicit color,
    /// or the highest-contrast palette color against the background.
    pub fn effective_text_color(&self) -> [u8; 3] {
        self.text_color
            .unwrap_or_else(|| best_contrast_color(self.bg_color))
    }
}

fn parse_rgb(value: &serde_json::Value) -> Result<[u8; 3]> {
    let parts = value
        .as_array()
        .filter(|array| array.len() == 3)
        .ok_or_else(|| OverlayError::Configuration("color must be a [r, g, b] array".into()))?;
    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(parts) {
        *slot = part
            .as_u64()
            .filter(|&channel| channel <= 255)
            .ok_or_else(|| OverlayError::Configuration("color channel outside 0-255".into()))?
            as u8;
    }
    Ok(rgb)
}

/// Relative luminance of an sRGB color, in [0,1].
fn relative_luminance(rgb: [u8; 3]) -> f32 {
    let linear = |channel: u8| {
        let c = channel as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(rgb[0]) + 0.7152 * linear(rgb[1]) + 0.0722 * linear(rgb[2])
}

/// WCAG-style contrast ratio between two colors, >= 1.
fn contrast_ratio(a: [u8; 3], b: [u8; 3]) -> f32 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    (la.max(lb) + 0.05) / (la.min(lb) + 0.05)
}

fn best_contrast_color(bg: [u8; 3]) -> [u8; 3] {
    PALETTE
        .iter()
        .max_by(|(_, a), (_, b)| {
            contrast_ratio(*a, bg)
                .partial_cmp(&contrast_ratio(*b, bg))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(_, rgb)| *rgb)
        .unwrap_or([245, 245, 245])
}

/// Rank style suggestions for a background color, best-first.
///
/// Colors are ordered by contrast against the background and paired
/// with the curated fonts; `top_k` truncates the result.
pub fn recommend_styles(bg_color: [u8; 3], font_size: u32, top_k: usize) -> Vec<TextStyleConfig> {
    let mut ranked: Vec<&(&str, [u8; 3])> = PALETTE.iter().collect();
    ranked.sort_by(|(_, a), (_, b)| {
        contrast_ratio(*b, bg_color)
            .partial_cmp(&contrast_ratio(*a, bg_color))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(index, (_, rgb))| TextStyleConfig {
            font: CURATED_FONTS[index % CURATED_FONTS.len()].to_string(),
            font_size,
            text_color: Some(*rgb),
            bg_color,
            opacity: 0.9,
            blend_mode: BlendMode::Overlay,
            shadow: true,
        })
        .collect()
}
