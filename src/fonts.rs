//! Font resolution and glyph measurement.
//!
//! A [`FontContext`] is loaded once at startup and passed explicitly to
//! the layout and render stages. It resolves a font specification in
//! three forms: a full path, a font filename searched in system font
//! directories, or a bare family name.

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use anyhow::{Context, Result};

use crate::layout::TextMeasure;

/// An immutable, explicitly passed font handle.
pub struct FontContext {
    font: FontRef<'static>,
    spec: String,
}

impl FontContext {
    /// Resolve and load a font. Falls back to common system fonts when
    /// the specification cannot be found, and fails only when nothing
    /// loadable exists at all.
    pub fn load(font_spec: &str) -> Result<Self> {
        let font = load_font(font_spec)?;
        Ok(Self { font, spec: font_spec.to_string() })
    }

    pub fn font(&self) -> &FontRef<'static> {
        &self.font
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }
}

impl TextMeasure for FontContext {
    fn line_width(&self, text: &str, px: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(px));
        let mut width = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            let glyph = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, glyph);
            }
            width += scaled.h_advance(glyph);
            previous = Some(glyph);
        }
        width
    }

    fn line_height(&self, px: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(px));
        scaled.ascent() - scaled.descent() + scaled.line_gap()
    }
}

fn load_font(font_spec: &str) -> Result<FontRef<'static>> {
    if is_absolute_path(font_spec) {
        return load_font_from_path(font_spec);
    }

    if is_font_filename(font_spec) {
        if let Ok(font) = load_font_by_filename(font_spec) {
            return Ok(font);
        }
        // fall through to name-based search
    }

    if let Ok(font) = load_font_by_name(font_spec) {
        return Ok(font);
    }

    // Last resort: any common system font
    let default_fonts = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/System/Library/Fonts/Helvetica.ttc",
        "/mnt/c/Windows/Fonts/arial.ttf",
    ];
    for path in &default_fonts {
        if let Ok(data) = std::fs::read(path) {
            if let Ok(font) = FontRef::try_from_slice(Box::leak(data.into_boxed_slice())) {
                return Ok(font);
            }
        }
    }

    Err(anyhow::anyhow!(
        "No suitable font found for '{}'. Pass a font file path with --font.",
        font_spec
    ))
}

fn is_absolute_path(path: &str) -> bool {
    path.starts_with('/')
        || path.starts_with('\\')
        || (path.len() > 2 && path.chars().nth(1) == Some(':'))
}

fn is_font_filename(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.ends_with(".ttf") || lower.ends_with(".otf") || lower.ends_with(".ttc")
}

fn load_font_from_path(font_path: &str) -> Result<FontRef<'static>> {
    let data = std::fs::read(font_path)
        .with_context(|| format!("Failed to read font file: {}", font_path))?;
    FontRef::try_from_slice(Box::leak(data.into_boxed_slice()))
        .with_context(|| format!("Failed to parse font file: {}", font_path))
}

fn load_font_by_filename(filename: &str) -> Result<FontRef<'static>> {
    for dir in system_font_directories() {
        let candidate = format!("{}/{}", expand_path(dir), filename);
        if std::path::Path::new(&candidate).exists() {
            if let Ok(font) = load_font_from_path(&candidate) {
                return Ok(font);
            }
        }
    }
    Err(anyhow::anyhow!("Font file '{}' not found in system directories", filename))
}

fn load_font_by_name(font_name: &str) -> Result<FontRef<'static>> {
    for dir in system_font_directories() {
        for ext in ["ttf", "otf"] {
            let candidate = format!("{}/{}.{}", expand_path(dir), font_name, ext);
            if let Ok(data) = std::fs::read(&candidate) {
                if let Ok(font) = FontRef::try_from_slice(Box::leak(data.into_boxed_slice())) {
                    return Ok(font);
                }
            }
        }
    }
    Err(anyhow::anyhow!("System font '{}' not found", font_name))
}

fn expand_path(path: &str) -> String {
    if path.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

fn system_font_directories() -> Vec<&'static str> {
    vec![
        // Linux
        "/usr/share/fonts",
        "/usr/share/fonts/truetype",
        "/usr/share/fonts/truetype/dejavu",
        "/usr/share/fonts/TTF",
        "/usr/share/fonts/opentype",
        "/usr/local/share/fonts",
        "~/.fonts",
        "~/.local/share/fonts",
        // macOS
        "/System/Library/Fonts",
        "/System/Library/Fonts/Supplemental",
        "/Library/Fonts",
        "~/Library/Fonts",
        // Windows (via WSL)
        "/mnt/c/Windows/Fonts",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_absolute_path() {
        assert!(is_absolute_path("/usr/share/fonts/font.ttf"));
        assert!(is_absolute_path("C:\\Windows\\Fonts\\arial.ttf"));
        assert!(!is_absolute_path("OpenSans-Regular"));
        assert!(!is_absolute_path("fonts/OpenSans.ttf"));
    }

    #[test]
    fn test_is_font_filename() {
        assert!(is_font_filename("OpenSans.ttf"));
        assert!(is_font_filename("OpenSans.TTF"));
        assert!(is_font_filename("font.otf"));
        assert!(!is_font_filename("OpenSans"));
        assert!(!is_font_filename("notes.txt"));
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("/usr/share/fonts"), "/usr/share/fonts");
        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(expand_path("~/.fonts"), format!("{}/.fonts", home));
        }
    }
}
