use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use strum::IntoEnumIterator;

use crate::analysis::behind::BehindSubject;
use crate::analysis::regions::Position;
use crate::style::{BlendMode, StyleOverrides};
use crate::utils::parse_box_spec;

#[derive(Parser, Debug)]
#[command(
    name = "textoverlay-processor",
    about = "Smart text placement for images",
    long_about = "
Text Overlay Processor

Analyzes an image's saliency, edge density and local texture to find the
region where overlay text is least intrusive, fits the text into that
region (orientation, line breaks, font size), picks a matching style for
the background, and renders the result.

Example Usage:
  # Let the analyzer pick position, size and style
  textoverlay-processor -i photo.jpg -o out/ --text \"Golden hour\"

  # Force a position and a palette color
  textoverlay-processor -i photo.jpg -o out/ --text \"Golden hour\" \\
    --position bottom_right --color cream --no-shadow

  # Custom region, model-produced saliency map, text behind the subject
  textoverlay-processor -i photo.jpg -o out/ --text \"Golden hour\" \\
    --box 40,60,400,300 --saliency-map photo_saliency.png --behind-subject true

  # Batch a directory and only emit the analysis as JSON
  textoverlay-processor -i ~/Photos -o out/ --text \"2026\" --json"
)]
pub struct Args {
    /// Input image files or directories (can be specified multiple times)
    #[arg(short = 'i', long = "input", required = true, value_name = "DIR|FILE")]
    pub input_paths: Vec<PathBuf>,

    /// Output directory for rendered images (and JSON analyses)
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// The text to place on the image
    #[arg(short = 't', long = "text", required = true, value_name = "TEXT")]
    pub text: String,

    /// Preferred position (left, center_left, center, right, top, bottom,
    /// bottom_right, custom). Overrides the score-based choice.
    #[arg(short = 'p', long = "position", value_name = "POSITION")]
    pub position: Option<String>,

    /// Custom candidate box as x0,y0,x1,y1 in pixel coordinates
    #[arg(long = "box", value_name = "X0,Y0,X1,Y1")]
    pub custom_box: Option<String>,

    /// Externally produced saliency map (grayscale image, any size).
    /// Without it a fast built-in estimate is used.
    #[arg(long = "saliency-map", value_name = "FILE")]
    pub saliency_map: Option<PathBuf>,

    /// Font specification: name, filename, or full path. Defaults to
    /// the style file's font when one is given, else the top
    /// recommended font.
    #[arg(long = "font", value_name = "FONT")]
    pub font: Option<String>,

    /// Fixed upper bound for the font size search; by default the
    /// region's recommended size is the bound
    #[arg(long = "font-size", value_name = "SIZE")]
    pub font_size: Option<u32>,

    /// Text color by palette name (e.g. white, charcoal, cream, teal).
    /// Default: auto-contrast against the region background.
    #[arg(long = "color", value_name = "NAME")]
    pub color: Option<String>,

    /// Text layer opacity (0.0-1.0)
    #[arg(long = "opacity", value_name = "OPACITY")]
    pub opacity: Option<f32>,

    /// Blend mode: overlay or normal
    #[arg(long = "blend", value_name = "MODE")]
    pub blend: Option<String>,

    /// Disable the drop shadow
    #[arg(long = "no-shadow")]
    pub no_shadow: bool,

    /// Composite text behind the detected subject: auto, true or false
    #[arg(long = "behind-subject", default_value = "auto", value_name = "MODE")]
    pub behind_subject: String,

    /// Style config JSON file; explicit flags above still win
    #[arg(long = "style", value_name = "FILE")]
    pub style_file: Option<PathBuf>,

    /// Emit the placement analysis as JSON instead of rendering
    #[arg(long = "json")]
    pub json: bool,

    /// Comma-separated list of image extensions to process
    #[arg(long = "extensions", default_value = "jpg,jpeg,png,webp,tiff")]
    pub extensions_str: String,

    /// Number of parallel jobs for directory batches (0 = auto)
    #[arg(short = 'j', long = "jobs", default_value = "0", value_name = "N")]
    pub jobs: usize,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Parse the preferred-position label
    pub fn parse_position(&self) -> Result<Option<Position>, String> {
        match &self.position {
            None => Ok(None),
            Some(label) => Position::from_str(label).map(Some).map_err(|_| {
                let valid: Vec<String> = Position::iter().map(|p| p.to_string()).collect();
                format!("Invalid position '{}'. Valid values: {}", label, valid.join(", "))
            }),
        }
    }

    /// Parse the custom box specification
    pub fn parse_custom_box(&self) -> Result<Option<(i64, i64, i64, i64)>, String> {
        self.custom_box.as_deref().map(parse_box_spec).transpose()
    }

    /// Parse the behind-subject mode
    pub fn parse_behind_subject(&self) -> Result<BehindSubject, String> {
        self.behind_subject.parse()
    }

    /// Parse the extensions string into a vector
    pub fn parse_extensions(&self) -> Vec<String> {
        self.extensions_str
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Style override fields explicitly given on the command line.
    /// Color-name resolution happens earlier so it can fail with a
    /// typed error; the resolved triple is passed in.
    pub fn style_overrides(&self, text_color: Option<[u8; 3]>) -> Result<StyleOverrides, String> {
        let blend_mode = match &self.blend {
            None => None,
            Some(mode) => Some(BlendMode::from_str(mode)?),
        };
        Ok(StyleOverrides {
            font: self.font.clone(),
            font_size: self.font_size,
            text_color,
            opacity: self.opacity,
            blend_mode,
            shadow: if self.no_shadow { Some(false) } else { None },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        let mut args = Args::default();
        assert_eq!(args.parse_position().unwrap(), None);

        args.position = Some("bottom_right".to_string());
        assert_eq!(args.parse_position().unwrap(), Some(Position::BottomRight));

        args.position = Some("middle".to_string());
        assert!(args.parse_position().is_err());
    }

    #[test]
    fn test_parse_custom_box() {
        let mut args = Args::default();
        assert_eq!(args.parse_custom_box().unwrap(), None);

        args.custom_box = Some("0,0,100,50".to_string());
        assert_eq!(args.parse_custom_box().unwrap(), Some((0, 0, 100, 50)));

        args.custom_box = Some("0,0,100".to_string());
        assert!(args.parse_custom_box().is_err());
    }

    #[test]
    fn test_parse_behind_subject() {
        let mut args = Args::default();
        assert_eq!(args.parse_behind_subject().unwrap(), BehindSubject::Auto);

        args.behind_subject = "false".to_string();
        assert_eq!(
            args.parse_behind_subject().unwrap(),
            BehindSubject::Forced(false)
        );
    }

    #[test]
    fn test_parse_extensions() {
        let mut args = Args::default();
        args.extensions_str = "JPG, PNG , webp ".to_string();
        assert_eq!(args.parse_extensions(), vec!["jpg", "png", "webp"]);
    }

    #[test]
    fn test_style_overrides_shadow_flag() {
        let mut args = Args::default();
        assert_eq!(args.style_overrides(None).unwrap().shadow, None);

        args.no_shadow = true;
        assert_eq!(args.style_overrides(None).unwrap().shadow, Some(false));
    }

    #[test]
    fn test_font_override_only_when_given() {
        let mut args = Args::default();
        assert_eq!(args.style_overrides(None).unwrap().font, None);

        args.font = Some("Montserrat-SemiBold".to_string());
        assert_eq!(
            args.style_overrides(None).unwrap().font,
            Some("Montserrat-SemiBold".to_string())
        );
    }
}

// Default implementation for tests
#[cfg(test)]
impl Default for Args {
    fn default() -> Self {
        Self {
            input_paths: vec![],
            output_dir: PathBuf::new(),
            text: "hello".to_string(),
            position: None,
            custom_box: None,
            saliency_map: None,
            font: None,
            font_size: None,
            color: None,
            opacity: None,
            blend: None,
            no_shadow: false,
            behind_subject: "auto".to_string(),
            style_file: None,
            json: false,
            extensions_str: "jpg,png".to_string(),
            jobs: 0,
            verbose: false,
        }
    }
}
