//! Batch orchestration: discover input images, run the analysis and
//! layout pipeline on each, and render the overlay or emit the analysis
//! as JSON.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::analysis::{
    analyze_regions, select_placement, BehindSubject, PlacementMap, PlacementOption, Position,
    ScoringWeights,
};
use crate::fonts::FontContext;
use crate::layout::{choose_optimal_layout, LayoutPolicy, LayoutResult, Orientation};
use crate::render::render_overlay;
use crate::style::{recommend_styles, StyleOverrides, TextStyleConfig, DEFAULT_FONT};
use crate::utils::{has_valid_extension, verbose_println, warn_println};
use crate::vision::FeatureMaps;

/// Everything the engine needs to process one batch.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub text: String,
    /// Explicit font request. `None` defers to the style file's font,
    /// then to the default curated font.
    pub font_spec: Option<String>,
    pub preferred_position: Option<Position>,
    pub custom_box: Option<(i64, i64, i64, i64)>,
    pub saliency_map: Option<PathBuf>,
    pub weights: ScoringWeights,
    pub policy: LayoutPolicy,
    /// Upper bound for the font size search. `None` uses the selected
    /// region's recommended size.
    pub base_font_size: Option<u32>,
    pub behind_subject: BehindSubject,
    pub style_file: Option<PathBuf>,
    pub overrides: StyleOverrides,
    /// Write the placement analysis as JSON instead of rendering.
    pub json_only: bool,
    pub extensions: Vec<String>,
    pub parallel_jobs: usize,
    pub verbose: bool,
}

/// Per-image outcome for the results summary.
#[derive(Debug, Clone)]
pub struct OverlayResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub position: Position,
    pub score: f32,
    pub orientation: Orientation,
    pub font_size: u32,
    pub line_count: usize,
    pub behind_subject: bool,
    pub elapsed: Duration,
}

/// What `--json` writes per image: the full scored mapping plus the
/// selection and layout it leads to.
#[derive(Serialize)]
struct AnalysisReport<'a> {
    image: String,
    width: u32,
    height: u32,
    selected: Position,
    behind_subject: bool,
    layout: &'a LayoutResult,
    placements: &'a PlacementMap,
}

pub struct OverlayEngine {
    config: OverlayConfig,
    fonts: FontContext,
    /// Base style parsed from `--style`, shared by every image.
    file_style: Option<TextStyleConfig>,
}

impl OverlayEngine {
    pub fn new(config: OverlayConfig) -> Result<Self> {
        // A job count of 0 lets rayon size the pool to the machine.
        if config.parallel_jobs > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.parallel_jobs)
                .build_global()
                .context("Failed to initialize thread pool")?;
        }

        let file_style = match &config.style_file {
            Some(path) => Some(load_style_file(path)?),
            None => None,
        };

        let font_spec = resolve_font_spec(config.font_spec.as_deref(), file_style.as_ref());
        let fonts = FontContext::load(&font_spec)
            .with_context(|| format!("Failed to load font '{}'", font_spec))?;
        verbose_println(config.verbose, &format!("Using font: {}", fonts.spec()));

        Ok(Self { config, fonts, file_style })
    }

    /// Collect image files from the input paths. Files are taken as
    /// given, directories are walked recursively.
    pub fn discover_images(&self, input_paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut image_files = Vec::new();

        for input_path in input_paths {
            if input_path.is_file() {
                if has_valid_extension(input_path, &self.config.extensions) {
                    image_files.push(input_path.clone());
                } else {
                    warn_println(&format!(
                        "Skipping '{}': extension not in {:?}",
                        input_path.display(),
                        self.config.extensions
                    ));
                }
                continue;
            }

            verbose_println(
                self.config.verbose,
                &format!("Scanning directory: {}", input_path.display()),
            );

            let walker = WalkDir::new(input_path).follow_links(false).max_depth(10);
            for entry in walker {
                let entry = entry.context("Failed to read directory entry")?;
                let path = entry.path();
                if path.is_file() && has_valid_extension(path, &self.config.extensions) {
                    image_files.push(path.to_path_buf());
                }
            }
        }

        // Sort for consistent processing order
        image_files.sort();
        image_files.dedup();

        verbose_println(
            self.config.verbose,
            &format!("Found {} image files", image_files.len()),
        );
        Ok(image_files)
    }

    /// Process a batch of images with a progress callback.
    pub fn process_batch<F>(
        &self,
        image_files: &[PathBuf],
        output_dir: &Path,
        progress_callback: F,
    ) -> Vec<Result<OverlayResult>>
    where
        F: Fn(usize) + Send + Sync,
    {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let processed_count = AtomicUsize::new(0);

        image_files
            .par_iter()
            .map(|image_path| {
                let result = self.process_single_image(image_path, output_dir);
                let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                progress_callback(count);
                result
            })
            .collect()
    }

    /// The full pipeline for one image: feature maps, region scoring,
    /// selection, layout fitting, style resolution and rendering.
    pub fn process_single_image(
        &self,
        input_path: &Path,
        output_dir: &Path,
    ) -> Result<OverlayResult> {
        let started = Instant::now();

        let img = image::open(input_path)
            .with_context(|| format!("Failed to open image '{}'", input_path.display()))?
            .to_rgb8();

        let maps = FeatureMaps::compute(&img, self.config.saliency_map.as_deref())
            .with_context(|| format!("Feature analysis failed for '{}'", input_path.display()))?;

        let placements =
            analyze_regions(&img, &maps, self.config.custom_box, &self.config.weights)?;
        let chosen = select_placement(&placements, self.config.preferred_position)?;
        let behind = self.config.behind_subject.resolve(&maps.saliency, &chosen.bbox);

        let base_size = self
            .config
            .base_font_size
            .unwrap_or(chosen.recommended_font_size);
        let layout = choose_optimal_layout(
            &self.fonts,
            &self.config.text,
            &chosen.bbox,
            base_size,
            &self.config.policy,
        );

        verbose_println(
            self.config.verbose,
            &format!(
                "{}: position={} score={:.3} orientation={:?} size={} lines={} behind={}",
                input_path.display(),
                chosen.position,
                chosen.score,
                layout.orientation,
                layout.font_size,
                layout.lines.len(),
                behind
            ),
        );

        let output_path = if self.config.json_only {
            let output_path = output_dir.join(derived_file_name(input_path, "analysis", "json"));
            let report = AnalysisReport {
                image: input_path.display().to_string(),
                width: img.width(),
                height: img.height(),
                selected: chosen.position,
                behind_subject: behind,
                layout: &layout,
                placements: &placements,
            };
            let file = File::create(&output_path).with_context(|| {
                format!("Failed to create analysis file '{}'", output_path.display())
            })?;
            serde_json::to_writer_pretty(file, &report)
                .context("Failed to serialize analysis")?;
            output_path
        } else {
            let style = self.resolve_style(chosen)?;
            let rendered = render_overlay(
                &img,
                &chosen.bbox,
                &layout,
                &style,
                &self.fonts,
                &maps.saliency,
                behind,
            );
            let output_path = derived_output_path(input_path, output_dir);
            rendered.save(&output_path).with_context(|| {
                format!("Failed to save image '{}'", output_path.display())
            })?;
            output_path
        };

        Ok(OverlayResult {
            input_path: input_path.to_path_buf(),
            output_path,
            position: chosen.position,
            score: chosen.score,
            orientation: layout.orientation,
            font_size: layout.font_size,
            line_count: layout.lines.len(),
            behind_subject: behind,
            elapsed: started.elapsed(),
        })
    }

    /// Base style from the style file when given, otherwise the top
    /// contrast-ranked recommendation for the region. Command-line
    /// overrides win either way.
    fn resolve_style(&self, chosen: &PlacementOption) -> Result<TextStyleConfig> {
        let base = match &self.file_style {
            Some(style) => style.clone(),
            None => recommend_styles(chosen.bg_color, chosen.recommended_font_size, 1)
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("Empty style palette"))?,
        };
        Ok(base.with_overrides(&self.config.overrides))
    }
}

/// An explicit `--font` wins; a style file's font comes next; the
/// default curated font (the recommender's first pick) closes the gap.
fn resolve_font_spec(explicit: Option<&str>, file_style: Option<&TextStyleConfig>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| file_style.map(|style| style.font.clone()))
        .unwrap_or_else(|| DEFAULT_FONT.to_string())
}

fn load_style_file(path: &Path) -> Result<TextStyleConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read style file '{}'", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Style file '{}' is not valid JSON", path.display()))?;
    Ok(TextStyleConfig::from_loose_config(&value)?)
}

/// `photo.jpg` -> `photo_overlay.jpg`, preserving the input extension.
fn derived_output_path(input_path: &Path, output_dir: &Path) -> PathBuf {
    let extension = input_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png");
    output_dir.join(derived_file_name(input_path, "overlay", extension))
}

fn derived_file_name(input_path: &Path, suffix: &str, extension: &str) -> String {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    format!("{}_{}.{}", stem, suffix, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_keeps_the_input_extension() {
        let path = derived_output_path(Path::new("/photos/sunset.webp"), Path::new("/out"));
        assert_eq!(path, PathBuf::from("/out/sunset_overlay.webp"));
    }

    #[test]
    fn output_name_falls_back_to_png_without_extension() {
        let path = derived_output_path(Path::new("/photos/sunset"), Path::new("/out"));
        assert_eq!(path, PathBuf::from("/out/sunset_overlay.png"));
    }

    #[test]
    fn analysis_name_uses_json_extension() {
        let name = derived_file_name(Path::new("a/b/holiday.JPG"), "analysis", "json");
        assert_eq!(name, "holiday_analysis.json");
    }

    #[test]
    fn font_spec_prefers_explicit_then_style_file() {
        let file_style = TextStyleConfig {
            font: "Montserrat-SemiBold".into(),
            font_size: 24,
            text_color: None,
            bg_color: [0, 0, 0],
            opacity: 0.9,
            blend_mode: crate::style::BlendMode::Overlay,
            shadow: true,
        };

        assert_eq!(
            resolve_font_spec(Some("DejaVuSans"), Some(&file_style)),
            "DejaVuSans"
        );
        assert_eq!(
            resolve_font_spec(None, Some(&file_style)),
            "Montserrat-SemiBold"
        );
        assert_eq!(resolve_font_spec(None, None), DEFAULT_FONT);
    }
}
