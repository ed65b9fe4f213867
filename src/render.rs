//! Final overlay rendering: draw the fitted lines into the chosen box,
//! apply opacity and blend mode, and optionally restore subject pixels
//! over the text for behind-subject compositing.

use ab_glyph::PxScale;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;

use crate::analysis::regions::BBox;
use crate::fonts::FontContext;
use crate::layout::{LayoutResult, TextMeasure};
use crate::style::{BlendMode, TextStyleConfig};
use crate::vision::FeatureMap;

/// Pixels above this saliency stay on top of the text layer when
/// behind-subject compositing is on. Matches the subject threshold used
/// by the auto decision.
const SUBJECT_MASK_THRESHOLD: f32 = 0.5;

/// Render the overlay onto a copy of the image.
///
/// The text (and its shadow, if enabled) is rasterized into a
/// transparent layer first, then composited pixel by pixel so opacity,
/// blend mode and the subject mask apply uniformly.
pub fn render_overlay(
    img: &RgbImage,
    bbox: &BBox,
    layout: &LayoutResult,
    style: &TextStyleConfig,
    fonts: &FontContext,
    saliency: &FeatureMap,
    behind_subject: bool,
) -> RgbImage {
    let mut output = img.clone();
    let layer = rasterize_text_layer(img.width(), img.height(), bbox, layout, style, fonts);

    let text_color = style.effective_text_color();
    let shadow_color = [0u8, 0, 0];

    for (x, y, pixel) in layer.enumerate_pixels() {
        let coverage = pixel[3] as f32 / 255.0;
        if coverage <= 0.0 {
            continue;
        }
        if behind_subject
            && x < saliency.width()
            && y < saliency.height()
            && saliency.get(x, y) > SUBJECT_MASK_THRESHOLD
        {
            continue;
        }

        // The layer's red channel tags shadow (0) vs text (255) pixels.
        let source = if pixel[0] > 127 { text_color } else { shadow_color };
        let base = output.get_pixel(x, y);
        let blended = composite(base.0, source, coverage, style.opacity, style.blend_mode);
        output.put_pixel(x, y, Rgb(blended));
    }

    output
}

/// Draw shadow and text into a transparent layer. Alpha carries glyph
/// coverage; the red channel distinguishes shadow from text pixels.
///
/// Glyphs are sized from the layout's fitted size, not the style's
/// nominal one: the lines were wrapped for the fitted size and only at
/// that size do they stay inside the box.
fn rasterize_text_layer(
    width: u32,
    height: u32,
    bbox: &BBox,
    layout: &LayoutResult,
    style: &TextStyleConfig,
    fonts: &FontContext,
) -> RgbaImage {
    let mut layer: RgbaImage = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let px = layout.font_size as f32;
    let scale = PxScale::from(px);
    let line_height = fonts.line_height(px);

    let total_height = layout.lines.len() as f32 * line_height;
    let start_y = bbox.y0 as f32 + (bbox.height() as f32 - total_height).max(0.0) / 2.0;

    let shadow_offset = (px / 24.0).max(1.0).round() as i32;

    for (index, line) in layout.lines.iter().enumerate() {
        let line_width = fonts.line_width(line, px);
        let x = bbox.x0 as f32 + (bbox.width() as f32 - line_width).max(0.0) / 2.0;
        let y = start_y + index as f32 * line_height;

        if style.shadow {
            draw_text_mut(
                &mut layer,
                Rgba([0, 0, 0, 255]),
                x as i32 + shadow_offset,
                y as i32 + shadow_offset,
                scale,
                fonts.font(),
                line,
            );
        }
        draw_text_mut(
            &mut layer,
            Rgba([255, 255, 255, 255]),
            x as i32,
            y as i32,
            scale,
            fonts.font(),
            line,
        );
    }

    layer
}

/// Blend one pixel of text over the base image.
fn composite(
    base: [u8; 3],
    source: [u8; 3],
    coverage: f32,
    opacity: f32,
    blend_mode: BlendMode,
) -> [u8; 3] {
    let alpha = (coverage * opacity).clamp(0.0, 1.0);
    let mut out = [0u8; 3];
    for channel in 0..3 {
        let b = base[channel] as f32 / 255.0;
        let s = source[channel] as f32 / 255.0;
        let top = match blend_mode {
            BlendMode::Normal => s,
            BlendMode::Overlay => overlay_channel(b, s),
        };
        out[channel] = ((top * alpha + b * (1.0 - alpha)) * 255.0).round() as u8;
    }
    out
}

/// Photoshop-style overlay blend for one normalized channel.
fn overlay_channel(base: f32, top: f32) -> f32 {
    if base < 0.5 {
        2.0 * base * top
    } else {
        1.0 - 2.0 * (1.0 - base) * (1.0 - top)
    }
}
