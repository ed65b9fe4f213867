//! Feature-map production.
//!
//! The analysis stage consumes three per-pixel maps aligned to the image
//! grid: saliency (subject likelihood), edge strength, and local texture
//! variance. Edge and variance are always computed here; saliency comes
//! from an externally produced map when one is supplied, otherwise from a
//! fast center-prior/contrast estimate.

use anyhow::{Context, Result};
use image::RgbImage;
use std::path::Path;

use crate::analysis::regions::BBox;

/// A single-channel float map aligned 1:1 to image pixel coordinates.
#[derive(Debug, Clone)]
pub struct FeatureMap {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl FeatureMap {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), (width as usize) * (height as usize));
        Self { width, height, data }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> f32) -> Self {
        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Arithmetic mean over the box slice, `None` when the slice is empty
    /// or falls outside the map.
    pub fn mean_over(&self, bbox: &BBox) -> Option<f32> {
        if bbox.x1 > self.width || bbox.y1 > self.height {
            return None;
        }
        let count = bbox.area();
        if count == 0 {
            return None;
        }
        let mut sum = 0.0f64;
        for y in bbox.y0..bbox.y1 {
            for x in bbox.x0..bbox.x1 {
                sum += self.get(x, y) as f64;
            }
        }
        Some((sum / count as f64) as f32)
    }

    /// Fraction of pixels in the box slice with value strictly above
    /// `threshold`. `None` for an empty or out-of-bounds slice.
    pub fn fraction_above(&self, bbox: &BBox, threshold: f32) -> Option<f32> {
        if bbox.x1 > self.width || bbox.y1 > self.height {
            return None;
        }
        let count = bbox.area();
        if count == 0 {
            return None;
        }
        let mut above = 0u64;
        for y in bbox.y0..bbox.y1 {
            for x in bbox.x0..bbox.x1 {
                if self.get(x, y) > threshold {
                    above += 1;
                }
            }
        }
        Some(above as f32 / count as f32)
    }
}

/// The three feature maps one analysis call works from. Read-only once
/// built.
#[derive(Debug, Clone)]
pub struct FeatureMaps {
    pub saliency: FeatureMap,
    pub edge: FeatureMap,
    pub variance: FeatureMap,
}

impl FeatureMaps {
    /// Compute all maps from the image, using `saliency_path` when given
    /// and the built-in estimate otherwise.
    pub fn compute(img: &RgbImage, saliency_path: Option<&Path>) -> Result<Self> {
        let saliency = match saliency_path {
            Some(path) => load_saliency_map(path, img.width(), img.height())?,
            None => estimate_saliency(img),
        };
        Ok(Self {
            saliency,
            edge: edge_map(img),
            variance: local_variance(img, 15),
        })
    }
}

/// Perceptual luma (ITU-R BT.709), in [0,1].
#[inline]
fn luma(pixel: &image::Rgb<u8>) -> f32 {
    (pixel[0] as f32 * 0.2126 + pixel[1] as f32 * 0.7152 + pixel[2] as f32 * 0.0722) / 255.0
}

fn luma_plane(img: &RgbImage) -> Vec<f32> {
    img.pixels().map(luma).collect()
}

/// Gradient-magnitude edge map (forward differences on the luma plane).
///
/// Values are non-negative; around 0 on flat regions, up to ~2 across a
/// full black-to-white step in both directions.
pub fn edge_map(img: &RgbImage) -> FeatureMap {
    let width = img.width();
    let height = img.height();
    let plane = luma_plane(img);
    let w = width as usize;

    let data = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| {
            let idx = (y as usize) * w + (x as usize);
            let center = plane[idx];
            let gx = if x + 1 < width {
                (plane[idx + 1] - center).abs()
            } else {
                0.0
            };
            let gy = if y + 1 < height {
                (plane[idx + w] - center).abs()
            } else {
                0.0
            };
            gx + gy
        })
        .collect();

    FeatureMap::new(width, height, data)
}

/// Local luma variance over a `ksize` x `ksize` window, via summed-area
/// tables so the cost is independent of the window size.
pub fn local_variance(img: &RgbImage, ksize: u32) -> FeatureMap {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let plane = luma_plane(img);
    let radius = (ksize / 2) as i64;

    // Integral images of luma and luma^2, with a zero row/column border.
    let stride = width + 1;
    let mut sum = vec![0.0f64; stride * (height + 1)];
    let mut sq_sum = vec![0.0f64; stride * (height + 1)];
    for y in 0..height {
        for x in 0..width {
            let v = plane[y * width + x] as f64;
            let i = (y + 1) * stride + (x + 1);
            sum[i] = v + sum[i - 1] + sum[i - stride] - sum[i - stride - 1];
            sq_sum[i] = v * v + sq_sum[i - 1] + sq_sum[i - stride] - sq_sum[i - stride - 1];
        }
    }

    let window = |table: &[f64], x0: usize, y0: usize, x1: usize, y1: usize| {
        table[y1 * stride + x1] + table[y0 * stride + x0]
            - table[y0 * stride + x1]
            - table[y1 * stride + x0]
    };

    let mut data = Vec::with_capacity(width * height);
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let x0 = (x - radius).max(0) as usize;
            let y0 = (y - radius).max(0) as usize;
            let x1 = ((x + radius + 1).min(width as i64)) as usize;
            let y1 = ((y + radius + 1).min(height as i64)) as usize;
            let n = ((x1 - x0) * (y1 - y0)) as f64;
            let s = window(&sum, x0, y0, x1, y1);
            let s2 = window(&sq_sum, x0, y0, x1, y1);
            let variance = (s2 / n - (s / n) * (s / n)).max(0.0);
            data.push(variance as f32);
        }
    }

    FeatureMap::new(img.width(), img.height(), data)
}

/// Fast saliency estimate used when no model-produced map is available.
///
/// Combines a center prior (subjects are usually framed near the middle)
/// with local contrast against the global mean luma. Output is in [0,1].
pub fn estimate_saliency(img: &RgbImage) -> FeatureMap {
    let width = img.width();
    let height = img.height();
    let plane = luma_plane(img);
    let mean = plane.iter().copied().sum::<f32>() / plane.len().max(1) as f32;

    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    // Gaussian falloff reaching ~0.3 at the image corners
    let sigma_x = width as f32 * 0.35;
    let sigma_y = height as f32 * 0.35;

    let w = width as usize;
    FeatureMap::from_fn(width, height, |x, y| {
        let dx = (x as f32 - cx) / sigma_x;
        let dy = (y as f32 - cy) / sigma_y;
        let center_prior = (-0.5 * (dx * dx + dy * dy)).exp();
        let contrast = ((plane[(y as usize) * w + (x as usize)] - mean).abs() * 2.0).min(1.0);
        (center_prior * contrast).clamp(0.0, 1.0)
    })
}

/// Load an externally produced saliency map (grayscale image) and align
/// it to the target pixel grid, scaling values to [0,1].
pub fn load_saliency_map(path: &Path, width: u32, height: u32) -> Result<FeatureMap> {
    let map_img = image::open(path)
        .with_context(|| format!("Failed to open saliency map: {}", path.display()))?
        .to_luma8();

    let resized = if map_img.dimensions() == (width, height) {
        map_img
    } else {
        image::imageops::resize(&map_img, width, height, image::imageops::FilterType::Triangle)
    };

    let data = resized.pixels().map(|p| p[0] as f32 / 255.0).collect();
    Ok(FeatureMap::new(width, height, data))
}
