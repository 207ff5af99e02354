//! Subdivided color histogram used for cut detection

use image::RgbImage;

use crate::frame::RgbRaster;

/// Spatial subdivisions per axis.
const GRID: usize = 3;
/// Quantization levels per color channel.
const LEVELS: usize = 4;
/// Joint RGB bins per grid cell.
const CELL_BINS: usize = LEVELS * LEVELS * LEVELS;
/// Frames are reduced to at most this dimension before binning.
const THUMBNAIL_MAX: u32 = 150;

/// Normalized color histogram over a 3x3 spatial subdivision of a frame's
/// thumbnail representation.
///
/// Each cell holds a joint RGB distribution quantized to 4 levels per
/// channel. Cell distributions are normalized by the cell's pixel count and
/// weighted equally, so the full vector sums to 1 for any non-empty image
/// and small localized changes move the distance less than full-frame ones.
#[derive(Debug, Clone)]
pub struct SpatialHistogram {
    bins: Vec<f64>,
}

impl SpatialHistogram {
    /// Compute the histogram of a raster's thumbnail representation.
    pub fn of(raster: &RgbRaster) -> Self {
        Self::of_image(&raster.thumbnail(THUMBNAIL_MAX))
    }

    fn of_image(image: &RgbImage) -> Self {
        let mut bins = vec![0.0f64; GRID * GRID * CELL_BINS];
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Self { bins };
        }

        let mut counts = [0u64; GRID * GRID];
        for (x, y, pixel) in image.enumerate_pixels() {
            let cell_x = x as usize * GRID / width as usize;
            let cell_y = y as usize * GRID / height as usize;
            let cell = cell_y * GRID + cell_x;
            let r = pixel[0] as usize * LEVELS / 256;
            let g = pixel[1] as usize * LEVELS / 256;
            let b = pixel[2] as usize * LEVELS / 256;
            bins[cell * CELL_BINS + (r * LEVELS + g) * LEVELS + b] += 1.0;
            counts[cell] += 1;
        }

        for cell in 0..GRID * GRID {
            if counts[cell] == 0 {
                continue;
            }
            let norm = counts[cell] as f64 * (GRID * GRID) as f64;
            for bin in &mut bins[cell * CELL_BINS..(cell + 1) * CELL_BINS] {
                *bin /= norm;
            }
        }
        Self { bins }
    }

    /// Euclidean distance between two histograms.
    pub fn distance(&self, other: &Self) -> f64 {
        self.bins
            .iter()
            .zip(&other.bins)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}
