use image::{imageops, Rgb, RgbImage};

/// Owned RGB raster for one decoded video frame.
///
/// The pixel payload is fully copied out of the decoder's native buffers at
/// construction, so buffer reuse by later decode calls cannot touch it.
#[derive(Clone)]
pub struct RgbRaster {
    image: RgbImage,
}

impl RgbRaster {
    /// Build a raster from a packed RGB24 plane with the given row stride.
    ///
    /// FFmpeg pads scaler output rows to alignment boundaries, so the stride
    /// may exceed `width * 3`; each row is copied without its padding.
    /// Returns `None` if the plane is too short for the stated dimensions.
    pub fn from_plane(width: u32, height: u32, data: &[u8], stride: usize) -> Option<Self> {
        let row_len = width as usize * 3;
        if stride < row_len || data.len() < stride * (height as usize).saturating_sub(1) + row_len
        {
            return None;
        }
        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            pixels.extend_from_slice(&data[start..start + row_len]);
        }
        RgbImage::from_raw(width, height, pixels).map(|image| Self { image })
    }

    /// Build a single-color raster. Used by fixtures and tests.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb(rgb)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Reduced representation for histogram work, longest side capped at
    /// `max_dim`, aspect ratio preserved.
    pub fn thumbnail(&self, max_dim: u32) -> RgbImage {
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 || (w <= max_dim && h <= max_dim) {
            return self.image.clone();
        }
        let scale = (max_dim as f32 / w as f32).min(max_dim as f32 / h as f32);
        let tw = ((w as f32 * scale).round() as u32).max(1);
        let th = ((h as f32 * scale).round() as u32).max(1);
        imageops::thumbnail(&self.image, tw, th)
    }

    /// Release the pixel payload.
    pub fn clear(&mut self) {
        self.image = RgbImage::new(0, 0);
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}

impl std::fmt::Debug for RgbRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbRaster")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_plane_strips_stride_padding() {
        // 2x2 RGB rows padded to 8 bytes each
        let data: Vec<u8> = vec![
            1, 2, 3, 4, 5, 6, 0, 0, // row 0 + padding
            7, 8, 9, 10, 11, 12, 0, 0, // row 1 + padding
        ];
        let raster = RgbRaster::from_plane(2, 2, &data, 8).unwrap();
        assert_eq!(raster.width(), 2);
        assert_eq!(raster.height(), 2);
        assert_eq!(raster.image().get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(raster.image().get_pixel(1, 1).0, [10, 11, 12]);
    }

    #[test]
    fn test_from_plane_rejects_short_buffer() {
        let data = vec![0u8; 10];
        assert!(RgbRaster::from_plane(4, 4, &data, 12).is_none());
    }

    #[test]
    fn test_thumbnail_caps_longest_side() {
        let raster = RgbRaster::solid(600, 300, [10, 20, 30]);
        let thumb = raster.thumbnail(150);
        assert_eq!(thumb.dimensions(), (150, 75));
        assert_eq!(thumb.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_thumbnail_leaves_small_images_alone() {
        let raster = RgbRaster::solid(100, 80, [0, 0, 0]);
        assert_eq!(raster.thumbnail(150).dimensions(), (100, 80));
    }

    #[test]
    fn test_clear_releases_payload() {
        let mut raster = RgbRaster::solid(16, 16, [1, 1, 1]);
        assert!(!raster.is_empty());
        raster.clear();
        assert!(raster.is_empty());
    }
}
