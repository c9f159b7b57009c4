// pixkit/src/processors/color_replace.rs
use image::{Rgba, RgbaImage};

/// Largest Euclidean distance between two RGB colors.
pub const MAX_RGB_DISTANCE: f32 = 441.673;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorReplace {
    pub source: Rgba<u8>,
    pub target: Rgba<u8>,
    /// Pixels at most this far from `source` are replaced outright.
    pub tolerance: f32,
    /// Width of the soft edge past `tolerance`, as a fraction of `tolerance`.
    pub feather: f32,
}

impl Default for ColorReplace {
    fn default() -> Self {
        Self {
            source: Rgba([255, 255, 255, 255]),
            target: Rgba([0, 0, 0, 0]),
            tolerance: 30.0,
            feather: 0.5,
        }
    }
}

impl ColorReplace {
    pub fn clamped(&self) -> Self {
        Self {
            tolerance: self.tolerance.clamp(0.0, MAX_RGB_DISTANCE),
            feather: self.feather.clamp(0.0, 1.0),
            ..*self
        }
    }

    /// How much of the target color goes into a pixel at `distance` from the
    /// source color: 1 inside the tolerance, fading linearly to 0 across the
    /// feather band.
    pub fn blend_factor(&self, distance: f32) -> f32 {
        if distance <= self.tolerance {
            return 1.0;
        }
        let band = self.tolerance * self.feather;
        if band <= 0.0 || distance >= self.tolerance + band {
            return 0.0;
        }
        1.0 - (distance - self.tolerance) / band
    }
}

pub fn color_distance(a: Rgba<u8>, b: Rgba<u8>) -> f32 {
    let dr = a[0] as f32 - b[0] as f32;
    let dg = a[1] as f32 - b[1] as f32;
    let db = a[2] as f32 - b[2] as f32;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Replaces pixels close to `params.source` with `params.target`, blending
/// pixels in the feather band.
pub fn replace_color(image: &RgbaImage, params: ColorReplace) -> RgbaImage {
    let params = params.clamped();
    let mut out = image.clone();
    let mut touched = 0usize;

    for pixel in out.pixels_mut() {
        let factor = params.blend_factor(color_distance(*pixel, params.source));
        if factor <= 0.0 {
            continue;
        }
        touched += 1;
        for channel in 0..4 {
            let from = pixel[channel] as f32;
            let to = params.target[channel] as f32;
            pixel[channel] = (from + (to - from) * factor).round() as u8;
        }
    }

    log::debug!(
        "Color replace touched {} of {} pixels",
        touched,
        image.width() as usize * image.height() as usize
    );
    out
}
