// pixkit/src/processors/watermark.rs
use crate::core::{ImageToolError, Result};
use crate::processors::geometry;
use crate::processors::text::{render_text_layer, TextStyle};
use ab_glyph::FontArc;
use image::{imageops, imageops::FilterType, DynamicImage, Rgba, RgbaImage};

#[derive(Debug, Clone)]
pub enum WatermarkContent {
    Text {
        text: String,
        font: FontArc,
        size: f32,
        color: Rgba<u8>,
    },
    Image {
        image: RgbaImage,
        /// Width of the overlay as a percentage of the base image width.
        width_percent: f32,
    },
}

#[derive(Debug, Clone)]
pub struct Watermark {
    pub content: WatermarkContent,
    /// Horizontal position across the free space: 0 = left, 100 = right.
    pub x_percent: f32,
    /// Vertical position across the free space: 0 = top, 100 = bottom.
    pub y_percent: f32,
    pub margin: u32,
    pub opacity: f32,
    pub rotation: f32,
    /// When set, the layer repeats over the whole image with this gap.
    pub tile_gap: Option<u32>,
}

impl Watermark {
    pub fn new(content: WatermarkContent) -> Self {
        Self {
            content,
            x_percent: 100.0,
            y_percent: 100.0,
            margin: 16,
            opacity: 0.5,
            rotation: 0.0,
            tile_gap: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let WatermarkContent::Text { text, size, .. } = &self.content {
            if text.trim().is_empty() {
                return Err(ImageToolError::InvalidParameter(
                    "Watermark text is empty".to_string(),
                ));
            }
            if *size <= 0.0 {
                return Err(ImageToolError::InvalidParameter(
                    "Font size must be positive".to_string(),
                ));
            }
        }
        if let WatermarkContent::Image { width_percent, .. } = &self.content {
            if *width_percent <= 0.0 {
                return Err(ImageToolError::InvalidParameter(
                    "Overlay width must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Builds the overlay layer for a base image of width `base_width`, with
    /// rotation and opacity applied.
    pub fn build_layer(&self, base_width: u32) -> RgbaImage {
        let layer = match &self.content {
            WatermarkContent::Text { text, font, size, color } => render_text_layer(
                font,
                text,
                TextStyle {
                    size: *size,
                    fill: *color,
                    outline: None,
                },
            ),
            WatermarkContent::Image { image, width_percent } => {
                let target_w = ((base_width as f32 * width_percent.clamp(0.0, 100.0) / 100.0)
                    .round() as u32)
                    .max(1);
                let target_h = ((image.height() as f32 * target_w as f32
                    / image.width().max(1) as f32)
                    .round() as u32)
                    .max(1);
                imageops::resize(image, target_w, target_h, FilterType::Triangle)
            }
        };

        let mut layer = if self.rotation.rem_euclid(360.0) != 0.0 {
            geometry::rotate(&DynamicImage::ImageRgba8(layer), self.rotation, Rgba([0, 0, 0, 0]))
                .to_rgba8()
        } else {
            layer
        };

        apply_opacity(&mut layer, self.opacity);
        layer
    }
}

pub fn apply_opacity(layer: &mut RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity >= 1.0 {
        return;
    }
    for pixel in layer.pixels_mut() {
        pixel[3] = (pixel[3] as f32 * opacity).round() as u8;
    }
}

/// Top-left position of a `layer` sized overlay inside `base`. The percentages
/// move the layer across the space left after margins; the result never puts
/// the layer outside the base when it fits.
pub fn place(
    (base_w, base_h): (u32, u32),
    (layer_w, layer_h): (u32, u32),
    x_percent: f32,
    y_percent: f32,
    margin: u32,
) -> (i64, i64) {
    let axis = |base: u32, layer: u32, percent: f32| -> i64 {
        let base = base as i64;
        let layer = layer as i64;
        let margin = margin as i64;
        let free = (base - layer - 2 * margin).max(0) as f32;
        let pos = margin + (free * percent.clamp(0.0, 100.0) / 100.0).round() as i64;
        let max = base - layer;
        if max >= 0 {
            pos.clamp(0, max)
        } else {
            // Wider than the base: center it.
            max / 2
        }
    };

    (
        axis(base_w, layer_w, x_percent),
        axis(base_h, layer_h, y_percent),
    )
}

/// Top-left positions covering `base` with copies of `layer` spaced by `gap`.
pub fn tile_positions(
    (base_w, base_h): (u32, u32),
    (layer_w, layer_h): (u32, u32),
    gap: u32,
) -> Vec<(i64, i64)> {
    let step_x = (layer_w + gap).max(1) as i64;
    let step_y = (layer_h + gap).max(1) as i64;
    let mut positions = Vec::new();

    let mut y = 0i64;
    while y < base_h as i64 {
        let mut x = 0i64;
        while x < base_w as i64 {
            positions.push((x, y));
            x += step_x;
        }
        y += step_y;
    }
    positions
}

pub fn apply_watermark(base: &RgbaImage, watermark: &Watermark) -> Result<RgbaImage> {
    watermark.validate()?;

    let layer = watermark.build_layer(base.width());
    let mut out = base.clone();

    match watermark.tile_gap {
        Some(gap) => {
            let positions = tile_positions(base.dimensions(), layer.dimensions(), gap);
            log::debug!("Tiling watermark {} times", positions.len());
            for (x, y) in positions {
                imageops::overlay(&mut out, &layer, x, y);
            }
        }
        None => {
            let (x, y) = place(
                base.dimensions(),
                layer.dimensions(),
                watermark.x_percent,
                watermark.y_percent,
                watermark.margin,
            );
            log::debug!(
                "Placing {}x{} watermark at ({}, {})",
                layer.width(),
                layer.height(),
                x,
                y
            );
            imageops::overlay(&mut out, &layer, x, y);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay_mark() -> Watermark {
        let logo = RgbaImage::from_pixel(10, 5, Rgba([255, 0, 0, 255]));
        Watermark {
            opacity: 1.0,
            margin: 0,
            ..Watermark::new(WatermarkContent::Image {
                image: logo,
                width_percent: 50.0,
            })
        }
    }

    #[test]
    fn placement_spans_free_space() {
        assert_eq!(place((100, 50), (20, 10), 0.0, 0.0, 0), (0, 0));
        assert_eq!(place((100, 50), (20, 10), 100.0, 100.0, 0), (80, 40));
        assert_eq!(place((100, 50), (20, 10), 50.0, 50.0, 0), (40, 20));
        assert_eq!(place((100, 50), (20, 10), 100.0, 0.0, 10), (70, 10));
    }

    #[test]
    fn placement_clamps_percentages() {
        assert_eq!(place((100, 50), (20, 10), 250.0, -20.0, 0), (80, 0));
        assert_eq!(place((10, 10), (30, 10), 0.0, 0.0, 0), (-10, 0));
    }

    #[test]
    fn image_overlay_scales_to_base_width() {
        let base = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 255, 255]));
        let out = apply_watermark(&base, &overlay_mark()).unwrap();
        // 50% of 40 px wide, 10 px tall, bottom-right corner
        let red = |x, y| {
            let p = out.get_pixel(x, y);
            p[0] > 240 && p[2] < 16
        };
        assert!(red(39, 39));
        assert!(red(20, 30));
        assert!(!red(19, 39));
        assert!(!red(39, 29));
    }

    #[test]
    fn opacity_scales_alpha() {
        let mut layer = RgbaImage::from_pixel(2, 2, Rgba([1, 1, 1, 200]));
        apply_opacity(&mut layer, 0.5);
        assert_eq!(layer.get_pixel(0, 0)[3], 100);
    }

    #[test]
    fn tiles_cover_the_base() {
        let positions = tile_positions((100, 40), (30, 10), 10);
        assert_eq!(positions.len(), 3 * 2);
        assert_eq!(positions[1], (40, 0));
        assert_eq!(positions[3], (0, 20));
    }

    #[test]
    fn zero_width_overlay_is_rejected() {
        let mark = Watermark::new(WatermarkContent::Image {
            image: RgbaImage::new(1, 1),
            width_percent: 0.0,
        });
        assert!(mark.validate().is_err());
    }

    const FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSans-Bold.ttf");

    #[test]
    fn text_mark_lands_bottom_right_at_half_opacity() {
        let font = crate::processors::text::load_font(std::path::Path::new(FONT)).unwrap();
        let base = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 255, 255]));
        let mark = Watermark {
            margin: 10,
            opacity: 0.5,
            ..Watermark::new(WatermarkContent::Text {
                text: "PIX".to_string(),
                font,
                size: 24.0,
                color: Rgba([255, 255, 255, 255]),
            })
        };
        let out = apply_watermark(&base, &mark).unwrap();

        let mut touched = Vec::new();
        for (x, y, pixel) in out.enumerate_pixels() {
            if pixel != base.get_pixel(x, y) {
                touched.push((x, y, *pixel));
            }
        }
        assert!(!touched.is_empty());
        assert!(touched.iter().all(|&(x, y, _)| x >= 100 && y >= 50 && x < 190 && y < 90));
        assert!(touched.iter().all(|(_, _, p)| p[0] <= 140 && p[2] >= 100));
        assert!(touched.iter().any(|(_, _, p)| p[0] >= 100));
    }

    #[test]
    fn rotated_layer_grows_to_its_bounds() {
        let mark = Watermark {
            rotation: 45.0,
            content: WatermarkContent::Image {
                image: RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])),
                width_percent: 10.0,
            },
            ..overlay_mark()
        };

        let layer = mark.build_layer(100);
        assert_eq!(layer.dimensions(), (15, 15));
        assert_eq!(layer.get_pixel(0, 0)[3], 0);
        assert!(layer.get_pixel(7, 7)[3] > 250);
    }
}
