// pixkit/src/processors/resizer.rs
use crate::core::{ImageToolError, ResizeAlgorithm, Result};
use image::{imageops, imageops::FilterType, DynamicImage, GenericImageView, Rgba, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeMode {
    /// Fit inside the box keeping the aspect ratio; a zero side is derived.
    Fit(u32, u32),
    /// Exactly this size, ignoring the aspect ratio; a zero side keeps the original.
    Exact(u32, u32),
    /// Percentage of the original size.
    Scale(f32),
    Width(u32),
    Height(u32),
}

impl ResizeMode {
    pub fn from_options(width: u32, height: u32, scale: f32, keep_aspect: bool) -> Self {
        if scale > 0.0 {
            ResizeMode::Scale(scale)
        } else if width > 0 && height > 0 {
            if keep_aspect {
                ResizeMode::Fit(width, height)
            } else {
                ResizeMode::Exact(width, height)
            }
        } else if width > 0 {
            ResizeMode::Width(width)
        } else {
            ResizeMode::Height(height)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let too_large = |v: u32| v > 100_000;
        match *self {
            ResizeMode::Scale(scale) if !(scale > 0.0 && scale <= 10_000.0) => {
                Err(ImageToolError::InvalidParameter(
                    "Scale must be between 0 and 10000 percent".to_string(),
                ))
            }
            ResizeMode::Fit(0, 0)
            | ResizeMode::Exact(0, 0)
            | ResizeMode::Width(0)
            | ResizeMode::Height(0) => Err(ImageToolError::InvalidParameter(
                "At least one dimension must be specified".to_string(),
            )),
            ResizeMode::Fit(w, h) | ResizeMode::Exact(w, h) if too_large(w) || too_large(h) => {
                Err(ImageToolError::InvalidParameter(
                    "Dimensions too large (max 100,000 pixels)".to_string(),
                ))
            }
            ResizeMode::Width(v) | ResizeMode::Height(v) if too_large(v) => {
                Err(ImageToolError::InvalidParameter(
                    "Dimensions too large (max 100,000 pixels)".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

pub struct Resizer {
    algorithm: ResizeAlgorithm,
}

impl Resizer {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn resize(&self, image: &DynamicImage, mode: ResizeMode) -> DynamicImage {
        let (width, height) = Self::target_dimensions(image.dimensions(), mode);

        if (width, height) == image.dimensions() {
            log::debug!("Image dimensions unchanged, skipping resize");
            return image.clone();
        }

        log::debug!(
            "Resizing image from {}x{} to {}x{}",
            image.width(),
            image.height(),
            width,
            height
        );

        image.resize_exact(width, height, self.filter_type())
    }

    /// Scales the image to fit a `side` x `side` square and centers it on a
    /// transparent canvas of that size.
    pub fn contain_square(&self, image: &DynamicImage, side: u32) -> RgbaImage {
        let fitted = self.resize(image, ResizeMode::Fit(side, side)).to_rgba8();
        let mut canvas = RgbaImage::from_pixel(side, side, Rgba([0, 0, 0, 0]));
        let x = (side - fitted.width().min(side)) / 2;
        let y = (side - fitted.height().min(side)) / 2;
        imageops::overlay(&mut canvas, &fitted, x as i64, y as i64);
        canvas
    }

    /// Output size of `mode` applied to an image of size `(orig_width, orig_height)`.
    pub fn target_dimensions(
        (orig_width, orig_height): (u32, u32),
        mode: ResizeMode,
    ) -> (u32, u32) {
        match mode {
            ResizeMode::Fit(w, h) => Self::preserve_aspect(orig_width, orig_height, w, h),
            ResizeMode::Exact(w, h) => (
                if w == 0 { orig_width } else { w },
                if h == 0 { orig_height } else { h },
            ),
            ResizeMode::Scale(scale) => {
                if scale <= 0.0 {
                    return (orig_width, orig_height);
                }
                let new_width = (orig_width as f32 * scale / 100.0).round() as u32;
                let new_height = (orig_height as f32 * scale / 100.0).round() as u32;
                (new_width.max(1), new_height.max(1))
            }
            ResizeMode::Width(width) => Self::preserve_aspect(orig_width, orig_height, width, 0),
            ResizeMode::Height(height) => Self::preserve_aspect(orig_width, orig_height, 0, height),
        }
    }

    fn preserve_aspect(orig_w: u32, orig_h: u32, target_w: u32, target_h: u32) -> (u32, u32) {
        if (target_w == 0 && target_h == 0) || orig_w == 0 || orig_h == 0 {
            return (orig_w, orig_h);
        }

        if target_w == 0 {
            let ratio = target_h as f32 / orig_h as f32;
            let width = (orig_w as f32 * ratio).round() as u32;
            return (width.max(1), target_h);
        }

        if target_h == 0 {
            let ratio = target_w as f32 / orig_w as f32;
            let height = (orig_h as f32 * ratio).round() as u32;
            return (target_w, height.max(1));
        }

        let ratio = (target_w as f32 / orig_w as f32).min(target_h as f32 / orig_h as f32);

        let new_w = ((orig_w as f32 * ratio).round() as u32).min(target_w);
        let new_h = ((orig_h as f32 * ratio).round() as u32).min(target_h);

        (new_w.max(1), new_h.max(1))
    }

    pub fn filter_type(&self) -> FilterType {
        match self.algorithm {
            ResizeAlgorithm::Nearest => FilterType::Nearest,
            ResizeAlgorithm::Bilinear => FilterType::Triangle,
            ResizeAlgorithm::Bicubic => FilterType::CatmullRom,
            ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_keeps_aspect_inside_box() {
        assert_eq!(Resizer::target_dimensions((400, 200), ResizeMode::Fit(100, 100)), (100, 50));
        assert_eq!(Resizer::target_dimensions((200, 400), ResizeMode::Fit(100, 0)), (100, 200));
    }

    #[test]
    fn single_side_derives_the_other() {
        assert_eq!(Resizer::target_dimensions((300, 150), ResizeMode::Width(60)), (60, 30));
        assert_eq!(Resizer::target_dimensions((300, 150), ResizeMode::Height(15)), (30, 15));
    }

    #[test]
    fn scale_is_a_percentage_and_never_zero() {
        assert_eq!(Resizer::target_dimensions((200, 100), ResizeMode::Scale(50.0)), (100, 50));
        assert_eq!(Resizer::target_dimensions((3, 3), ResizeMode::Scale(1.0)), (1, 1));
    }

    #[test]
    fn exact_ignores_aspect() {
        assert_eq!(Resizer::target_dimensions((10, 10), ResizeMode::Exact(30, 0)), (30, 10));
    }

    #[test]
    fn contain_square_pads_to_square() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([9, 9, 9, 255])));
        let square = Resizer::new(ResizeAlgorithm::Nearest).contain_square(&image, 16);
        assert_eq!(square.dimensions(), (16, 16));
        assert_eq!(square.get_pixel(0, 0)[3], 0);
        assert_eq!(square.get_pixel(8, 8)[3], 255);
    }

    #[test]
    fn options_pick_a_mode() {
        assert_eq!(ResizeMode::from_options(0, 0, 25.0, true), ResizeMode::Scale(25.0));
        assert_eq!(ResizeMode::from_options(10, 20, 0.0, false), ResizeMode::Exact(10, 20));
        assert!(ResizeMode::from_options(0, 0, 0.0, true).validate().is_err());
    }
}
