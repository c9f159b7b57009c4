// pixkit/src/processors/geometry.rs
use crate::core::{ImageToolError, Result};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

/// Pixel rectangle; clamped to the image when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Builds a rectangle from percentages of the image size. Values are
    /// clamped to `0..=100`.
    pub fn from_percent(
        (img_w, img_h): (u32, u32),
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Self {
        let pct = |v: f32, of: u32| ((v.clamp(0.0, 100.0) / 100.0) * of as f32).round() as u32;
        Self {
            x: pct(x, img_w),
            y: pct(y, img_h),
            width: pct(width, img_w),
            height: pct(height, img_h),
        }
    }

    pub fn clamp_to(&self, (img_w, img_h): (u32, u32)) -> Self {
        let x = self.x.min(img_w);
        let y = self.y.min(img_h);
        Self {
            x,
            y,
            width: self.width.min(img_w - x),
            height: self.height.min(img_h - y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CircleCrop {
    /// Defaults to the image center.
    pub center: Option<(u32, u32)>,
    /// Defaults to half the shorter side.
    pub radius: Option<u32>,
}

impl CircleCrop {
    /// Center and radius actually used for an image of the given size. The
    /// radius shrinks so the circle stays inside the image.
    pub fn resolve(&self, (img_w, img_h): (u32, u32)) -> ((u32, u32), u32) {
        let (cx, cy) = self
            .center
            .map(|(x, y)| (x.min(img_w), y.min(img_h)))
            .unwrap_or((img_w / 2, img_h / 2));
        let max_radius = cx.min(cy).min(img_w - cx).min(img_h - cy);
        let radius = self.radius.unwrap_or(img_w.min(img_h) / 2).min(max_radius);
        ((cx, cy), radius)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

pub fn crop(image: &DynamicImage, rect: CropRect) -> Result<DynamicImage> {
    let rect = rect.clamp_to(image.dimensions());
    if rect.width == 0 || rect.height == 0 {
        return Err(ImageToolError::InvalidParameter(format!(
            "Crop area {}x{} at ({}, {}) is empty inside a {}x{} image",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            image.width(),
            image.height()
        )));
    }

    log::debug!(
        "Cropping {}x{} at ({}, {})",
        rect.width,
        rect.height,
        rect.x,
        rect.y
    );
    Ok(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
}

/// Cuts a circle out of the image. The result is a square of side
/// `2 * radius` with everything outside the circle transparent.
pub fn circle_crop(image: &DynamicImage, params: CircleCrop) -> Result<RgbaImage> {
    let ((cx, cy), radius) = params.resolve(image.dimensions());
    if radius == 0 {
        return Err(ImageToolError::InvalidParameter(
            "Circle radius is zero for this image and center".to_string(),
        ));
    }

    let side = radius * 2;
    let mut out = image.crop_imm(cx - radius, cy - radius, side, side).to_rgba8();
    let r = radius as f32;

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        let coverage = (r - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
        pixel[3] = (pixel[3] as f32 * coverage).round() as u8;
    }

    Ok(out)
}

/// Size of the box that holds a `width` x `height` image rotated by `degrees`.
pub fn rotated_bounds(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let theta = degrees.to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let w = width as f32;
    let h = height as f32;
    // Trim float noise so 90 degrees does not round up to an extra pixel.
    let bound = |v: f32| ((v - 1e-3).ceil().max(1.0)) as u32;
    (bound(w * cos + h * sin), bound(w * sin + h * cos))
}

/// Rotates clockwise by `degrees`. Right angles are lossless; other angles
/// grow the canvas to the rotated bounds and fill the corners with `background`.
pub fn rotate(image: &DynamicImage, degrees: f32, background: Rgba<u8>) -> DynamicImage {
    let normalized = degrees.rem_euclid(360.0);
    let right_angle = (normalized / 90.0).round();

    if (normalized - right_angle * 90.0).abs() < 1e-4 {
        return match right_angle as u32 % 4 {
            1 => image.rotate90(),
            2 => image.rotate180(),
            3 => image.rotate270(),
            _ => image.clone(),
        };
    }

    let (width, height) = image.dimensions();
    let (out_w, out_h) = rotated_bounds(width, height, normalized);
    log::debug!(
        "Rotating {}x{} by {:.2} degrees into {}x{}",
        width,
        height,
        normalized,
        out_w,
        out_h
    );

    let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
        * Projection::rotate(normalized.to_radians())
        * Projection::translate(-(width as f32) / 2.0, -(height as f32) / 2.0);

    let source = image.to_rgba8();
    let mut out = RgbaImage::from_pixel(out_w, out_h, background);
    warp_into(&source, &projection, Interpolation::Bilinear, background, &mut out);

    DynamicImage::ImageRgba8(out)
}

pub fn flip(image: &DynamicImage, axis: FlipAxis) -> DynamicImage {
    match axis {
        FlipAxis::Horizontal => image.fliph(),
        FlipAxis::Vertical => image.flipv(),
    }
}
