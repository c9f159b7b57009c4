// pixkit/src/processors/compressor.rs
use crate::core::{ImageToolError, OutputAsset, OutputFormat, Result};
use crate::processors::ico::{encode_ico, IcoEntry, MAX_ICON_SIDE};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{imageops, DynamicImage, GenericImageView, ImageFormat, Rgba, RgbImage, RgbaImage};
use oxipng::{optimize_from_memory, Options};
use std::io::Cursor;

/// Turns bitmaps into encoded bytes.
pub struct Compressor {
    quality: u8,
    optimize_png: bool,
    background: Rgba<u8>,
}

impl Compressor {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            optimize_png: false,
            background: Rgba([255, 255, 255, 255]),
        }
    }

    pub fn with_png_optimization(mut self, optimize: bool) -> Self {
        self.optimize_png = optimize;
        self
    }

    /// Color that transparent areas become in formats without alpha.
    pub fn with_background(mut self, background: Rgba<u8>) -> Self {
        self.background = background;
        self
    }

    pub fn encode(&self, image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
        log::debug!(
            "Encoding {}x{} image as {:?}, quality: {}",
            image.width(),
            image.height(),
            format,
            self.quality
        );

        match format {
            OutputFormat::Jpeg => self.encode_jpeg(image),
            OutputFormat::Png => self.encode_png(image),
            OutputFormat::Ico => self.encode_icon(image),
            OutputFormat::Bmp => {
                let flat = DynamicImage::ImageRgb8(self.flatten(image));
                write_with(&flat, ImageFormat::Bmp)
            }
            // The image crate's WebP encoder is lossless, so quality does not apply.
            OutputFormat::WebP => {
                write_with(&DynamicImage::ImageRgba8(image.to_rgba8()), ImageFormat::WebP)
            }
            OutputFormat::Gif => {
                write_with(&DynamicImage::ImageRgba8(image.to_rgba8()), ImageFormat::Gif)
            }
            OutputFormat::Tiff => {
                write_with(&DynamicImage::ImageRgba8(image.to_rgba8()), ImageFormat::Tiff)
            }
        }
    }

    /// Encodes and names the result after the source file.
    pub fn encode_asset(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        file_name: String,
    ) -> Result<OutputAsset> {
        let bytes = self.encode(image, format)?;
        let (width, height) = image.dimensions();
        Ok(OutputAsset {
            file_name,
            format,
            bytes,
            width,
            height,
        })
    }

    fn encode_jpeg(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let flat = self.flatten(image);
        let mut buffer = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
            encoder.encode_image(&flat)?;
        }
        Ok(buffer)
    }

    fn encode_png(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let data = write_with(image, ImageFormat::Png)?;
        if self.optimize_png {
            return self.optimize_png_bytes(&data);
        }
        Ok(data)
    }

    fn encode_icon(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let (width, height) = image.dimensions();
        let image = if width > MAX_ICON_SIDE || height > MAX_ICON_SIDE {
            log::debug!("Scaling {}x{} down to fit an icon", width, height);
            image.resize(MAX_ICON_SIDE, MAX_ICON_SIDE, FilterType::Lanczos3)
        } else {
            image.clone()
        };

        let entry = IcoEntry {
            width: image.width(),
            height: image.height(),
            png: self.encode_png(&DynamicImage::ImageRgba8(image.to_rgba8()))?,
        };
        encode_ico(&[entry])
    }

    fn optimize_png_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        optimize_from_memory(data, &Options::default())
            .map_err(|e| ImageToolError::ProcessingError(format!("PNG optimization failed: {}", e)))
    }

    /// Composites the image over the background color and drops alpha.
    pub fn flatten(&self, image: &DynamicImage) -> RgbImage {
        if !image.color().has_alpha() {
            return image.to_rgb8();
        }

        let mut background = self.background;
        background[3] = 255;
        let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), background);
        imageops::overlay(&mut canvas, &image.to_rgba8(), 0, 0);
        DynamicImage::ImageRgba8(canvas).to_rgb8()
    }
}

fn write_with(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_transparent() -> DynamicImage {
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        for x in 0..4 {
            for y in 0..8 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn jpeg_flattens_onto_background() {
        let compressor = Compressor::new(90).with_background(Rgba([0, 0, 255, 255]));
        let flat = compressor.flatten(&half_transparent());
        assert_eq!(flat.get_pixel(6, 0).0, [0, 0, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [255, 0, 0]);

        let bytes = compressor.encode(&half_transparent(), OutputFormat::Jpeg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn png_round_trips_alpha() {
        let bytes = Compressor::new(90)
            .encode(&half_transparent(), OutputFormat::Png)
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(7, 7)[3], 0);
    }

    #[test]
    fn icon_wraps_png_at_offset_22() {
        let bytes = Compressor::new(90)
            .encode(&half_transparent(), OutputFormat::Ico)
            .unwrap();
        assert_eq!(&bytes[..6], &[0, 0, 1, 0, 1, 0]);
        assert_eq!(&bytes[22..26], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn large_icons_are_scaled_down() {
        let big = DynamicImage::ImageRgba8(RgbaImage::new(600, 300));
        let bytes = Compressor::new(90).encode(&big, OutputFormat::Ico).unwrap();
        assert_eq!(bytes[6], 0);
        assert_eq!(bytes[7], 128);
    }
}
