// pixkit/src/processors/favicon.rs
use crate::core::{OutputAsset, OutputFormat, ResizeAlgorithm, Result};
use crate::processors::ico::{encode_ico, IcoEntry};
use crate::processors::{Compressor, Resizer};
use image::DynamicImage;
use std::path::Path;

pub const ICO_SIZES: [u32; 3] = [16, 32, 48];

pub const PNG_ICONS: [(&str, u32); 5] = [
    ("favicon-16x16.png", 16),
    ("favicon-32x32.png", 32),
    ("apple-touch-icon.png", 180),
    ("android-chrome-192x192.png", 192),
    ("android-chrome-512x512.png", 512),
];

pub struct FaviconGenerator {
    resizer: Resizer,
    compressor: Compressor,
}

impl FaviconGenerator {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(ResizeAlgorithm::Lanczos3),
            compressor: Compressor::new(100),
        }
    }

    pub fn with_png_optimization(mut self, optimize: bool) -> Self {
        self.compressor = self.compressor.with_png_optimization(optimize);
        self
    }

    fn icon_png(&self, image: &DynamicImage, side: u32) -> Result<Vec<u8>> {
        let square = self.resizer.contain_square(image, side);
        self.compressor
            .encode(&DynamicImage::ImageRgba8(square), OutputFormat::Png)
    }

    /// `favicon.ico` with the small sizes plus the standalone PNG icons.
    pub fn generate(&self, image: &DynamicImage) -> Result<Vec<OutputAsset>> {
        let mut entries = Vec::with_capacity(ICO_SIZES.len());
        for side in ICO_SIZES {
            entries.push(IcoEntry {
                width: side,
                height: side,
                png: self.icon_png(image, side)?,
            });
        }

        let mut assets = vec![OutputAsset {
            file_name: "favicon.ico".to_string(),
            format: OutputFormat::Ico,
            bytes: encode_ico(&entries)?,
            width: 48,
            height: 48,
        }];

        for (name, side) in PNG_ICONS {
            log::debug!("Rendering {} ({}px)", name, side);
            assets.push(OutputAsset {
                file_name: name.to_string(),
                format: OutputFormat::Png,
                bytes: self.icon_png(image, side)?,
                width: side,
                height: side,
            });
        }

        Ok(assets)
    }

    pub fn write_all(&self, image: &DynamicImage, output_dir: &Path) -> Result<Vec<OutputAsset>> {
        std::fs::create_dir_all(output_dir)?;
        let assets = self.generate(image)?;
        for asset in &assets {
            asset.write_to(&output_dir.join(&asset.file_name))?;
        }
        Ok(assets)
    }
}

impl Default for FaviconGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// `<link>` tags referencing the generated icons.
pub fn html_snippet() -> String {
    [
        r#"<link rel="icon" href="/favicon.ico" sizes="any">"#,
        r#"<link rel="icon" type="image/png" sizes="32x32" href="/favicon-32x32.png">"#,
        r#"<link rel="icon" type="image/png" sizes="16x16" href="/favicon-16x16.png">"#,
        r#"<link rel="apple-touch-icon" sizes="180x180" href="/apple-touch-icon.png">"#,
    ]
    .join("\n")
}
