// pixkit/src/core/mod.rs
pub mod processor;
pub mod run;

use crate::processors::{
    CircleCrop, ColorReplace, CropRect, FlipAxis, MemeText, ResizeMode, Watermark,
};
use image::{DynamicImage, ImageFormat, Rgba};
use std::path::Path;
use thiserror::Error;

pub use run::{RunId, RunTracker};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeAlgorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Jpeg,
    WebP,
    Bmp,
    Gif,
    Tiff,
    Ico,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Gif => "gif",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Ico => "ico",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Bmp => "image/bmp",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Tiff => "image/tiff",
            OutputFormat::Ico => "image/x-icon",
        }
    }

    /// Whether the encoded file keeps an alpha channel.
    pub fn supports_alpha(&self) -> bool {
        !matches!(self, OutputFormat::Jpeg | OutputFormat::Bmp)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "webp" => Some(OutputFormat::WebP),
            "bmp" => Some(OutputFormat::Bmp),
            "gif" => Some(OutputFormat::Gif),
            "tif" | "tiff" => Some(OutputFormat::Tiff),
            "ico" => Some(OutputFormat::Ico),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            ImageFormat::WebP => Some(OutputFormat::WebP),
            ImageFormat::Bmp => Some(OutputFormat::Bmp),
            ImageFormat::Gif => Some(OutputFormat::Gif),
            ImageFormat::Tiff => Some(OutputFormat::Tiff),
            ImageFormat::Ico => Some(OutputFormat::Ico),
            _ => None,
        }
    }
}

/// A decoded input image together with where it came from.
#[derive(Debug, Clone)]
pub struct SourceAsset {
    pub name: String,
    pub byte_size: u64,
    pub format: Option<OutputFormat>,
    pub image: DynamicImage,
}

/// An encoded result ready to be written out.
#[derive(Debug, Clone)]
pub struct OutputAsset {
    pub file_name: String,
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl OutputAsset {
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &self.bytes)?;
        log::info!("Saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(())
    }
}

/// One step of an editing pipeline.
#[derive(Debug, Clone)]
pub enum Operation {
    Resize(ResizeMode),
    Crop(CropRect),
    /// Crop given in percentages, resolved against the image as it reaches
    /// this step (after auto-orientation and earlier operations).
    CropPercent {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    CircleCrop(CircleCrop),
    Rotate { degrees: f32, background: Rgba<u8> },
    Flip(FlipAxis),
    ReplaceColor(ColorReplace),
    Watermark(Watermark),
    Meme(MemeText),
}

impl Operation {
    /// Suffix used when naming the output of this operation.
    pub fn suffix(&self) -> &'static str {
        match self {
            Operation::Resize(_) => "resized",
            Operation::Crop(_) | Operation::CropPercent { .. } => "cropped",
            Operation::CircleCrop(_) => "circle",
            Operation::Rotate { .. } => "rotated",
            Operation::Flip(_) => "flipped",
            Operation::ReplaceColor(_) => "recolored",
            Operation::Watermark(_) => "watermarked",
            Operation::Meme(_) => "meme",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// `None` keeps the input's format.
    pub format: Option<OutputFormat>,
    pub quality: u8,
    pub algorithm: ResizeAlgorithm,
    pub optimize_png: bool,
    /// Fill used when flattening alpha for JPEG and BMP output.
    pub background: Rgba<u8>,
    pub max_file_size: Option<u64>,
    pub auto_orient: bool,
}

#[derive(Debug, Clone)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub has_exif: bool,
    pub file_size: u64,
}

#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub processed_count: usize,
    pub total_size_before: u64,
    pub total_size_after: u64,
    pub errors: Vec<(String, String)>,
}

impl ProcessingStats {
    pub fn merge(&mut self, other: ProcessingStats) {
        self.processed_count += other.processed_count;
        self.total_size_before += other.total_size_before;
        self.total_size_after += other.total_size_after;
        self.errors.extend(other.errors);
    }

    pub fn savings_percent(&self) -> f64 {
        if self.total_size_before == 0 {
            return 0.0;
        }
        let savings = (self.total_size_before as f64 - self.total_size_after as f64)
            / self.total_size_before as f64
            * 100.0;
        savings.clamp(0.0, 100.0)
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            format: None,
            quality: 92,
            algorithm: ResizeAlgorithm::Lanczos3,
            optimize_png: false,
            background: Rgba([255, 255, 255, 255]),
            max_file_size: None,
            auto_orient: true,
        }
    }
}

impl ProcessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(ImageToolError::InvalidParameter(
                "Quality must be between 1 and 100".to_string(),
            ));
        }

        if self.max_file_size == Some(0) {
            return Err(ImageToolError::InvalidParameter(
                "Maximum file size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Output format for an input, falling back to PNG when the input's
    /// format cannot be written.
    pub fn resolve_format(&self, input: Option<OutputFormat>) -> OutputFormat {
        self.format.or(input).unwrap_or(OutputFormat::Png)
    }
}

#[derive(Error, Debug)]
pub enum ImageToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),

    #[error("Security error: {0}")]
    SecurityError(String),

    #[error("Memory limit exceeded: {0}")]
    MemoryLimitExceeded(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Run {0} was superseded by a newer run")]
    Superseded(u64),
}

pub type Result<T> = std::result::Result<T, ImageToolError>;

pub fn validate_config(config: &ProcessConfig) -> Result<()> {
    config.validate()
}

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` or a handful of CSS color names.
pub fn parse_color(input: &str) -> Result<Rgba<u8>> {
    let value = input.trim().to_ascii_lowercase();

    let named = match value.as_str() {
        "transparent" => Some([0, 0, 0, 0]),
        "black" => Some([0, 0, 0, 255]),
        "white" => Some([255, 255, 255, 255]),
        "red" => Some([255, 0, 0, 255]),
        "green" => Some([0, 128, 0, 255]),
        "lime" => Some([0, 255, 0, 255]),
        "blue" => Some([0, 0, 255, 255]),
        "yellow" => Some([255, 255, 0, 255]),
        "gray" | "grey" => Some([128, 128, 128, 255]),
        _ => None,
    };
    if let Some(rgba) = named {
        return Ok(Rgba(rgba));
    }

    let hex = value.strip_prefix('#').unwrap_or(&value);
    let invalid = || ImageToolError::InvalidParameter(format!("Invalid color: {}", input));

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

    match hex.len() {
        3 => {
            let mut out = [255u8; 4];
            for (i, c) in hex.chars().enumerate() {
                let digit = channel(&c.to_string())?;
                out[i] = digit * 17;
            }
            Ok(Rgba(out))
        }
        6 | 8 => {
            let mut out = [255u8; 4];
            for i in 0..hex.len() / 2 {
                out[i] = channel(&hex[i * 2..i * 2 + 2])?;
            }
            Ok(Rgba(out))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_named_colors() {
        assert_eq!(parse_color("#fff").unwrap(), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_color("#102030").unwrap(), Rgba([16, 32, 48, 255]));
        assert_eq!(parse_color("10203080").unwrap(), Rgba([16, 32, 48, 128]));
        assert_eq!(parse_color("Transparent").unwrap(), Rgba([0, 0, 0, 0]));
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#ggg").is_err());
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let config = ProcessConfig {
            quality: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(ProcessConfig::default().validate().is_ok());
    }

    #[test]
    fn resolves_output_format() {
        let config = ProcessConfig::default();
        assert_eq!(config.resolve_format(Some(OutputFormat::Jpeg)), OutputFormat::Jpeg);
        assert_eq!(config.resolve_format(None), OutputFormat::Png);

        let forced = ProcessConfig {
            format: Some(OutputFormat::WebP),
            ..Default::default()
        };
        assert_eq!(forced.resolve_format(Some(OutputFormat::Jpeg)), OutputFormat::WebP);
    }

    #[test]
    fn formats_know_their_extensions() {
        assert_eq!(OutputFormat::from_extension("JPEG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert!(!OutputFormat::Jpeg.supports_alpha());
        assert!(OutputFormat::Ico.supports_alpha());
    }
}
