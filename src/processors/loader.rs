// pixkit/src/processors/loader.rs
use crate::core::{ImageToolError, OutputFormat, Result, SourceAsset};
use crate::processors::MetadataProcessor;
use crate::utils::image_format_to_string;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

#[derive(Clone)]
pub struct Loader {
    max_dimensions: Option<(u32, u32)>,
    auto_orient: bool,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: Some((100_000, 100_000)),
            auto_orient: true,
        }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    pub fn with_auto_orient(mut self, auto_orient: bool) -> Self {
        self.auto_orient = auto_orient;
        self
    }

    pub fn load(&self, path: &Path) -> Result<DynamicImage> {
        log::debug!("Loading image from: {}", path.display());

        self.validate_path(path)?;

        let image = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| {
                ImageToolError::ProcessingError(format!("Failed to decode image: {}", e))
            })?;

        self.check_dimensions(&image)?;

        let image = if self.auto_orient {
            let metadata = MetadataProcessor::new();
            match metadata.orientation(path) {
                Ok(Some(orientation)) => metadata.apply_orientation(image, orientation),
                Ok(None) => image,
                Err(e) => {
                    log::warn!("Ignoring unreadable EXIF in {}: {}", path.display(), e);
                    image
                }
            }
        } else {
            image
        };

        let (width, height) = image.dimensions();
        log::info!(
            "Loaded image: {}x{} pixels, color: {:?}",
            width,
            height,
            image.color()
        );

        Ok(image)
    }

    /// Loads a file as a [`SourceAsset`], keeping its name, size and format.
    pub fn load_asset(&self, path: &Path) -> Result<SourceAsset> {
        let image = self.load(path)?;
        let byte_size = std::fs::metadata(path)?.len();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let format = self.detect_format(path).ok().and_then(OutputFormat::from_image_format);

        Ok(SourceAsset {
            name,
            byte_size,
            format,
            image,
        })
    }

    pub fn load_from_bytes(&self, data: &[u8]) -> Result<DynamicImage> {
        if data.is_empty() {
            return Err(ImageToolError::InvalidParameter("Image data is empty".to_string()));
        }

        let image = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .decode()
            .map_err(|e| {
                ImageToolError::ProcessingError(format!("Failed to decode image from bytes: {}", e))
            })?;

        self.check_dimensions(&image)?;
        Ok(image)
    }

    pub fn get_dimensions_and_format(&self, path: &Path) -> Result<(u32, u32, String)> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;

        let format = reader
            .format()
            .map(image_format_to_string)
            .unwrap_or_else(|| "Unknown".to_string());

        let dimensions = reader.into_dimensions()?;

        Ok((dimensions.0, dimensions.1, format))
    }

    /// Detects the format from the file contents, falling back to the extension.
    pub fn detect_format(&self, path: &Path) -> Result<ImageFormat> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        if let Some(format) = reader.format() {
            return Ok(format);
        }

        ImageFormat::from_path(path).map_err(|_| {
            ImageToolError::UnsupportedFormat(format!(
                "Failed to detect format for: {}",
                path.display()
            ))
        })
    }

    fn check_dimensions(&self, image: &DynamicImage) -> Result<()> {
        if let Some((max_w, max_h)) = self.max_dimensions {
            let (width, height) = image.dimensions();
            if width > max_w || height > max_h {
                return Err(ImageToolError::MemoryLimitExceeded(format!(
                    "Image dimensions {}x{} exceed maximum {}x{}",
                    width, height, max_w, max_h
                )));
            }
        }
        Ok(())
    }

    fn validate_path(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ImageToolError::InvalidParameter(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let metadata = path.metadata()?;
        if metadata.len() == 0 {
            return Err(ImageToolError::InvalidParameter(format!(
                "File is empty: {}",
                path.display()
            )));
        }

        Ok(())
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
