// pixkit/src/core/processor.rs
use super::{
    ImageMetadata, ImageToolError, Operation, OutputAsset, OutputFormat, ProcessConfig,
    ProcessingStats, Result, SourceAsset,
};
use crate::processors::{
    apply_watermark, circle_crop, color_replace, geometry, render_meme, Compressor, CropRect,
    Loader, MetadataProcessor, Resizer,
};
use crate::utils::{output_file_name, pipeline_suffix};
use image::{DynamicImage, GenericImageView};
use std::path::Path;

pub struct ImageProcessor {
    config: ProcessConfig,
    loader: Loader,
    resizer: Resizer,
    compressor: Compressor,
    metadata_processor: MetadataProcessor,
}

impl ImageProcessor {
    pub fn new(config: ProcessConfig) -> Self {
        let resizer = Resizer::new(config.algorithm);
        let compressor = Compressor::new(config.quality)
            .with_png_optimization(config.optimize_png)
            .with_background(config.background);
        let loader = Loader::new().with_auto_orient(config.auto_orient);

        Self {
            config,
            loader,
            resizer,
            compressor,
            metadata_processor: MetadataProcessor::new(),
        }
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Runs the operations in order on an in-memory image.
    pub fn render(&self, image: DynamicImage, ops: &[Operation]) -> Result<DynamicImage> {
        let mut image = image;

        for op in ops {
            log::debug!("Applying {}", op.suffix());
            image = match op {
                Operation::Resize(mode) => {
                    mode.validate()?;
                    self.resizer.resize(&image, *mode)
                }
                Operation::Crop(rect) => geometry::crop(&image, *rect)?,
                Operation::CropPercent {
                    x,
                    y,
                    width,
                    height,
                } => {
                    let rect =
                        CropRect::from_percent(image.dimensions(), *x, *y, *width, *height);
                    geometry::crop(&image, rect)?
                }
                Operation::CircleCrop(params) => {
                    DynamicImage::ImageRgba8(circle_crop(&image, *params)?)
                }
                Operation::Rotate { degrees, background } => {
                    geometry::rotate(&image, *degrees, *background)
                }
                Operation::Flip(axis) => geometry::flip(&image, *axis),
                Operation::ReplaceColor(params) => DynamicImage::ImageRgba8(
                    color_replace::replace_color(&image.to_rgba8(), *params),
                ),
                Operation::Watermark(mark) => {
                    DynamicImage::ImageRgba8(apply_watermark(&image.to_rgba8(), mark)?)
                }
                Operation::Meme(meme) => {
                    DynamicImage::ImageRgba8(render_meme(&image.to_rgba8(), meme)?)
                }
            };
        }

        Ok(image)
    }

    /// Renders and encodes a loaded asset. Nothing is written to disk.
    pub fn apply(&self, source: &SourceAsset, ops: &[Operation]) -> Result<OutputAsset> {
        let format = self.config.resolve_format(source.format);
        self.apply_as(source, ops, format)
    }

    pub fn apply_as(
        &self,
        source: &SourceAsset,
        ops: &[Operation],
        format: OutputFormat,
    ) -> Result<OutputAsset> {
        let rendered = self.render(source.image.clone(), ops)?;
        let file_name = output_file_name(&source.name, pipeline_suffix(ops), format);
        self.compressor.encode_asset(&rendered, format, file_name)
    }

    pub fn load(&self, input_path: &Path) -> Result<SourceAsset> {
        let original_size = std::fs::metadata(input_path)?.len();
        if let Some(max_size) = self.config.max_file_size {
            if original_size > max_size {
                return Err(ImageToolError::MemoryLimitExceeded(format!(
                    "File size {} exceeds limit {}",
                    original_size, max_size
                )));
            }
        }
        self.loader.load_asset(input_path)
    }

    /// Loads `input_path`, applies `ops` and writes the result to
    /// `output_path`. The output is fully encoded before anything is written.
    pub fn process(
        &self,
        input_path: &Path,
        output_path: &Path,
        ops: &[Operation],
    ) -> Result<ProcessingStats> {
        self.config.validate()?;
        self.validate_paths(input_path, output_path)?;

        let source = self.load(input_path)?;
        // An explicit format wins, then the output extension, then the input's format.
        let format = self
            .config
            .format
            .or_else(|| OutputFormat::from_path(output_path))
            .unwrap_or_else(|| self.config.resolve_format(source.format));
        let output = self.apply_as(&source, ops, format)?;

        output.write_to(output_path)?;

        Ok(ProcessingStats {
            processed_count: 1,
            total_size_before: source.byte_size,
            total_size_after: output.bytes.len() as u64,
            errors: Vec::new(),
        })
    }

    pub fn get_metadata(&self, path: &Path) -> Result<ImageMetadata> {
        if !path.exists() {
            return Err(ImageToolError::InvalidParameter(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let metadata = std::fs::metadata(path)?;
        let (width, height, format) = self.loader.get_dimensions_and_format(path)?;
        let has_exif = self.metadata_processor.has_metadata(path).unwrap_or(false);

        Ok(ImageMetadata {
            width,
            height,
            format,
            has_exif,
            file_size: metadata.len(),
        })
    }

    fn validate_paths(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        if output_path.to_string_lossy().contains("..") {
            return Err(ImageToolError::SecurityError(
                "Path traversal detected in output path".to_string(),
            ));
        }

        if !input_path.exists() {
            return Err(ImageToolError::InvalidParameter(format!(
                "Input file does not exist: {}",
                input_path.display()
            )));
        }

        if input_path == output_path {
            return Err(ImageToolError::InvalidParameter(
                "Output would overwrite the input file".to_string(),
            ));
        }

        Ok(())
    }
}
