pub mod cli;
mod core;
pub mod processors;
mod utils;

pub use cli::{Algorithm, Cli, Commands};
pub use crate::core::processor::ImageProcessor;
pub use crate::core::{
    parse_color, validate_config, ImageMetadata, ImageToolError, Operation, OutputAsset,
    OutputFormat, ProcessConfig, ProcessingStats, ResizeAlgorithm, Result, RunId, RunTracker,
    SourceAsset,
};
pub use processors::{
    BatchProcessor, CircleCrop, ColorReplace, Compressor, CropRect, FaviconGenerator, FlipAxis,
    Loader, MemeText, MetadataProcessor, PageLayout, PdfRasterizer, ResizeMode, Resizer,
    SpriteGrid, Watermark, WatermarkContent,
};
pub use utils::{
    calculate_aspect_ratio, format_file_size, generate_output_path, is_supported_format,
    output_file_name, pipeline_suffix,
};

pub mod prelude {
    pub use crate::{
        BatchProcessor, Compressor, ImageProcessor, Loader, Operation, OutputFormat, ProcessConfig,
        ResizeAlgorithm, ResizeMode, Resizer,
    };
}

// Re-export commonly used types
pub use image::DynamicImage;
