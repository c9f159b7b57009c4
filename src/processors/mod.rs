// pixkit/src/processors/mod.rs
mod batch;
pub mod color_replace;
mod compressor;
mod favicon;
pub mod geometry;
pub mod ico;
mod loader;
mod meme;
mod metadata;
pub mod pdf;
pub mod pdf_raster;
mod resizer;
pub mod sprite;
pub mod text;
mod watermark;

pub use batch::BatchProcessor;
pub use color_replace::{replace_color, ColorReplace};
pub use compressor::Compressor;
pub use favicon::{html_snippet, FaviconGenerator};
pub use geometry::{circle_crop, CircleCrop, CropRect, FlipAxis};
pub use ico::{encode_ico, IcoEntry};
pub use loader::Loader;
pub use meme::{layout_caption, render_meme, CaptionLayout, MemeText};
pub use metadata::MetadataProcessor;
pub use pdf::{images_to_pdf, PageLayout};
pub use pdf_raster::PdfRasterizer;
pub use resizer::{ResizeMode, Resizer};
pub use sprite::SpriteGrid;
pub use watermark::{apply_watermark, place, Watermark, WatermarkContent};
