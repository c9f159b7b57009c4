// pixkit/src/processors/pdf_raster.rs
//! PDF pages to images. Rendering is done by the pdfium library, bound at
//! runtime from the system or from a given directory.
use crate::core::{ImageToolError, OutputAsset, OutputFormat, Result, RunId, RunTracker};
use crate::processors::Compressor;
use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;
use std::path::Path;

pub const DEFAULT_DPI: f32 = 150.0;
const MAX_DPI: f32 = 600.0;
/// PDF user space is 72 points per inch.
const POINTS_PER_INCH: f32 = 72.0;

fn pdfium_error(context: &str, err: PdfiumError) -> ImageToolError {
    ImageToolError::ProcessingError(format!("{}: {:?}", context, err))
}

pub struct PdfRasterizer {
    pdfium: Pdfium,
    dpi: f32,
}

impl PdfRasterizer {
    /// Binds pdfium from `library_dir` when given, otherwise from the system
    /// library path.
    pub fn new(library_dir: Option<&Path>) -> Result<Self> {
        let bindings = match library_dir {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| pdfium_error("Failed to load the pdfium library", e))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            dpi: DEFAULT_DPI,
        })
    }

    pub fn with_dpi(mut self, dpi: f32) -> Result<Self> {
        validate_dpi(dpi)?;
        self.dpi = dpi;
        Ok(self)
    }

    /// Renders every page in order. Stops with `Superseded` before the next
    /// page once `run` is no longer current.
    pub fn render_pages(
        &self,
        pdf: &[u8],
        tracker: &RunTracker,
        run: RunId,
    ) -> Result<Vec<RgbaImage>> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| pdfium_error("Failed to open PDF", e))?;
        let config = PdfRenderConfig::new().scale_page_by_factor(self.dpi / POINTS_PER_INCH);

        let pages = document.pages();
        log::info!(
            "Rendering {} pages at {} dpi (run {})",
            pages.len(),
            self.dpi,
            run.value()
        );

        let mut images = Vec::with_capacity(pages.len() as usize);
        for (index, page) in pages.iter().enumerate() {
            tracker.ensure_current(run)?;

            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| pdfium_error(&format!("Failed to render page {}", index + 1), e))?;
            let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
            let image = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(
                || {
                    ImageToolError::ProcessingError(format!(
                        "Page {} bitmap does not match {}x{}",
                        index + 1,
                        width,
                        height
                    ))
                },
            )?;

            log::debug!("Rendered page {} at {}x{}", index + 1, width, height);
            images.push(image);
        }

        Ok(images)
    }
}

pub fn validate_dpi(dpi: f32) -> Result<()> {
    if !(dpi > 0.0 && dpi <= MAX_DPI) {
        return Err(ImageToolError::InvalidParameter(format!(
            "DPI must be in (0, {}], got {}",
            MAX_DPI, dpi
        )));
    }
    Ok(())
}

/// `{stem}_page_{n}.{ext}` with `n` counted from 1.
pub fn page_file_name(stem: &str, index: usize, format: OutputFormat) -> String {
    format!("{}_page_{}.{}", stem, index + 1, format.extension())
}

/// Encodes rendered pages, checking `run` before each one.
pub fn export_pages(
    pages: &[RgbaImage],
    stem: &str,
    format: OutputFormat,
    compressor: &Compressor,
    tracker: &RunTracker,
    run: RunId,
) -> Result<Vec<OutputAsset>> {
    let mut assets = Vec::with_capacity(pages.len());
    for (index, page) in pages.iter().enumerate() {
        tracker.ensure_current(run)?;
        assets.push(compressor.encode_asset(
            &DynamicImage::ImageRgba8(page.clone()),
            format,
            page_file_name(stem, index, format),
        )?);
    }
    Ok(assets)
}
