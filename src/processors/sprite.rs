// pixkit/src/processors/sprite.rs
use crate::core::{ImageToolError, OutputAsset, OutputFormat, Result, RunId, RunTracker};
use crate::processors::Compressor;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{imageops, Delay, DynamicImage, Frame, GenericImageView, Rgba, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteGrid {
    pub columns: u32,
    pub rows: u32,
    /// Space between neighbouring frames.
    pub padding: u32,
    /// Space around the whole grid.
    pub margin: u32,
}

impl SpriteGrid {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            padding: 0,
            margin: 0,
        }
    }

    pub fn frame_size(&self, (width, height): (u32, u32)) -> Result<(u32, u32)> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ImageToolError::InvalidParameter(
                "Sprite grid needs at least one column and one row".to_string(),
            ));
        }

        let axis = |total: u32, count: u32| -> u32 {
            let used = 2 * self.margin as u64 + (count as u64 - 1) * self.padding as u64;
            (total as u64).saturating_sub(used) as u32 / count
        };
        let frame = (axis(width, self.columns), axis(height, self.rows));

        if frame.0 == 0 || frame.1 == 0 {
            return Err(ImageToolError::InvalidParameter(format!(
                "A {}x{} grid with padding {} and margin {} leaves no room in a {}x{} sheet",
                self.columns, self.rows, self.padding, self.margin, width, height
            )));
        }
        Ok(frame)
    }
}

/// Cuts a sheet into frames, row by row.
pub fn slice(sheet: &DynamicImage, grid: SpriteGrid) -> Result<Vec<RgbaImage>> {
    let (frame_w, frame_h) = grid.frame_size(sheet.dimensions())?;
    let sheet = sheet.to_rgba8();
    let mut frames = Vec::with_capacity((grid.columns * grid.rows) as usize);

    for row in 0..grid.rows {
        for col in 0..grid.columns {
            let x = grid.margin + col * (frame_w + grid.padding);
            let y = grid.margin + row * (frame_h + grid.padding);
            frames.push(imageops::crop_imm(&sheet, x, y, frame_w, frame_h).to_image());
        }
    }

    log::debug!(
        "Sliced {} frames of {}x{}",
        frames.len(),
        frame_w,
        frame_h
    );
    Ok(frames)
}

/// Packs frames into a sheet with `columns` cells per row. Cells are as large
/// as the largest frame; frames sit in the top-left of their cell.
pub fn assemble_sheet(frames: &[RgbaImage], columns: u32, padding: u32) -> Result<RgbaImage> {
    if frames.is_empty() {
        return Err(ImageToolError::InvalidParameter(
            "No frames to assemble".to_string(),
        ));
    }
    if columns == 0 {
        return Err(ImageToolError::InvalidParameter(
            "Sheet needs at least one column".to_string(),
        ));
    }

    let (cell_w, cell_h) = max_frame_size(frames);
    let columns = columns.min(frames.len() as u32);
    let rows = (frames.len() as u32).div_ceil(columns);

    let sheet_w = columns * cell_w + (columns - 1) * padding;
    let sheet_h = rows * cell_h + (rows - 1) * padding;
    let mut sheet = RgbaImage::from_pixel(sheet_w, sheet_h, Rgba([0, 0, 0, 0]));

    for (index, frame) in frames.iter().enumerate() {
        let index = index as u32;
        let x = (index % columns) * (cell_w + padding);
        let y = (index / columns) * (cell_h + padding);
        imageops::overlay(&mut sheet, frame, x as i64, y as i64);
    }

    log::debug!(
        "Assembled {} frames into a {}x{} sheet ({} columns)",
        frames.len(),
        sheet_w,
        sheet_h,
        columns
    );
    Ok(sheet)
}

fn max_frame_size(frames: &[RgbaImage]) -> (u32, u32) {
    frames.iter().fold((0, 0), |(w, h), frame| {
        (w.max(frame.width()), h.max(frame.height()))
    })
}

/// Animated GIF that loops forever, showing each frame for `delay_ms`.
pub fn encode_gif(frames: &[RgbaImage], delay_ms: u32) -> Result<Vec<u8>> {
    if frames.is_empty() {
        return Err(ImageToolError::InvalidParameter(
            "No frames to animate".to_string(),
        ));
    }

    let (width, height) = max_frame_size(frames);
    let delay = Delay::from_numer_denom_ms(delay_ms.max(10), 1);

    let gif_frames = frames.iter().map(|frame| {
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        imageops::overlay(&mut canvas, frame, 0, 0);
        Frame::from_parts(canvas, 0, 0, delay)
    });

    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut buffer, 10);
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.encode_frames(gif_frames)?;
    }

    log::debug!("Encoded {} GIF frames, {} bytes", frames.len(), buffer.len());
    Ok(buffer)
}

/// Encodes every frame as `{stem}_frame_{n}.{ext}`, stopping early when
/// `run` is superseded.
pub fn export_frames(
    frames: &[RgbaImage],
    stem: &str,
    format: OutputFormat,
    compressor: &Compressor,
    tracker: &RunTracker,
    run: RunId,
) -> Result<Vec<OutputAsset>> {
    let width = frames.len().to_string().len();
    let mut assets = Vec::with_capacity(frames.len());

    for (index, frame) in frames.iter().enumerate() {
        tracker.ensure_current(run)?;
        let file_name = format!(
            "{}_frame_{:0width$}.{}",
            stem,
            index + 1,
            format.extension(),
            width = width
        );
        assets.push(compressor.encode_asset(
            &DynamicImage::ImageRgba8(frame.clone()),
            format,
            file_name,
        )?);
    }

    Ok(assets)
}
