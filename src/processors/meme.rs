// pixkit/src/processors/meme.rs
use crate::core::{ImageToolError, Result};
use crate::processors::text::{draw_line, measure_text, wrap_words, TextStyle};
use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};

const MIN_FONT_SIZE: f32 = 12.0;
const WIDTH_FILL: f32 = 0.92;

#[derive(Debug, Clone)]
pub struct MemeText {
    pub top: String,
    pub bottom: String,
    pub font: FontArc,
    pub fill: Rgba<u8>,
    pub outline: Rgba<u8>,
}

impl MemeText {
    pub fn new(top: impl Into<String>, bottom: impl Into<String>, font: FontArc) -> Self {
        Self {
            top: top.into(),
            bottom: bottom.into(),
            font,
            fill: Rgba([255, 255, 255, 255]),
            outline: Rgba([0, 0, 0, 255]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionLayout {
    pub size: f32,
    pub lines: Vec<String>,
}

/// Picks the largest font size, starting from `image_height / 8`, at which
/// the caption fits on one line in the usable width. Only when it does not
/// fit even at the minimum size is it wrapped onto several lines.
pub fn layout_caption<F>(
    text: &str,
    image_width: u32,
    image_height: u32,
    measure: F,
) -> CaptionLayout
where
    F: Fn(f32, &str) -> u32,
{
    let text = text.trim().to_uppercase();
    if text.is_empty() {
        return CaptionLayout {
            size: 0.0,
            lines: Vec::new(),
        };
    }

    let max_width = (image_width as f32 * WIDTH_FILL) as u32;
    let mut size = (image_height as f32 / 8.0).max(MIN_FONT_SIZE);

    loop {
        if measure(size, &text) <= max_width {
            return CaptionLayout {
                size,
                lines: vec![text],
            };
        }
        if size <= MIN_FONT_SIZE {
            break;
        }
        size = (size * 0.9).max(MIN_FONT_SIZE);
    }

    CaptionLayout {
        size: MIN_FONT_SIZE,
        lines: wrap_words(&text, max_width, |line| measure(MIN_FONT_SIZE, line)),
    }
}

pub fn outline_width(size: f32) -> u32 {
    ((size / 16.0).round() as u32).max(1)
}

pub fn render_meme(base: &RgbaImage, meme: &MemeText) -> Result<RgbaImage> {
    if meme.top.trim().is_empty() && meme.bottom.trim().is_empty() {
        return Err(ImageToolError::InvalidParameter(
            "Meme needs a top or bottom caption".to_string(),
        ));
    }

    let (width, height) = base.dimensions();
    let measure = |size: f32, line: &str| measure_text(&meme.font, size, line).0;
    let margin = (height as f32 * 0.04).round() as i32;
    let mut out = base.clone();

    let top = layout_caption(&meme.top, width, height, measure);
    let bottom = layout_caption(&meme.bottom, width, height, measure);

    let line_height = |layout: &CaptionLayout| (layout.size * 1.1).round() as i32;

    let mut y = margin;
    draw_caption(&mut out, meme, &top, &mut y, line_height(&top));

    let bottom_block = line_height(&bottom) * bottom.lines.len() as i32;
    let mut y = height as i32 - margin - bottom_block;
    draw_caption(&mut out, meme, &bottom, &mut y, line_height(&bottom));

    log::debug!(
        "Meme captions: top {} line(s) at {:.0}px, bottom {} line(s) at {:.0}px",
        top.lines.len(),
        top.size,
        bottom.lines.len(),
        bottom.size
    );

    Ok(out)
}

fn draw_caption(
    canvas: &mut RgbaImage,
    meme: &MemeText,
    layout: &CaptionLayout,
    y: &mut i32,
    line_height: i32,
) {
    let style = TextStyle {
        size: layout.size,
        fill: meme.fill,
        outline: Some((meme.outline, outline_width(layout.size))),
    };

    for line in &layout.lines {
        let (line_w, _) = measure_text(&meme.font, layout.size, line);
        let x = (canvas.width() as i32 - line_w as i32) / 2;
        draw_line(canvas, &meme.font, line, x, *y, style);
        *y += line_height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Every character is half the font size wide.
    fn measure(size: f32, text: &str) -> u32 {
        (text.chars().count() as f32 * size * 0.5) as u32
    }

    #[test]
    fn short_caption_keeps_starting_size() {
        let layout = layout_caption("hi", 800, 400, measure);
        assert_eq!(layout.size, 50.0);
        assert_eq!(layout.lines, vec!["HI"]);
    }

    #[test]
    fn caption_shrinks_onto_one_line_before_wrapping() {
        let text = "one does not simply walk into mordor";
        let layout = layout_caption(text, 400, 800, measure);
        let max_width = (400.0 * WIDTH_FILL) as u32;

        assert_eq!(layout.lines, vec![text.to_uppercase()]);
        assert!(measure(layout.size, &layout.lines[0]) <= max_width);
        // One more shrink step would have been unnecessary.
        assert!(measure(layout.size / 0.9, &layout.lines[0]) > max_width);
    }

    #[test]
    fn caption_wraps_only_at_minimum_size() {
        let text = "a very long caption that cannot fit";
        let layout = layout_caption(text, 120, 400, measure);
        let max_width = (120.0 * WIDTH_FILL) as u32;

        assert_eq!(layout.size, MIN_FONT_SIZE);
        assert!(layout.lines.len() > 1);
        assert!(layout.lines.iter().all(|l| measure(MIN_FONT_SIZE, l) <= max_width));
        assert_eq!(layout.lines.join(" "), text.to_uppercase());
    }

    #[test]
    fn tiny_image_bottoms_out_at_minimum_size() {
        let layout = layout_caption("a very long caption that cannot fit", 40, 40, measure);
        assert_eq!(layout.size, MIN_FONT_SIZE);
    }

    #[test]
    fn empty_caption_has_no_lines() {
        let layout = layout_caption("  ", 100, 100, measure);
        assert!(layout.lines.is_empty());
    }

    #[test]
    fn outline_grows_with_size() {
        assert_eq!(outline_width(8.0), 1);
        assert_eq!(outline_width(64.0), 4);
    }

    const FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSans-Bold.ttf");

    #[test]
    fn captions_stay_in_their_bands() {
        let font = crate::processors::text::load_font(std::path::Path::new(FONT)).unwrap();
        let base = RgbaImage::from_pixel(200, 200, Rgba([128, 128, 128, 255]));
        let out = render_meme(&base, &MemeText::new("top", "bottom", font)).unwrap();

        let changed = |y: u32| (0..200).any(|x| out.get_pixel(x, y) != base.get_pixel(x, y));
        assert!((0..60).any(changed));
        assert!((140..200).any(changed));
        assert!(!(60..140).any(changed));

        let pixels: Vec<_> = out.pixels().collect();
        assert!(pixels.iter().any(|p| p[0] < 40 && p[1] < 40 && p[2] < 40));
        assert!(pixels.iter().any(|p| p[0] > 230 && p[1] > 230 && p[2] > 230));
    }

    #[test]
    fn meme_without_captions_is_rejected() {
        let font = crate::processors::text::load_font(std::path::Path::new(FONT)).unwrap();
        let base = RgbaImage::new(50, 50);
        assert!(render_meme(&base, &MemeText::new(" ", "", font)).is_err());
    }
}
