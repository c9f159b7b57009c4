// pixkit/src/processors/text.rs
use crate::core::{ImageToolError, Result};
use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::Path;

pub fn load_font(path: &Path) -> Result<FontArc> {
    let data = std::fs::read(path)?;
    FontArc::try_from_vec(data)
        .map_err(|e| ImageToolError::Font(format!("{}: {}", path.display(), e)))
}

pub fn measure_text(font: &FontArc, size: f32, text: &str) -> (u32, u32) {
    text_size(PxScale::from(size), font, text)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub fill: Rgba<u8>,
    pub outline: Option<(Rgba<u8>, u32)>,
}

/// Renders one line of text onto a transparent layer just large enough to
/// hold it and its outline.
pub fn render_text_layer(font: &FontArc, text: &str, style: TextStyle) -> RgbaImage {
    let (text_w, text_h) = measure_text(font, style.size, text);
    let stroke = style.outline.map(|(_, width)| width).unwrap_or(0);
    // Room for descenders that text_size does not always report.
    let pad = stroke + (style.size * 0.2).ceil() as u32;

    // Glyph edges blend toward the existing pixel, so start from the color
    // drawn first at zero alpha to keep edges from darkening.
    let first = style.outline.map(|(color, _)| color).unwrap_or(style.fill);
    let mut layer = RgbaImage::from_pixel(
        text_w + pad * 2,
        text_h + pad * 2,
        Rgba([first[0], first[1], first[2], 0]),
    );
    draw_line(&mut layer, font, text, pad as i32, pad as i32, style);
    layer
}

/// Draws a line at `(x, y)` with its outline, if any, stroked underneath.
pub fn draw_line(
    canvas: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    x: i32,
    y: i32,
    style: TextStyle,
) {
    let scale = PxScale::from(style.size);

    if let Some((color, width)) = style.outline {
        let width = width as i32;
        for dy in -width..=width {
            for dx in -width..=width {
                if dx * dx + dy * dy > width * width || (dx == 0 && dy == 0) {
                    continue;
                }
                draw_text_mut(canvas, color, x + dx, y + dy, scale, font, text);
            }
        }
    }

    draw_text_mut(canvas, style.fill, x, y, scale, font, text);
}

/// Greedy word wrap of `text` into lines no wider than `max_width` as
/// reported by `measure`. A single word wider than `max_width` gets its own line.
pub fn wrap_words<F>(text: &str, max_width: u32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> u32,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        let measure = |s: &str| s.chars().count() as u32;
        let lines = wrap_words("one two three four", 9, measure);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn long_word_gets_its_own_line() {
        let measure = |s: &str| s.chars().count() as u32;
        let lines = wrap_words("a supercalifragilistic b", 5, measure);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(wrap_words("   ", 10, |s: &str| s.len() as u32).is_empty());
    }

    #[test]
    fn missing_font_is_an_error() {
        assert!(load_font(Path::new("/nonexistent/font.ttf")).is_err());
    }

    const FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSans-Bold.ttf");

    #[test]
    fn measures_with_a_real_font() {
        let font = load_font(Path::new(FONT)).unwrap();
        let (short, height) = measure_text(&font, 32.0, "Hi");
        let (long, _) = measure_text(&font, 32.0, "Hi there");
        assert!(short > 0 && height > 0);
        assert!(long > short);
    }

    #[test]
    fn layer_edges_keep_the_fill_color() {
        let font = load_font(Path::new(FONT)).unwrap();
        let fill = Rgba([255, 255, 255, 255]);
        let layer = render_text_layer(
            &font,
            "Wm",
            TextStyle {
                size: 40.0,
                fill,
                outline: None,
            },
        );

        assert!(layer.pixels().any(|p| p[3] == 255));
        assert!(layer.pixels().any(|p| p[3] > 0 && p[3] < 255));
        for p in layer.pixels().filter(|p| p[3] > 0) {
            assert!(p[0] >= 250 && p[1] >= 250 && p[2] >= 250, "dark edge pixel {:?}", p);
        }
    }

    #[test]
    fn outline_is_drawn_around_the_fill() {
        let font = load_font(Path::new(FONT)).unwrap();
        let plain = TextStyle {
            size: 40.0,
            fill: Rgba([255, 255, 255, 255]),
            outline: None,
        };
        let outlined = TextStyle {
            outline: Some((Rgba([0, 0, 0, 255]), 3)),
            ..plain
        };

        let mut canvas = RgbaImage::from_pixel(120, 60, Rgba([128, 128, 128, 255]));
        draw_line(&mut canvas, &font, "O", 10, 5, outlined);

        let dark = canvas.pixels().filter(|p| p[0] < 30).count();
        let light = canvas.pixels().filter(|p| p[0] > 225).count();
        assert!(dark > 0 && light > 0);

        let mut bare = RgbaImage::from_pixel(120, 60, Rgba([128, 128, 128, 255]));
        draw_line(&mut bare, &font, "O", 10, 5, plain);
        assert_eq!(bare.pixels().filter(|p| p[0] < 30).count(), 0);
    }
}
