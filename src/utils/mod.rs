// pixkit/src/utils/mod.rs
use crate::core::{Operation, OutputFormat};
use std::path::{Path, PathBuf};

/// `{stem}_{suffix}.{ext}` for a source file name. Same inputs, same name.
pub fn output_file_name(source_name: &str, suffix: &str, format: OutputFormat) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(sanitize_filename)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "image".to_string());

    if suffix.is_empty() {
        format!("{}.{}", stem, format.extension())
    } else {
        format!("{}_{}.{}", stem, suffix, format.extension())
    }
}

/// Output path next to the input unless `output` is given.
pub fn generate_output_path(
    input_path: &Path,
    output: Option<&Path>,
    suffix: &str,
    format: OutputFormat,
) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => {
            let source_name = input_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image");
            input_path.with_file_name(output_file_name(source_name, suffix, format))
        }
    }
}

/// Suffix describing a whole pipeline.
pub fn pipeline_suffix(ops: &[Operation]) -> &'static str {
    match ops {
        [] => "converted",
        [op] => op.suffix(),
        _ => "edited",
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.ln() / base.ln()).floor() as usize).min(UNITS.len() - 1);
    let size = bytes_f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}

pub fn calculate_aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        0.0
    } else {
        width as f32 / height as f32
    }
}

pub fn is_supported_format(path: &Path) -> bool {
    let extensions = [
        "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "ico",
    ];

    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn sanitize_filename(filename: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
    filename
        .chars()
        .map(|c| if invalid_chars.contains(&c) { '_' } else { c })
        .collect()
}

pub fn image_format_to_string(format: image::ImageFormat) -> String {
    match format {
        image::ImageFormat::Jpeg => "JPEG",
        image::ImageFormat::Png => "PNG",
        image::ImageFormat::Gif => "GIF",
        image::ImageFormat::WebP => "WebP",
        image::ImageFormat::Pnm => "PNM",
        image::ImageFormat::Tiff => "TIFF",
        image::ImageFormat::Tga => "TGA",
        image::ImageFormat::Bmp => "BMP",
        image::ImageFormat::Ico => "ICO",
        image::ImageFormat::Avif => "AVIF",
        image::ImageFormat::Qoi => "QOI",
        _ => "Unknown",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_deterministic() {
        let a = output_file_name("cat.photo.JPG", "resized", OutputFormat::WebP);
        let b = output_file_name("cat.photo.JPG", "resized", OutputFormat::WebP);
        assert_eq!(a, "cat.photo_resized.webp");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_stem_falls_back_to_image() {
        assert_eq!(output_file_name("", "meme", OutputFormat::Png), "image_meme.png");
        assert_eq!(output_file_name("a:b.png", "", OutputFormat::Jpeg), "a_b.jpg");
    }

    #[test]
    fn output_path_sits_next_to_input() {
        let path = generate_output_path(
            Path::new("/tmp/in/dog.png"),
            None,
            "cropped",
            OutputFormat::Png,
        );
        assert_eq!(path, PathBuf::from("/tmp/in/dog_cropped.png"));

        let explicit = generate_output_path(
            Path::new("dog.png"),
            Some(Path::new("out.jpg")),
            "cropped",
            OutputFormat::Png,
        );
        assert_eq!(explicit, PathBuf::from("out.jpg"));
    }

    #[test]
    fn file_sizes_are_human_readable() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.00 B");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn aspect_ratio_handles_zero_height() {
        assert_eq!(calculate_aspect_ratio(16, 9), 16.0 / 9.0);
        assert_eq!(calculate_aspect_ratio(16, 0), 0.0);
    }

    #[test]
    fn supported_formats_by_extension() {
        assert!(is_supported_format(Path::new("a.PNG")));
        assert!(is_supported_format(Path::new("a.ico")));
        assert!(!is_supported_format(Path::new("a.pdf")));
        assert!(!is_supported_format(Path::new("noext")));
    }
}
