// pixkit/src/processors/metadata.rs
use crate::core::{ImageToolError, Result};
use exif::{Exif, In, Reader, Tag};
use image::DynamicImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const COMMON_FIELDS: [(Tag, &str); 14] = [
    (Tag::ImageDescription, "Description"),
    (Tag::Make, "Camera Make"),
    (Tag::Model, "Camera Model"),
    (Tag::DateTime, "Date/Time"),
    (Tag::DateTimeOriginal, "Original Date/Time"),
    (Tag::ExposureTime, "Exposure Time"),
    (Tag::FNumber, "Aperture"),
    (Tag::FocalLength, "Focal Length"),
    (Tag::PhotographicSensitivity, "ISO"),
    (Tag::Orientation, "Orientation"),
    (Tag::XResolution, "X Resolution"),
    (Tag::YResolution, "Y Resolution"),
    (Tag::Software, "Software"),
    (Tag::Copyright, "Copyright"),
];

pub struct MetadataProcessor;

impl MetadataProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn read_metadata(&self, path: &Path) -> Result<Option<Exif>> {
        let file = File::open(path)?;
        let mut bufreader = BufReader::new(&file);

        match Reader::new().read_from_container(&mut bufreader) {
            Ok(exif) => {
                log::debug!("Found EXIF data in {}", path.display());
                Ok(Some(exif))
            }
            Err(exif::Error::NotFound(_)) => {
                log::debug!("No EXIF data found in {}", path.display());
                Ok(None)
            }
            Err(e) => Err(ImageToolError::ProcessingError(format!(
                "EXIF read error: {}",
                e
            ))),
        }
    }

    pub fn has_metadata(&self, path: &Path) -> Result<bool> {
        Ok(self.read_metadata(path)?.is_some())
    }

    /// EXIF orientation value (1..=8), if the file carries one.
    pub fn orientation(&self, path: &Path) -> Result<Option<u32>> {
        let exif = match self.read_metadata(path)? {
            Some(exif) => exif,
            None => return Ok(None),
        };

        Ok(exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .filter(|value| (1..=8).contains(value)))
    }

    /// Turns an image stored with the given EXIF orientation upright.
    pub fn apply_orientation(&self, image: DynamicImage, orientation: u32) -> DynamicImage {
        if orientation != 1 {
            log::debug!("Applying EXIF orientation {}", orientation);
        }

        match orientation {
            2 => image.fliph(),
            3 => image.rotate180(),
            4 => image.flipv(),
            5 => image.rotate90().fliph(),
            6 => image.rotate90(),
            7 => image.rotate270().fliph(),
            8 => image.rotate270(),
            _ => image,
        }
    }

    pub fn print_metadata(&self, exif: &Exif) -> String {
        let mut output = String::new();
        output.push_str("=== EXIF Metadata ===\n");

        for field in exif.fields() {
            let label = COMMON_FIELDS
                .iter()
                .find(|(tag, _)| *tag == field.tag)
                .map(|(_, label)| label.to_string())
                .unwrap_or_else(|| field.tag.to_string());
            let value = field.display_value().with_unit(exif).to_string();
            output.push_str(&format!("{:25}: {}\n", label, value));
        }

        output
    }
}

impl Default for MetadataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn marker_image() -> DynamicImage {
        // 3x2 with a red pixel at the top-left corner
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        DynamicImage::ImageRgba8(img)
    }

    fn red_at(image: &DynamicImage) -> (u32, u32) {
        image
            .pixels()
            .find(|(_, _, p)| p[0] == 255)
            .map(|(x, y, _)| (x, y))
            .unwrap()
    }

    #[test]
    fn orientation_six_rotates_clockwise() {
        let out = MetadataProcessor::new().apply_orientation(marker_image(), 6);
        assert_eq!(out.dimensions(), (2, 3));
        assert_eq!(red_at(&out), (1, 0));
    }

    #[test]
    fn orientation_five_transposes() {
        let out = MetadataProcessor::new().apply_orientation(marker_image(), 5);
        assert_eq!(out.dimensions(), (2, 3));
        assert_eq!(red_at(&out), (0, 0));
    }

    #[test]
    fn unknown_orientation_is_identity() {
        let out = MetadataProcessor::new().apply_orientation(marker_image(), 1);
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(red_at(&out), (0, 0));
    }
}
