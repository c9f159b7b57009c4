// pixkit/src/processors/pdf.rs
//! Images to PDF: one JPEG-compressed image per page.
use crate::core::{ImageToolError, OutputFormat, Result};
use crate::processors::Compressor;
use image::{DynamicImage, GenericImageView};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

const A4_WIDTH_PT: f32 = 595.28;
const A4_HEIGHT_PT: f32 = 841.89;
const A4_MARGIN_PT: f32 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageLayout {
    /// Page matches the image, one pixel per point.
    #[default]
    ImageSize,
    /// A4 portrait with the image fitted inside the margins and centered.
    A4,
}

/// Page size and image placement `(x, y, width, height)` in points.
pub fn page_geometry(
    layout: PageLayout,
    (width, height): (u32, u32),
) -> ((f32, f32), (f32, f32, f32, f32)) {
    let (w, h) = (width as f32, height as f32);
    match layout {
        PageLayout::ImageSize => ((w, h), (0.0, 0.0, w, h)),
        PageLayout::A4 => {
            let box_w = A4_WIDTH_PT - 2.0 * A4_MARGIN_PT;
            let box_h = A4_HEIGHT_PT - 2.0 * A4_MARGIN_PT;
            let scale = (box_w / w).min(box_h / h).min(1.0);
            let (draw_w, draw_h) = (w * scale, h * scale);
            let x = (A4_WIDTH_PT - draw_w) / 2.0;
            let y = (A4_HEIGHT_PT - draw_h) / 2.0;
            ((A4_WIDTH_PT, A4_HEIGHT_PT), (x, y, draw_w, draw_h))
        }
    }
}

fn pdf_error(err: lopdf::Error) -> ImageToolError {
    ImageToolError::ProcessingError(format!("PDF error: {}", err))
}

/// Adds one page holding `image` and returns the page's object id.
fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    image: &DynamicImage,
    layout: PageLayout,
    compressor: &Compressor,
) -> Result<ObjectId> {
    let (width, height) = image.dimensions();
    let ((page_w, page_h), (x, y, draw_w, draw_h)) = page_geometry(layout, (width, height));

    let jpeg = compressor.encode(image, OutputFormat::Jpeg)?;
    let image_id = doc.add_object(
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false),
    );

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(draw_w),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(draw_h),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().map_err(pdf_error)?,
    ));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Real(0.0),
            Object::Real(0.0),
            Object::Real(page_w),
            Object::Real(page_h),
        ],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
        "Contents" => content_id,
    });

    log::debug!(
        "Added PDF page {}x{} pt with a {}x{} image",
        page_w,
        page_h,
        width,
        height
    );
    Ok(page_id)
}

/// Builds a PDF with one page per image.
pub fn images_to_pdf(
    images: &[DynamicImage],
    layout: PageLayout,
    compressor: &Compressor,
) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(ImageToolError::InvalidParameter(
            "A PDF needs at least one image".to_string(),
        ));
    }

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(images.len());
    for image in images {
        let page_id = add_page(&mut doc, pages_id, image, layout, compressor)?;
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => images.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(|e| {
        ImageToolError::ProcessingError(format!("Failed to write PDF: {}", e))
    })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn page(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 80, 120])))
    }

    #[test]
    fn image_size_pages_match_pixels() {
        let (size, placement) = page_geometry(PageLayout::ImageSize, (300, 200));
        assert_eq!(size, (300.0, 200.0));
        assert_eq!(placement, (0.0, 0.0, 300.0, 200.0));
    }

    #[test]
    fn a4_fits_and_centers() {
        let ((w, h), (x, y, dw, dh)) = page_geometry(PageLayout::A4, (2000, 1000));
        assert_eq!((w, h), (A4_WIDTH_PT, A4_HEIGHT_PT));
        assert!((dw - (A4_WIDTH_PT - 72.0)).abs() < 0.01);
        assert!((dh - dw / 2.0).abs() < 0.01);
        assert!((x - 36.0).abs() < 0.01);
        assert!((y - (A4_HEIGHT_PT - dh) / 2.0).abs() < 0.01);

        // small images are not upscaled
        let (_, (_, _, dw, dh)) = page_geometry(PageLayout::A4, (100, 50));
        assert_eq!((dw, dh), (100.0, 50.0));
    }

    #[test]
    fn one_page_and_one_jpeg_per_image() {
        let pdf = images_to_pdf(
            &[page(20, 10), page(10, 20)],
            PageLayout::ImageSize,
            &Compressor::new(80),
        )
        .unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));

        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 2);

        let jpegs: Vec<&Stream> = doc
            .objects
            .values()
            .filter_map(|obj| obj.as_stream().ok())
            .filter(|stream| {
                let filter = stream.dict.get(b"Filter").and_then(Object::as_name);
                filter.ok() == Some(&b"DCTDecode"[..])
            })
            .collect();
        assert_eq!(jpegs.len(), 2);
        assert!(jpegs.iter().all(|s| s.content.starts_with(&[0xFF, 0xD8])));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(images_to_pdf(&[], PageLayout::A4, &Compressor::new(80)).is_err());
    }
}
