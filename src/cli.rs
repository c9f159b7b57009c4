// pixkit/src/cli.rs
use crate::core::{OutputFormat, ResizeAlgorithm};
use crate::processors::{FlipAxis, PageLayout};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pixkit", version, about = "Crop, resize, watermark and convert images")]
pub struct Cli {
    /// Log every processing step
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output file; defaults to `<name>_<tool>.<ext>` next to the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format; defaults to the output extension, then the input format
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,

    /// Encoding quality for JPEG (1-100)
    #[arg(
        short,
        long,
        default_value_t = 92,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub quality: u8,

    /// Losslessly shrink PNG output
    #[arg(long)]
    pub optimize: bool,

    /// Fill for transparent areas in JPEG/BMP output
    #[arg(long, default_value = "#ffffff")]
    pub background: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resize an image
    Resize {
        input: PathBuf,
        #[arg(short = 'W', long, default_value_t = 0)]
        width: u32,
        #[arg(short = 'H', long, default_value_t = 0)]
        height: u32,
        /// Scale in percent; overrides width and height
        #[arg(short, long, default_value_t = 0.0)]
        scale: f32,
        /// Stretch to exactly width x height
        #[arg(long)]
        exact: bool,
        #[arg(short, long, value_enum, default_value_t = Algorithm::Lanczos3)]
        algorithm: Algorithm,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Crop a rectangle
    Crop {
        input: PathBuf,
        #[arg(long, default_value_t = 0.0)]
        x: f32,
        #[arg(long, default_value_t = 0.0)]
        y: f32,
        #[arg(long)]
        width: f32,
        #[arg(long)]
        height: f32,
        /// Read x, y, width and height as percentages of the image size
        #[arg(long)]
        percent: bool,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Cut out a circle (PNG output by default)
    CircleCrop {
        input: PathBuf,
        #[arg(long, requires = "center_y")]
        center_x: Option<u32>,
        #[arg(long, requires = "center_x")]
        center_y: Option<u32>,
        #[arg(short, long)]
        radius: Option<u32>,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Rotate clockwise by any angle
    Rotate {
        input: PathBuf,
        #[arg(allow_hyphen_values = true)]
        degrees: f32,
        /// Fill for corners uncovered by the rotation
        #[arg(long, default_value = "transparent")]
        fill: String,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Mirror horizontally or vertically
    Flip {
        input: PathBuf,
        #[arg(value_enum)]
        axis: Axis,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Re-encode in another format
    Convert {
        input: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Replace one color with another
    ReplaceColor {
        input: PathBuf,
        #[arg(long)]
        from: String,
        #[arg(long, default_value = "transparent")]
        to: String,
        /// Maximum RGB distance that is fully replaced (0-441)
        #[arg(long, default_value_t = 30.0)]
        tolerance: f32,
        /// Soft edge width as a fraction of the tolerance (0-1)
        #[arg(long, default_value_t = 0.5)]
        feather: f32,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Stamp text or a logo onto an image
    Watermark {
        input: PathBuf,
        #[arg(long, conflicts_with = "image", requires = "font")]
        text: Option<String>,
        /// TrueType/OpenType font for text watermarks
        #[arg(long)]
        font: Option<PathBuf>,
        #[arg(long, default_value_t = 32.0)]
        font_size: f32,
        #[arg(long, default_value = "#ffffff")]
        color: String,
        /// Overlay image instead of text
        #[arg(long)]
        image: Option<PathBuf>,
        /// Overlay width as a percentage of the image width
        #[arg(long, default_value_t = 25.0)]
        width_percent: f32,
        /// Horizontal position, 0 = left, 100 = right
        #[arg(long, default_value_t = 100.0)]
        x: f32,
        /// Vertical position, 0 = top, 100 = bottom
        #[arg(long, default_value_t = 100.0)]
        y: f32,
        #[arg(long, default_value_t = 16)]
        margin: u32,
        #[arg(long, default_value_t = 0.5)]
        opacity: f32,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        rotation: f32,
        /// Repeat over the whole image with this gap in pixels
        #[arg(long)]
        tile: Option<u32>,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Add top and bottom captions
    Meme {
        input: PathBuf,
        #[arg(long, default_value = "")]
        top: String,
        #[arg(long, default_value = "")]
        bottom: String,
        #[arg(long)]
        font: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Cut a sprite sheet into frames
    SpriteSlice {
        input: PathBuf,
        #[arg(long)]
        columns: u32,
        #[arg(long)]
        rows: u32,
        #[arg(long, default_value_t = 0)]
        padding: u32,
        #[arg(long, default_value_t = 0)]
        margin: u32,
        /// Directory for the frames
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = Format::Png)]
        format: Format,
        /// Also write an animated GIF with this frame delay in milliseconds
        #[arg(long)]
        gif: Option<u32>,
    },

    /// Pack images into a sprite sheet
    SpriteSheet {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, default_value_t = 4)]
        columns: u32,
        #[arg(long, default_value_t = 0)]
        padding: u32,
        #[arg(short, long, default_value = "spritesheet.png")]
        output: PathBuf,
    },

    /// Build a looping animated GIF from images
    Gif {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Frame delay in milliseconds
        #[arg(long, default_value_t = 100)]
        delay: u32,
        #[arg(short, long, default_value = "animation.gif")]
        output: PathBuf,
    },

    /// Generate favicon.ico and PNG icons
    Favicon {
        input: PathBuf,
        /// Directory for the icons
        #[arg(short, long, default_value = "favicons")]
        output: PathBuf,
        #[arg(long)]
        optimize: bool,
    },

    /// Render each PDF page to an image
    PdfToImages {
        input: PathBuf,
        /// Directory for the pages
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = Format::Png)]
        format: Format,
        #[arg(
            short,
            long,
            default_value_t = 92,
            value_parser = clap::value_parser!(u8).range(1..=100)
        )]
        quality: u8,
        #[arg(long, default_value_t = 150.0)]
        dpi: f32,
        /// Directory holding the pdfium library; defaults to the system paths
        #[arg(long)]
        pdfium_dir: Option<PathBuf>,
    },

    /// Combine images into a PDF, one page each
    Pdf {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = Layout::Image)]
        layout: Layout,
        #[arg(
            short,
            long,
            default_value_t = 85,
            value_parser = clap::value_parser!(u8).range(1..=100)
        )]
        quality: u8,
        #[arg(short, long, default_value = "images.pdf")]
        output: PathBuf,
    },

    /// Resize and/or convert every image in a directory
    Batch {
        input: PathBuf,
        output: PathBuf,
        #[arg(short = 'W', long, default_value_t = 0)]
        width: u32,
        #[arg(short = 'H', long, default_value_t = 0)]
        height: u32,
        #[arg(short, long, value_enum)]
        format: Option<Format>,
        #[arg(
            short,
            long,
            default_value_t = 85,
            value_parser = clap::value_parser!(u8).range(1..=100)
        )]
        quality: u8,
        /// Worker threads (0 = one per core)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
        #[arg(short, long)]
        recursive: bool,
        #[arg(short, long, value_enum, default_value_t = Algorithm::Lanczos3)]
        algorithm: Algorithm,
    },

    /// Show dimensions, format and EXIF data
    Info { input: PathBuf },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<Algorithm> for ResizeAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Nearest => ResizeAlgorithm::Nearest,
            Algorithm::Bilinear => ResizeAlgorithm::Bilinear,
            Algorithm::Bicubic => ResizeAlgorithm::Bicubic,
            Algorithm::Lanczos3 => ResizeAlgorithm::Lanczos3,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Png,
    #[value(alias = "jpg")]
    Jpeg,
    Webp,
    Bmp,
    Gif,
    Tiff,
    Ico,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Png => OutputFormat::Png,
            Format::Jpeg => OutputFormat::Jpeg,
            Format::Webp => OutputFormat::WebP,
            Format::Bmp => OutputFormat::Bmp,
            Format::Gif => OutputFormat::Gif,
            Format::Tiff => OutputFormat::Tiff,
            Format::Ico => OutputFormat::Ico,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl From<Axis> for FlipAxis {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::Horizontal => FlipAxis::Horizontal,
            Axis::Vertical => FlipAxis::Vertical,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One point per pixel
    Image,
    /// A4 portrait, image fitted inside margins
    A4,
}

impl From<Layout> for PageLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Image => PageLayout::ImageSize,
            Layout::A4 => PageLayout::A4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_rotation() {
        let cli = Cli::try_parse_from(["pixkit", "rotate", "in.png", "-45", "-f", "png"]).unwrap();
        match cli.command {
            Commands::Rotate { degrees, out, .. } => {
                assert_eq!(degrees, -45.0);
                assert_eq!(out.format, Some(Format::Png));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let result = Cli::try_parse_from(["pixkit", "convert", "in.png", "-q", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_pdf_to_images() {
        let cli = Cli::try_parse_from([
            "pixkit",
            "pdf-to-images",
            "doc.pdf",
            "--dpi",
            "200",
            "-f",
            "jpg",
        ])
        .unwrap();
        match cli.command {
            Commands::PdfToImages {
                dpi,
                format,
                pdfium_dir,
                ..
            } => {
                assert_eq!(dpi, 200.0);
                assert_eq!(format, Format::Jpeg);
                assert!(pdfium_dir.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
