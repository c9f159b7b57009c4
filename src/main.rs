use anyhow::{bail, Context, Result};
use clap::Parser;
use log::LevelFilter;
use pixkit::cli::{Cli, Commands, Format, OutputArgs};
use pixkit::processors::{
    html_snippet, images_to_pdf, pdf_raster, sprite, text, CircleCrop, ColorReplace, CropRect,
};
use pixkit::{
    format_file_size, generate_output_path, parse_color, pipeline_suffix, BatchProcessor,
    Compressor, FaviconGenerator, ImageProcessor, Loader, MemeText, MetadataProcessor, Operation,
    OutputFormat, PdfRasterizer, ProcessConfig, ResizeMode, RunTracker, SpriteGrid, Watermark,
    WatermarkContent,
};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Resize {
            input,
            width,
            height,
            scale,
            exact,
            algorithm,
            out,
        } => {
            let mode = ResizeMode::from_options(width, height, scale, !exact);
            let mut config = process_config(&out, None)?;
            config.algorithm = algorithm.into();
            run_single(&input, &out, config, vec![Operation::Resize(mode)])
        }
        Commands::Crop {
            input,
            x,
            y,
            width,
            height,
            percent,
            out,
        } => {
            if x < 0.0 || y < 0.0 || width <= 0.0 || height <= 0.0 {
                bail!("Crop coordinates must be non-negative and the size positive");
            }
            // Percentages are resolved after auto-orientation.
            let op = if percent {
                Operation::CropPercent {
                    x,
                    y,
                    width,
                    height,
                }
            } else {
                Operation::Crop(CropRect::new(x as u32, y as u32, width as u32, height as u32))
            };
            run_single(&input, &out, process_config(&out, None)?, vec![op])
        }
        Commands::CircleCrop {
            input,
            center_x,
            center_y,
            radius,
            out,
        } => {
            let params = CircleCrop {
                center: center_x.zip(center_y),
                radius,
            };
            let config = process_config(&out, Some(OutputFormat::Png))?;
            run_single(&input, &out, config, vec![Operation::CircleCrop(params)])
        }
        Commands::Rotate {
            input,
            degrees,
            fill,
            out,
        } => {
            let background = parse_color(&fill)?;
            let op = Operation::Rotate {
                degrees,
                background,
            };
            run_single(&input, &out, process_config(&out, None)?, vec![op])
        }
        Commands::Flip { input, axis, out } => {
            let op = Operation::Flip(axis.into());
            run_single(&input, &out, process_config(&out, None)?, vec![op])
        }
        Commands::Convert { input, out } => {
            if out.format.is_none() && out.output.is_none() {
                bail!("Pass --format or an --output file name to choose the target format");
            }
            run_single(&input, &out, process_config(&out, None)?, Vec::new())
        }
        Commands::ReplaceColor {
            input,
            from,
            to,
            tolerance,
            feather,
            out,
        } => {
            let params = ColorReplace {
                source: parse_color(&from)?,
                target: parse_color(&to)?,
                tolerance,
                feather,
            };
            let mut config = process_config(&out, None)?;
            // Transparent targets need a format with alpha unless one was asked for.
            let keeps_alpha = config.resolve_format(input_format(&input)).supports_alpha();
            if params.target[3] < 255 && config.format.is_none() && !keeps_alpha {
                config.format = Some(OutputFormat::Png);
            }
            run_single(&input, &out, config, vec![Operation::ReplaceColor(params)])
        }
        Commands::Watermark {
            input,
            text: caption,
            font,
            font_size,
            color,
            image,
            width_percent,
            x,
            y,
            margin,
            opacity,
            rotation,
            tile,
            out,
        } => {
            let content = match (caption, image) {
                (Some(caption), None) => {
                    let font_path = font.context("--font is required for text watermarks")?;
                    WatermarkContent::Text {
                        text: caption,
                        font: text::load_font(&font_path)?,
                        size: font_size,
                        color: parse_color(&color)?,
                    }
                }
                (None, Some(path)) => WatermarkContent::Image {
                    image: Loader::new()
                        .load(&path)
                        .with_context(|| format!("Failed to load overlay {}", path.display()))?
                        .to_rgba8(),
                    width_percent,
                },
                _ => bail!("Pass either --text or --image"),
            };
            let mark = Watermark {
                x_percent: x,
                y_percent: y,
                margin,
                opacity,
                rotation,
                tile_gap: tile,
                ..Watermark::new(content)
            };
            let op = Operation::Watermark(mark);
            run_single(&input, &out, process_config(&out, None)?, vec![op])
        }
        Commands::Meme {
            input,
            top,
            bottom,
            font,
            out,
        } => {
            let meme = MemeText::new(top, bottom, text::load_font(&font)?);
            run_single(&input, &out, process_config(&out, None)?, vec![Operation::Meme(meme)])
        }
        Commands::SpriteSlice {
            input,
            columns,
            rows,
            padding,
            margin,
            output,
            format,
            gif,
        } => {
            let grid = SpriteGrid {
                columns,
                rows,
                padding,
                margin,
            };
            sprite_slice(&input, grid, output, format, gif)
        }
        Commands::SpriteSheet {
            inputs,
            columns,
            padding,
            output,
        } => {
            let frames = load_frames(&inputs)?;
            let sheet = sprite::assemble_sheet(&frames, columns, padding)?;
            let format = OutputFormat::from_path(&output).unwrap_or(OutputFormat::Png);
            let asset = Compressor::new(100).encode_asset(
                &pixkit::DynamicImage::ImageRgba8(sheet),
                format,
                file_name_of(&output),
            )?;
            asset.write_to(&output)?;
            println!(
                "Sprite sheet ({}x{}) saved to: {}",
                asset.width,
                asset.height,
                output.display()
            );
            Ok(())
        }
        Commands::Gif {
            inputs,
            delay,
            output,
        } => {
            let frames = load_frames(&inputs)?;
            let bytes = sprite::encode_gif(&frames, delay)?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Animated GIF with {} frames saved to: {}",
                frames.len(),
                output.display()
            );
            Ok(())
        }
        Commands::Favicon {
            input,
            output,
            optimize,
        } => {
            let image = Loader::new()
                .load(&input)
                .with_context(|| format!("Failed to load {}", input.display()))?;
            let assets = FaviconGenerator::new()
                .with_png_optimization(optimize)
                .write_all(&image, &output)?;
            println!("Wrote {} icons to: {}", assets.len(), output.display());
            println!("\n{}", html_snippet());
            Ok(())
        }
        Commands::PdfToImages {
            input,
            output,
            format,
            quality,
            dpi,
            pdfium_dir,
        } => pdf_to_images(&input, output, format.into(), quality, dpi, pdfium_dir.as_deref()),
        Commands::Pdf {
            inputs,
            layout,
            quality,
            output,
        } => {
            let loader = Loader::new();
            let mut pages = Vec::with_capacity(inputs.len());
            for path in &inputs {
                pages.push(
                    loader
                        .load(path)
                        .with_context(|| format!("Failed to load {}", path.display()))?,
                );
            }
            let bytes = images_to_pdf(&pages, layout.into(), &Compressor::new(quality))?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("PDF with {} pages saved to: {}", pages.len(), output.display());
            Ok(())
        }
        Commands::Batch {
            input,
            output,
            width,
            height,
            format,
            quality,
            threads,
            recursive,
            algorithm,
        } => {
            let config = ProcessConfig {
                format: format.map(Into::into),
                quality,
                algorithm: algorithm.into(),
                ..Default::default()
            };
            let ops = if width > 0 || height > 0 {
                vec![Operation::Resize(ResizeMode::from_options(width, height, 0.0, true))]
            } else {
                Vec::new()
            };

            let tracker = RunTracker::new();
            let run = tracker.begin();
            let stats = BatchProcessor::new(config, ops, threads)?
                .process_directory(&input, &output, recursive, &tracker, run)?;

            println!(
                "Batch processing complete. Processed {} images to: {} ({} -> {})",
                stats.processed_count,
                output.display(),
                format_file_size(stats.total_size_before),
                format_file_size(stats.total_size_after)
            );
            for (path, error) in &stats.errors {
                eprintln!("  failed: {}: {}", path, error);
            }
            Ok(())
        }
        Commands::Info { input } => process_info(&input),
    }
}

fn process_config(out: &OutputArgs, fallback: Option<OutputFormat>) -> Result<ProcessConfig> {
    let format = out
        .format
        .map(OutputFormat::from)
        .or_else(|| out.output.as_deref().and_then(OutputFormat::from_path))
        .or(fallback);

    let config = ProcessConfig {
        format,
        quality: out.quality,
        optimize_png: out.optimize,
        background: parse_color(&out.background)?,
        ..Default::default()
    };
    config.validate()?;
    Ok(config)
}

fn input_format(input: &Path) -> Option<OutputFormat> {
    Loader::new()
        .detect_format(input)
        .ok()
        .and_then(OutputFormat::from_image_format)
}

fn run_single(
    input: &Path,
    out: &OutputArgs,
    config: ProcessConfig,
    ops: Vec<Operation>,
) -> Result<()> {
    let processor = ImageProcessor::new(config);
    let format = processor.config().resolve_format(input_format(input));
    let suffix = pipeline_suffix(&ops);
    let output_path = generate_output_path(input, out.output.as_deref(), suffix, format);

    let stats = processor
        .process(input, &output_path, &ops)
        .with_context(|| format!("Failed to process {}", input.display()))?;

    println!(
        "Saved to: {} ({} -> {})",
        output_path.display(),
        format_file_size(stats.total_size_before),
        format_file_size(stats.total_size_after)
    );
    Ok(())
}

fn sprite_slice(
    input: &Path,
    grid: SpriteGrid,
    output: Option<PathBuf>,
    format: Format,
    gif_delay: Option<u32>,
) -> Result<()> {
    let sheet = Loader::new()
        .load(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    let frames = sprite::slice(&sheet, grid)?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sprite")
        .to_string();
    let output_dir = output.unwrap_or_else(|| input.with_file_name(format!("{}_frames", stem)));
    std::fs::create_dir_all(&output_dir)?;

    let tracker = RunTracker::new();
    let run = tracker.begin();
    let assets = sprite::export_frames(
        &frames,
        &stem,
        format.into(),
        &Compressor::new(92),
        &tracker,
        run,
    )?;
    for asset in &assets {
        asset.write_to(&output_dir.join(&asset.file_name))?;
    }
    println!("Wrote {} frames to: {}", assets.len(), output_dir.display());

    if let Some(delay) = gif_delay {
        let path = output_dir.join(format!("{}.gif", stem));
        std::fs::write(&path, sprite::encode_gif(&frames, delay)?)?;
        println!("Animated GIF saved to: {}", path.display());
    }

    Ok(())
}

fn pdf_to_images(
    input: &Path,
    output: Option<PathBuf>,
    format: OutputFormat,
    quality: u8,
    dpi: f32,
    pdfium_dir: Option<&Path>,
) -> Result<()> {
    let pdf = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let rasterizer = PdfRasterizer::new(pdfium_dir)?.with_dpi(dpi)?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();
    let output_dir = output.unwrap_or_else(|| input.with_file_name(format!("{}_pages", stem)));

    let tracker = RunTracker::new();
    let run = tracker.begin();
    let pages = rasterizer.render_pages(&pdf, &tracker, run)?;
    let assets = pdf_raster::export_pages(
        &pages,
        &stem,
        format,
        &Compressor::new(quality),
        &tracker,
        run,
    )?;

    std::fs::create_dir_all(&output_dir)?;
    for asset in &assets {
        asset.write_to(&output_dir.join(&asset.file_name))?;
    }
    println!("Wrote {} pages to: {}", assets.len(), output_dir.display());
    Ok(())
}

fn load_frames(inputs: &[PathBuf]) -> Result<Vec<image::RgbaImage>> {
    let loader = Loader::new();
    inputs
        .iter()
        .map(|path| {
            loader
                .load(path)
                .map(|image| image.to_rgba8())
                .with_context(|| format!("Failed to load {}", path.display()))
        })
        .collect()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output")
        .to_string()
}

fn process_info(input: &Path) -> Result<()> {
    let processor = ImageProcessor::new(ProcessConfig::default());
    let info = processor
        .get_metadata(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let aspect_ratio = pixkit::calculate_aspect_ratio(info.width, info.height);

    println!("=== Image Information ===");
    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(info.file_size));
    println!("Dimensions: {} x {} pixels", info.width, info.height);
    println!("Aspect Ratio: {:.2}:1", aspect_ratio);
    println!("Format: {}", info.format);
    if let Some(format) = input_format(input) {
        println!("MIME type: {}", format.mime_type());
    }
    println!("Has EXIF metadata: {}", info.has_exif);

    if info.has_exif {
        let metadata = MetadataProcessor::new();
        if let Ok(Some(exif)) = metadata.read_metadata(input) {
            println!();
            print!("{}", metadata.print_metadata(&exif));
        }
    }

    Ok(())
}
