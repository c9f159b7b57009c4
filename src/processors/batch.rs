// pixkit/src/processors/batch.rs
use crate::core::processor::ImageProcessor;
use crate::core::{
    ImageToolError, Operation, OutputFormat, ProcessConfig, ProcessingStats, Result, RunId,
    RunTracker,
};
use crate::utils::{is_supported_format, output_file_name, pipeline_suffix};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Applies one pipeline to every image in a directory.
pub struct BatchProcessor {
    processor: ImageProcessor,
    ops: Vec<Operation>,
    thread_pool: Option<rayon::ThreadPool>,
    show_progress: bool,
}

impl BatchProcessor {
    pub fn new(config: ProcessConfig, ops: Vec<Operation>, max_threads: usize) -> Result<Self> {
        config.validate()?;

        let thread_pool = if max_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(max_threads)
                .build()
                .map_err(|e| {
                    ImageToolError::ProcessingError(format!("Failed to create thread pool: {}", e))
                })?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            processor: ImageProcessor::new(config),
            ops,
            thread_pool,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Processes every image under `input_dir`. Items that start after `run`
    /// has been superseded are skipped and reported as errors.
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        recursive: bool,
        tracker: &RunTracker,
        run: RunId,
    ) -> Result<ProcessingStats> {
        self.validate_paths(input_dir, output_dir)?;

        let image_paths = self.collect_image_paths(input_dir, recursive);

        if image_paths.is_empty() {
            log::warn!("No image files found in {}", input_dir.display());
            return Ok(ProcessingStats::default());
        }

        log::info!(
            "Processing {} images from {} (run {})",
            image_paths.len(),
            input_dir.display(),
            run.value()
        );

        std::fs::create_dir_all(output_dir)?;

        let pb = self.create_progress_bar(image_paths.len());

        let run_all = || -> Vec<(PathBuf, Result<ProcessingStats>)> {
            image_paths
                .par_iter()
                .progress_with(pb.clone())
                .map(|input_path| {
                    let result = tracker
                        .ensure_current(run)
                        .and_then(|_| self.process_one(input_path, input_dir, output_dir));
                    (input_path.clone(), result)
                })
                .collect()
        };

        let results = match &self.thread_pool {
            Some(pool) => pool.install(run_all),
            None => run_all(),
        };

        let mut stats = ProcessingStats::default();
        for (path, result) in results {
            match result {
                Ok(image_stats) => stats.merge(image_stats),
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    stats.errors.push((path.display().to_string(), e.to_string()));
                }
            }
        }

        pb.finish_with_message(format!(
            "Processed {} images ({:.1}% size reduction)",
            stats.processed_count,
            stats.savings_percent()
        ));

        Ok(stats)
    }

    /// Output goes to the same relative directory under `output_dir` so files
    /// with equal names in different subdirectories stay apart.
    fn process_one(
        &self,
        input_path: &Path,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<ProcessingStats> {
        let source_name = input_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ImageToolError::InvalidParameter(format!(
                    "Invalid file name: {}",
                    input_path.display()
                ))
            })?;

        let target_dir = match input_path
            .strip_prefix(input_dir)
            .ok()
            .and_then(Path::parent)
        {
            Some(relative) => output_dir.join(relative),
            None => output_dir.to_path_buf(),
        };

        let format = self
            .processor
            .config()
            .resolve_format(OutputFormat::from_path(input_path));
        let output_path = target_dir.join(output_file_name(
            source_name,
            pipeline_suffix(&self.ops),
            format,
        ));

        self.processor.process(input_path, &output_path, &self.ops)
    }

    fn collect_image_paths(&self, input_dir: &Path, recursive: bool) -> Vec<PathBuf> {
        let walker = if recursive {
            WalkDir::new(input_dir)
        } else {
            WalkDir::new(input_dir).max_depth(1)
        };

        let mut paths: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| is_supported_format(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        paths.sort();
        paths
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    pub fn validate_paths(&self, input_dir: &Path, output_dir: &Path) -> Result<()> {
        if output_dir.to_string_lossy().contains("..") {
            return Err(ImageToolError::SecurityError(
                "Path traversal detected in output path".to_string(),
            ));
        }

        if !input_dir.is_dir() {
            return Err(ImageToolError::InvalidParameter(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        if output_dir.exists() && !output_dir.is_dir() {
            return Err(ImageToolError::InvalidParameter(format!(
                "Output path exists but is not a directory: {}",
                output_dir.display()
            )));
        }

        if input_dir == output_dir {
            return Err(ImageToolError::InvalidParameter(
                "Input and output directories cannot be the same".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::ResizeMode;
    use image::{Rgba, RgbaImage};

    fn fill_dir(dir: &Path, count: usize) {
        for i in 0..count {
            RgbaImage::from_pixel(20, 10, Rgba([i as u8, 0, 0, 255]))
                .save(dir.join(format!("img{}.png", i)))
                .unwrap();
        }
        std::fs::write(dir.join("notes.txt"), b"not an image").unwrap();
    }

    #[test]
    fn processes_every_image() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fill_dir(input.path(), 3);

        let config = ProcessConfig {
            format: Some(OutputFormat::Jpeg),
            ..Default::default()
        };
        let batch = BatchProcessor::new(config, vec![Operation::Resize(ResizeMode::Width(10))], 2)
            .unwrap()
            .with_progress(false);
        let tracker = RunTracker::new();
        let run = tracker.begin();

        let stats = batch
            .process_directory(input.path(), output.path(), false, &tracker, run)
            .unwrap();
        assert_eq!(stats.processed_count, 3);
        assert!(stats.errors.is_empty());
        assert!(output.path().join("img0_resized.jpg").exists());
    }

    #[test]
    fn superseded_run_processes_nothing() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fill_dir(input.path(), 2);

        let batch = BatchProcessor::new(ProcessConfig::default(), Vec::new(), 1)
            .unwrap()
            .with_progress(false);
        let tracker = RunTracker::new();
        let stale = tracker.begin();
        tracker.begin();

        let stats = batch
            .process_directory(input.path(), output.path(), false, &tracker, stale)
            .unwrap();
        assert_eq!(stats.processed_count, 0);
        assert_eq!(stats.errors.len(), 2);
    }

    #[test]
    fn recursive_run_keeps_subdirectories_apart() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        for (dir, shade) in [("a", 10u8), ("b", 200u8)] {
            let sub = input.path().join(dir);
            std::fs::create_dir(&sub).unwrap();
            RgbaImage::from_pixel(4, 4, Rgba([shade, 0, 0, 255]))
                .save(sub.join("img.png"))
                .unwrap();
        }

        let batch = BatchProcessor::new(ProcessConfig::default(), Vec::new(), 2)
            .unwrap()
            .with_progress(false);
        let tracker = RunTracker::new();
        let run = tracker.begin();
        let stats = batch
            .process_directory(input.path(), output.path(), true, &tracker, run)
            .unwrap();

        assert_eq!(stats.processed_count, 2);
        let a = image::open(output.path().join("a/img_converted.png")).unwrap().to_rgba8();
        let b = image::open(output.path().join("b/img_converted.png")).unwrap().to_rgba8();
        assert_eq!(a.get_pixel(0, 0)[0], 10);
        assert_eq!(b.get_pixel(0, 0)[0], 200);
    }

    #[test]
    fn same_input_and_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let batch = BatchProcessor::new(ProcessConfig::default(), Vec::new(), 0).unwrap();
        assert!(batch.validate_paths(dir.path(), dir.path()).is_err());
    }
}
