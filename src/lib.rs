pub mod anatomical;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod progress_tracker;
pub mod runner;
pub mod sidecar;
pub mod traits;

pub mod mocks;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

pub use anatomical::AnatomicalImage;
pub use config::Config;
pub use dataset::DatasetDescription;
pub use errors::{BrainExtractError, Result};
pub use progress_tracker::ProgressTracker;
pub use runner::{ContainerInvocation, SingularityRunner, ToolStatus};
pub use sidecar::Sidecar;
pub use traits::*;

/// What happened to a single listed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    Processed,
    MaskExists,
    SourceMissing,
    ToolFailed,
}

/// Per-run tally of image outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped_existing: usize,
    pub skipped_missing: usize,
    /// Relative paths of images whose extraction exited unsuccessfully.
    pub failed: Vec<String>,
}

impl BatchSummary {
    fn record(&mut self, image: &str, outcome: ImageOutcome) {
        match outcome {
            ImageOutcome::Processed => self.processed += 1,
            ImageOutcome::MaskExists => self.skipped_existing += 1,
            ImageOutcome::SourceMissing => self.skipped_missing += 1,
            ImageOutcome::ToolFailed => self.failed.push(image.to_string()),
        }
    }

    pub fn total(&self) -> usize {
        self.processed + self.skipped_existing + self.skipped_missing + self.failed.len()
    }

    /// Turns a run with failed extractions into an error.
    pub fn ensure_success(self) -> Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(BrainExtractError::ToolFailed {
                count: self.failed.len(),
                images: self.failed,
            })
        }
    }
}

/// Dataset-level facts resolved once before the image loop.
struct BatchContext {
    dataset_name: String,
    input_root: PathBuf,
    output_root: PathBuf,
}

/// Sequential brain extraction driver over a list of anatomical images.
pub struct BrainExtractionProcessor<R: ContainerRunner> {
    runner: R,
    config: Config,
    show_progress: bool,
}

impl<R: ContainerRunner> BrainExtractionProcessor<R> {
    pub const fn new(runner: R, config: Config) -> Self {
        Self {
            runner,
            config,
            show_progress: true,
        }
    }

    pub const fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Processes every listed image and fails if any extraction failed.
    pub fn run(&self) -> Result<BatchSummary> {
        self.process_all()?.ensure_success()
    }

    /// Processes every listed image, returning the tally.
    ///
    /// Missing sources and existing masks are skipped. A tool failure is
    /// recorded and the loop moves on. A malformed image name aborts the run.
    pub fn process_all(&self) -> Result<BatchSummary> {
        let images = dataset::read_image_list(&self.config.anatomical_images)?;
        info!("Processing {} images", images.len());

        let description = DatasetDescription::read(&self.config.input_dataset)?;
        let output_root = dataset::ensure_output_dataset(&self.config.output_dataset)?;
        let input_root = dataset::resolve_dir(&self.config.input_dataset)?;

        let context = BatchContext {
            dataset_name: description.name,
            input_root,
            output_root,
        };

        let tracker = if self.show_progress {
            ProgressTracker::new(images.len())
        } else {
            ProgressTracker::hidden(images.len())
        };

        let mut summary = BatchSummary::default();
        for image in &images {
            tracker.start(image);
            let outcome = self.process_single_image(image, &context, &tracker);
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracker.finish();
                    return Err(e);
                }
            };
            summary.record(image, outcome);
            tracker.advance();
        }
        tracker.finish();

        info!(
            "Done: {} processed, {} already done, {} missing, {} failed",
            summary.processed,
            summary.skipped_existing,
            summary.skipped_missing,
            summary.failed.len()
        );
        Ok(summary)
    }

    fn process_single_image(
        &self,
        entry: &str,
        context: &BatchContext,
        tracker: &ProgressTracker,
    ) -> Result<ImageOutcome> {
        if !self.config.input_dataset.join(entry).is_file() {
            tracker.suspend(|| warn!("Anatomical input file not found: {entry}"));
            return Ok(ImageOutcome::SourceMissing);
        }

        tracker.suspend(|| info!("Processing {entry}"));

        let image = AnatomicalImage::parse(entry)?;
        let output_dir = &self.config.output_dataset;

        let mask_path = output_dir.join(image.mask_path());
        if mask_path.exists() {
            tracker.suspend(|| info!("Mask already exists: {}", image.mask_path()));
            return Ok(ImageOutcome::MaskExists);
        }

        if let Some(parent) = mask_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BrainExtractError::file_system(parent, "create output directory", e)
            })?;
        }

        let invocation = ContainerInvocation {
            container: self.config.container.clone(),
            input_dataset: context.input_root.clone(),
            output_dataset: context.output_root.clone(),
            input_image: image.relative_path().to_string(),
            output_image: image.brain_image_path(),
        };

        let status = self.runner.run(&invocation)?;
        if let ToolStatus::Failed { code } = status {
            tracker.suspend(|| {
                error!(
                    "{} exited with {} for {entry}, no sidecar written",
                    self.runner.name(),
                    code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}"))
                )
            });
            return Ok(ImageOutcome::ToolFailed);
        }

        // only the mask is kept
        remove_brain_image(&output_dir.join(image.brain_image_path()), tracker);

        Sidecar::from_source(&context.dataset_name, image.relative_path())
            .write(&output_dir.join(image.sidecar_path()))?;

        Ok(ImageOutcome::Processed)
    }
}

fn remove_brain_image(path: &Path, tracker: &ProgressTracker) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracker.suspend(|| warn!("Brain image not produced: {}", path.display()))
        }
        Err(e) => tracker.suspend(|| warn!("Could not remove {}: {e}", path.display())),
    }
}
