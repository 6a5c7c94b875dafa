use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::errors::{BrainExtractError, Result};
use crate::runner::{ContainerInvocation, ToolStatus};
use crate::traits::ContainerRunner;

/// Test runner that records invocations and writes the files the real tool would.
///
/// For every successful run it creates both the brain image and the mask in the
/// output dataset. Images registered with [`RecordingRunner::fail_on`] exit with
/// code 1 and leave only a partial brain image behind.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    invocations: Mutex<Vec<ContainerInvocation>>,
    failing: HashSet<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, input_image: &str) -> Self {
        self.failing.insert(input_image.to_string());
        self
    }

    pub fn invocations(&self) -> Vec<ContainerInvocation> {
        self.invocations.lock().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().len()
    }

    fn write_output(path: PathBuf) -> Result<()> {
        fs::write(&path, b"nifti").map_err(|e| {
            BrainExtractError::file_system(path, "write simulated tool output", e)
        })
    }
}

impl ContainerRunner for RecordingRunner {
    fn run(&self, invocation: &ContainerInvocation) -> Result<ToolStatus> {
        self.invocations.lock().push(invocation.clone());

        let brain_image = invocation.output_dataset.join(&invocation.output_image);
        Self::write_output(brain_image)?;

        if self.failing.contains(&invocation.input_image) {
            return Ok(ToolStatus::Failed { code: Some(1) });
        }

        let mask = invocation
            .output_image
            .strip_suffix(".nii.gz")
            .map(|stem| format!("{stem}_mask.nii.gz"))
            .ok_or_else(|| BrainExtractError::FilenamePattern {
                path: invocation.output_image.clone(),
            })?;
        Self::write_output(invocation.output_dataset.join(mask))?;

        Ok(ToolStatus::Success)
    }

    fn name(&self) -> &str {
        "recording"
    }
}
