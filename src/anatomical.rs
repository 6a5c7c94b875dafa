use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{BrainExtractError, Result};

const NIFTI_GZ: &str = ".nii.gz";

fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.*)_(\w+)\.nii\.gz$").expect("static regex is valid"))
}

/// An anatomical image listed relative to the input dataset root.
///
/// `sub-01/anat/sub-01_T1w.nii.gz` splits into the prefix
/// `sub-01/anat/sub-01` and the suffix `T1w`. All derived outputs live at the
/// same relative location inside the output dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnatomicalImage {
    relative_path: String,
    prefix: String,
    suffix: String,
}

impl AnatomicalImage {
    pub fn parse(relative_path: &str) -> Result<Self> {
        let captures = filename_pattern().captures(relative_path).ok_or_else(|| {
            BrainExtractError::FilenamePattern {
                path: relative_path.to_string(),
            }
        })?;

        Ok(Self {
            relative_path: relative_path.to_string(),
            prefix: captures[1].to_string(),
            suffix: captures[2].to_string(),
        })
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Skull-stripped image the tool writes next to the mask. Deleted after each run.
    pub fn brain_image_path(&self) -> String {
        format!("{}_space-{}_desc-brain{NIFTI_GZ}", self.prefix, self.suffix)
    }

    pub fn mask_path(&self) -> String {
        format!("{}_space-{}_desc-brain_mask{NIFTI_GZ}", self.prefix, self.suffix)
    }

    pub fn sidecar_path(&self) -> String {
        let mask = self.mask_path();
        format!("{}.json", &mask[..mask.len() - NIFTI_GZ.len()])
    }
}

impl fmt::Display for AnatomicalImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_path)
    }
}
