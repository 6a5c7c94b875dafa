use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{BrainExtractError, Result};

pub const DATASET_DESCRIPTION: &str = "dataset_description.json";

/// The part of `dataset_description.json` the driver needs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatasetDescription {
    #[serde(rename = "Name")]
    pub name: String,
}

impl DatasetDescription {
    pub fn read(dataset_dir: &Path) -> Result<Self> {
        let path = dataset_dir.join(DATASET_DESCRIPTION);
        let contents = fs::read_to_string(&path)
            .map_err(|e| BrainExtractError::file_system(&path, "read dataset description", e))?;

        serde_json::from_str(&contents).map_err(|e| BrainExtractError::DatasetDescription {
            path,
            reason: e.to_string(),
        })
    }
}

/// Reads the newline-delimited list of images, relative to the input dataset.
///
/// Trailing whitespace is stripped from every line and blank lines are dropped.
pub fn read_image_list(list_path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(list_path)
        .map_err(|e| BrainExtractError::file_system(list_path, "read anatomical image list", e))?;

    let images = contents
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = line.trim_end();
            if line.is_empty() {
                debug!("Ignoring blank line {} in {}", index + 1, list_path.display());
                None
            } else {
                Some(line.to_string())
            }
        })
        .collect();

    Ok(images)
}

/// Creates the output dataset root if it does not exist yet and returns its
/// absolute, symlink-resolved location.
pub fn ensure_output_dataset(output_dir: &Path) -> Result<PathBuf> {
    if !output_dir.is_dir() {
        info!("Creating output dataset {}", output_dir.display());
        fs::create_dir_all(output_dir).map_err(|e| {
            BrainExtractError::file_system(output_dir, "create output dataset", e)
        })?;
    }

    resolve_dir(output_dir)
}

pub fn resolve_dir(dir: &Path) -> Result<PathBuf> {
    dir.canonicalize()
        .map_err(|e| BrainExtractError::file_system(dir, "resolve absolute path", e))
}
