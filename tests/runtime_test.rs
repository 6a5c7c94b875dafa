//! Drives `SingularityRunner` against stand-in shell scripts.
//!
//! Everything lives in one test so no other thread forks while a script is
//! still open for writing.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use bids_brain_extract::{BrainExtractError, BrainExtractionProcessor, Config, SingularityRunner};

const IMAGE: &str = "sub-01/anat/sub-01_T1w.nii.gz";

// Writes the brain image and mask where the real tool would and records its
// arguments and thread limit beside the output dataset.
const FAKE_SINGULARITY: &str = r#"#!/bin/sh
bind="$5"
out_root="${bind##*,}"
out_root="${out_root%:/output}"
out="${10}"
rel="${out#/output/}"
echo "$@" > "$out_root/../args.txt"
echo "$SINGULARITYENV_OMP_NUM_THREADS" > "$out_root/../threads.txt"
printf brain > "$out_root/$rel"
printf mask > "$out_root/${rel%.nii.gz}_mask.nii.gz"
"#;

const FAILING_SINGULARITY: &str = "#!/bin/sh\nexit 3\n";

fn install_script(dir: &Path, body: &str) -> PathBuf {
    let script = dir.join("singularity");
    fs::write(&script, body).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn dataset(root: &Path) -> Config {
    let input_dataset = root.join("rawdata");
    fs::create_dir_all(input_dataset.join("sub-01/anat")).unwrap();
    fs::write(input_dataset.join(IMAGE), b"nifti").unwrap();
    fs::write(
        input_dataset.join("dataset_description.json"),
        r#"{"Name": "MyStudy"}"#,
    )
    .unwrap();
    let list = root.join("images.txt");
    fs::write(&list, format!("{IMAGE}\n")).unwrap();

    Config {
        container: root.join("hdbet.sif"),
        input_dataset,
        output_dataset: root.join("out"),
        anatomical_images: list,
    }
}

#[test]
fn test_singularity_runner_against_script() {
    // successful extraction
    let temp_dir = TempDir::new().unwrap();
    let config = dataset(temp_dir.path());
    let output_dataset = config.output_dataset.clone();
    let input_dataset = config.input_dataset.clone();
    let script = install_script(temp_dir.path(), FAKE_SINGULARITY);

    let processor =
        BrainExtractionProcessor::new(SingularityRunner::new(script), config).without_progress();
    let summary = processor.run().unwrap();
    assert_eq!(summary.processed, 1);

    let mask = output_dataset.join("sub-01/anat/sub-01_space-T1w_desc-brain_mask.nii.gz");
    assert_eq!(fs::read_to_string(mask).unwrap(), "mask");
    assert!(!output_dataset
        .join("sub-01/anat/sub-01_space-T1w_desc-brain.nii.gz")
        .exists());
    assert!(output_dataset
        .join("sub-01/anat/sub-01_space-T1w_desc-brain_mask.json")
        .exists());

    let threads = fs::read_to_string(temp_dir.path().join("threads.txt")).unwrap();
    assert_eq!(threads.trim(), "1");

    let args = fs::read_to_string(temp_dir.path().join("args.txt")).unwrap();
    assert_eq!(
        args.trim(),
        format!(
            "run --cleanenv --nv -B {}:/input,{}:/output {} -i /input/{IMAGE} -o /output/{}",
            input_dataset.canonicalize().unwrap().display(),
            output_dataset.canonicalize().unwrap().display(),
            temp_dir.path().join("hdbet.sif").display(),
            "sub-01/anat/sub-01_space-T1w_desc-brain.nii.gz",
        )
    );

    // non-zero exit
    let temp_dir = TempDir::new().unwrap();
    let config = dataset(temp_dir.path());
    let output_dataset = config.output_dataset.clone();
    let script = install_script(temp_dir.path(), FAILING_SINGULARITY);

    let processor =
        BrainExtractionProcessor::new(SingularityRunner::new(script), config).without_progress();
    let summary = processor.process_all().unwrap();

    assert_eq!(summary.failed, vec![IMAGE.to_string()]);
    assert!(!output_dataset
        .join("sub-01/anat/sub-01_space-T1w_desc-brain_mask.json")
        .exists());
    assert!(matches!(
        summary.ensure_success(),
        Err(BrainExtractError::ToolFailed { count: 1, .. })
    ));

    // runtime that cannot be spawned
    let temp_dir = TempDir::new().unwrap();
    let config = dataset(temp_dir.path());
    let output_dataset = config.output_dataset.clone();
    let missing = temp_dir.path().join("no-such-singularity");

    let processor =
        BrainExtractionProcessor::new(SingularityRunner::new(missing.clone()), config)
            .without_progress();

    match processor.run() {
        Err(BrainExtractError::FileSystem {
            path,
            operation,
            source,
        }) => {
            assert_eq!(path, missing);
            assert_eq!(operation, "spawn container runtime");
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected spawn failure, got {other:?}"),
    }

    let anat = output_dataset.join("sub-01/anat");
    assert!(!anat
        .join("sub-01_space-T1w_desc-brain_mask.json")
        .exists());
    assert!(!anat
        .join("sub-01_space-T1w_desc-brain_mask.nii.gz")
        .exists());
    assert!(!anat.join("sub-01_space-T1w_desc-brain.nii.gz").exists());
    assert_eq!(fs::read_dir(&anat).unwrap().count(), 0);
}
