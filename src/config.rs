use clap::Parser;
use std::path::PathBuf;

/// Brain extraction over a BIDS dataset using a containerized HD-BET.
///
/// The input and output data are in BIDS format. Because a session may hold
/// several T1w and other anatomical images, the input is a list of anatomical
/// images to process. Masks are written to another BIDS dataset with a
/// sidecar referring to the source data.
///
/// Requires singularity on PATH.
#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about)]
pub struct Config {
    /// Path to the container to run
    #[arg(long)]
    pub container: PathBuf,

    /// Input BIDS dataset dir, containing the source images
    #[arg(long)]
    pub input_dataset: PathBuf,

    /// Output BIDS dataset dir
    #[arg(long)]
    pub output_dataset: PathBuf,

    /// List of anatomical images relative to the input data set
    #[arg(long)]
    pub anatomical_images: PathBuf,
}
