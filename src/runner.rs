use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::errors::{BrainExtractError, Result};
use crate::traits::ContainerRunner;

pub const SINGULARITY: &str = "singularity";

/// Mount points of the two dataset roots inside the container.
pub const INPUT_MOUNT: &str = "/input";
pub const OUTPUT_MOUNT: &str = "/output";

/// Threading limit handed to the tool. Singularity forwards `SINGULARITYENV_*`
/// variables into a `--cleanenv` container with the prefix removed.
const THREAD_LIMIT_VAR: &str = "SINGULARITYENV_OMP_NUM_THREADS";
const THREAD_LIMIT: &str = "1";

/// Everything needed for one brain extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInvocation {
    pub container: PathBuf,
    /// Absolute input dataset root, bound to `/input`.
    pub input_dataset: PathBuf,
    /// Absolute output dataset root, bound to `/output`.
    pub output_dataset: PathBuf,
    /// Source image relative to the input dataset.
    pub input_image: String,
    /// Brain image relative to the output dataset. The tool writes the mask beside it.
    pub output_image: String,
}

impl ContainerInvocation {
    pub fn bind_spec(&self) -> OsString {
        let mut spec = OsString::new();
        spec.push(self.input_dataset.as_os_str());
        spec.push(format!(":{INPUT_MOUNT},"));
        spec.push(self.output_dataset.as_os_str());
        spec.push(format!(":{OUTPUT_MOUNT}"));
        spec
    }

    /// Arguments following the runtime executable.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "run".into(),
            "--cleanenv".into(),
            "--nv".into(),
            "-B".into(),
            self.bind_spec(),
            self.container.clone().into_os_string(),
            "-i".into(),
            format!("{INPUT_MOUNT}/{}", self.input_image).into(),
            "-o".into(),
            format!("{OUTPUT_MOUNT}/{}", self.output_image).into(),
        ]
    }
}

/// Outcome of a tool run that did start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Success,
    /// Non-zero exit. `code` is `None` when the process was killed by a signal.
    Failed { code: Option<i32> },
}

impl From<std::process::ExitStatus> for ToolStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            Self::Success
        } else {
            Self::Failed {
                code: status.code(),
            }
        }
    }
}

/// Runs the tool through `singularity run`.
#[derive(Debug, Clone)]
pub struct SingularityRunner {
    executable: PathBuf,
}

impl SingularityRunner {
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    /// Finds `singularity` on PATH.
    pub fn locate() -> Result<Self> {
        Self::locate_in(env::var_os("PATH").as_deref())
    }

    /// Finds `singularity` in the directories of a PATH-style list.
    pub fn locate_in(path_var: Option<&OsStr>) -> Result<Self> {
        let not_found = || BrainExtractError::RuntimeNotFound {
            name: SINGULARITY.to_string(),
        };

        let path_var = path_var.filter(|p| !p.is_empty()).ok_or_else(not_found)?;
        let cwd = env::current_dir()
            .map_err(|e| BrainExtractError::file_system(".", "read current directory", e))?;

        which::which_in(SINGULARITY, Some(path_var), cwd)
            .map(Self::new)
            .map_err(|_| not_found())
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn command(&self, invocation: &ContainerInvocation) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .args(invocation.args())
            .env(THREAD_LIMIT_VAR, THREAD_LIMIT);
        command
    }
}

impl ContainerRunner for SingularityRunner {
    fn run(&self, invocation: &ContainerInvocation) -> Result<ToolStatus> {
        let mut command = self.command(invocation);
        debug!("Running {:?}", command);

        let status = command.status().map_err(|e| {
            BrainExtractError::file_system(&self.executable, "spawn container runtime", e)
        })?;
        Ok(status.into())
    }

    fn name(&self) -> &str {
        SINGULARITY
    }
}
