use crate::errors::Result;
use crate::runner::{ContainerInvocation, ToolStatus};

/// Abstraction over the container runtime that executes the brain extraction tool.
///
/// The batch driver depends on this trait rather than on a concrete runtime so
/// tests can stand in a double that never spawns a process.
pub trait ContainerRunner: Send + Sync {
    /// Run the tool once and block until it exits.
    ///
    /// `Err` means the runtime could not be started at all. A tool that ran
    /// and exited unsuccessfully is reported as `ToolStatus::Failed`.
    fn run(&self, invocation: &ContainerInvocation) -> Result<ToolStatus>;

    /// Human readable runtime name, used in log lines.
    fn name(&self) -> &str;
}
