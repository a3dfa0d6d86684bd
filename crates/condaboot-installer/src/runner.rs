use std::fs::{self, OpenOptions};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};

use crate::error::BootstrapError;
use crate::PrefixLayout;

/// Runs the self-extracting installer non-interactively against the prefix.
/// The scratch artifact is removed whether the run succeeds or fails.
pub fn run_installer(layout: &PrefixLayout, installer_path: &Path) -> Result<()> {
    layout.ensure_state_dir()?;
    let log_path = layout.install_log_path();

    let mut command = Command::new("bash");
    command
        .arg(installer_path)
        .arg("-bfp")
        .arg(layout.prefix());

    let outcome = spawn_logged(&mut command, &log_path, "installer failed to start");
    let _ = fs::remove_file(installer_path);

    let status = outcome?;
    if !status.success() {
        return Err(BootstrapError::InstallFailure { log_path }.into());
    }
    Ok(())
}

// Stdout and stderr both stream into the append-only log so partial output
// survives a crashed subprocess.
pub(crate) fn spawn_logged(
    command: &mut Command,
    log_path: &Path,
    start_context: &str,
) -> Result<ExitStatus> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log dir: {}", parent.display()))?;
    }
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file: {}", log_path.display()))?;
    let stderr_log = log
        .try_clone()
        .with_context(|| format!("failed to clone log handle: {}", log_path.display()))?;

    command
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(stderr_log))
        .status()
        .with_context(|| start_context.to_string())
}
