use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use condaboot_core::{CudaPin, EnvironmentSpec, PythonVersion};
use serde::{Deserialize, Serialize};

use crate::error::BootstrapError;
use crate::runner::spawn_logged;
use crate::PrefixLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManagerKind {
    Mamba,
    Conda,
}

impl PackageManagerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mamba => "mamba",
            Self::Conda => "conda",
        }
    }

    pub fn executable(&self) -> &'static str {
        self.as_str()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

pub fn probe_package_manager(layout: &PrefixLayout) -> PackageManagerKind {
    if layout.mamba_path().is_file() {
        return PackageManagerKind::Mamba;
    }
    if let Ok(path_value) = std::env::var("PATH") {
        if executable_on_path("mamba", &path_value).is_some() {
            return PackageManagerKind::Mamba;
        }
    }
    PackageManagerKind::Conda
}

pub fn executable_on_path(name: &str, path_value: &str) -> Option<PathBuf> {
    path_value
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(name))
        .find(|candidate| candidate.is_file())
}

/// Appends the interpreter, ABI, and CUDA pins. Repeated calls duplicate the
/// lines; the solver tolerates duplicates.
pub fn write_pins(
    layout: &PrefixLayout,
    python: PythonVersion,
    cuda: &CudaPin,
) -> Result<PathBuf> {
    let dir = layout.conda_meta_dir();
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let path = layout.pinned_path();
    let payload = format!(
        "{}\n{}\n{}\n",
        python.pin_line(),
        python.abi_pin_line(),
        cuda.pin_line()
    );
    append_to_file(&path, &payload)?;
    Ok(path)
}

pub fn append_always_yes(layout: &PrefixLayout) -> Result<PathBuf> {
    let path = layout.condarc_path();
    append_to_file(&path, "always_yes: true\n")?;
    Ok(path)
}

fn append_to_file(path: &Path, payload: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(payload.as_bytes())
        .with_context(|| format!("failed to append to {}", path.display()))
}

/// Serializes the merged spec document into the state directory and feeds it
/// to `env update` against the base environment.
pub fn apply_environment_spec(
    layout: &PrefixLayout,
    kind: PackageManagerKind,
    spec: &EnvironmentSpec,
) -> Result<()> {
    layout.ensure_state_dir()?;
    let spec_path = layout.environment_file_path();
    let rendered = spec.to_yaml_string()?;
    fs::write(&spec_path, rendered.as_bytes())
        .with_context(|| format!("failed to write {}", spec_path.display()))?;

    let log_path = layout.env_update_log_path();
    let mut command = Command::new(kind.executable());
    command
        .arg("env")
        .arg("update")
        .arg("-n")
        .arg("base")
        .arg("-f")
        .arg(&spec_path);

    let status = spawn_logged(&mut command, &log_path, "environment update failed to start")?;
    if !status.success() {
        return Err(BootstrapError::SubprocessFailure {
            context: "environment update failed".to_string(),
            log_path,
        }
        .into());
    }
    Ok(())
}

pub fn list_packages(
    layout: &PrefixLayout,
    kind: PackageManagerKind,
) -> Result<Vec<InstalledPackage>> {
    let output = Command::new(kind.executable())
        .arg("list")
        .arg("--json")
        .arg("-p")
        .arg(layout.prefix())
        .output()
        .with_context(|| format!("failed to run {} list", kind.as_str()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        return Err(anyhow!(
            "package listing failed: status={} stdout='{}' stderr='{}'",
            output.status,
            stdout.trim(),
            stderr.trim()
        ));
    }

    serde_json::from_slice(&output.stdout).context("failed to parse package listing output")
}

pub fn install_packages(
    layout: &PrefixLayout,
    kind: PackageManagerKind,
    specs: &[String],
) -> Result<()> {
    if specs.is_empty() {
        return Ok(());
    }

    layout.ensure_state_dir()?;
    let log_path = layout.env_update_log_path();
    let mut command = Command::new(kind.executable());
    command
        .arg("install")
        .arg("-y")
        .arg("-p")
        .arg(layout.prefix())
        .args(specs);

    let status = spawn_logged(&mut command, &log_path, "package install failed to start")?;
    if !status.success() {
        return Err(BootstrapError::SubprocessFailure {
            context: "package install failed".to_string(),
            log_path,
        }
        .into());
    }
    Ok(())
}
