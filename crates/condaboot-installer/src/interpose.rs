use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use condaboot_core::PythonVersion;

use crate::PrefixLayout;

pub const TRAMPOLINE_MARKER: &str = "# condaboot interpreter trampoline";
pub const BACKUP_SUFFIX: &str = ".real";

const MARKER_SCAN_BYTES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrampolineStyle {
    ActivateInstalled,
    ExecReal,
}

impl TrampolineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActivateInstalled => "activate",
            Self::ExecReal => "exec-real",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "activate" => Ok(Self::ActivateInstalled),
            "exec-real" => Ok(Self::ExecReal),
            _ => Err(anyhow!("unknown trampoline style: {value}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    Bound,
    AlreadyBound,
    MissingTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessEnvironmentPatch {
    pub entries: Vec<(String, String)>,
}

pub fn backup_path(exec_path: &Path) -> PathBuf {
    let mut raw = OsString::from(exec_path.as_os_str());
    raw.push(BACKUP_SUFFIX);
    PathBuf::from(raw)
}

/// Replaces the host interpreter with a trampoline script. The original is
/// renamed aside (never copied) so the swap stays on one filesystem.
pub fn bind_interpreter(
    exec_path: &Path,
    layout: &PrefixLayout,
    style: TrampolineStyle,
    env_overrides: &[(String, String)],
) -> Result<BindOutcome> {
    if !exec_path.exists() {
        return Ok(BindOutcome::MissingTarget);
    }
    if carries_trampoline_marker(exec_path)? {
        return Ok(BindOutcome::AlreadyBound);
    }

    let backup = backup_path(exec_path);
    fs::rename(exec_path, &backup).with_context(|| {
        format!(
            "failed to rename interpreter aside: {} -> {}",
            exec_path.display(),
            backup.display()
        )
    })?;

    let trampoline = render_trampoline(style, exec_path, layout, env_overrides);
    fs::write(exec_path, trampoline.as_bytes())
        .with_context(|| format!("failed to write trampoline: {}", exec_path.display()))?;
    make_executable(exec_path)?;

    Ok(BindOutcome::Bound)
}

pub fn render_trampoline(
    style: TrampolineStyle,
    exec_path: &Path,
    layout: &PrefixLayout,
    env_overrides: &[(String, String)],
) -> String {
    let mut script = String::new();
    script.push_str("#!/bin/bash\n");
    script.push_str(TRAMPOLINE_MARKER);
    script.push('\n');

    match style {
        TrampolineStyle::ActivateInstalled => {
            for (key, value) in env_overrides {
                script.push_str(&format!("export {key}={value}\n"));
            }
            script.push_str(&format!(
                "source \"{}\"\n",
                layout.conda_sh_path().display()
            ));
            script.push_str("conda activate base\n");
            script.push_str("unset PYTHONPATH\n");
            script.push_str(&format!(
                "exec \"{}\" \"$@\"\n",
                layout.python_path().display()
            ));
        }
        TrampolineStyle::ExecReal => {
            let mut env_prefix = format!(
                "PATH=\"{bin}:$PATH\" LD_LIBRARY_PATH=\"{lib}:$LD_LIBRARY_PATH\"",
                bin = layout.bin_dir().display(),
                lib = layout.lib_dir().display()
            );
            for (key, value) in env_overrides {
                env_prefix.push_str(&format!(" {key}={value}"));
            }
            script.push_str(&format!(
                "exec env {env_prefix} \"{real}\" -s \"$@\"\n",
                real = backup_path(exec_path).display()
            ));
        }
    }

    script
}

fn carries_trampoline_marker(path: &Path) -> Result<bool> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open interpreter: {}", path.display()))?;
    let mut head = vec![0u8; MARKER_SCAN_BYTES];
    let mut filled = 0;
    while filled < head.len() {
        let read = file
            .read(&mut head[filled..])
            .with_context(|| format!("failed to read interpreter: {}", path.display()))?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(String::from_utf8_lossy(&head[..filled]).contains(TRAMPOLINE_MARKER))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("failed to mark trampoline executable: {}", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Prepend-only overrides. An entry already present in the current value is
/// left alone, so repeated patching never stacks duplicates.
pub fn compute_environment_patch(
    layout: &PrefixLayout,
    python: PythonVersion,
    lookup: impl Fn(&str) -> Option<String>,
) -> ProcessEnvironmentPatch {
    let targets = [
        ("PATH", layout.bin_dir()),
        ("LD_LIBRARY_PATH", layout.lib_dir()),
        ("PYTHONPATH", layout.site_packages_dir(python)),
    ];

    let mut entries = Vec::new();
    for (var, prepend) in targets {
        let prepend = prepend.display().to_string();
        let current = lookup(var).unwrap_or_default();
        if current.split(':').any(|entry| entry == prepend) {
            continue;
        }
        let value = if current.is_empty() {
            prepend
        } else {
            format!("{prepend}:{current}")
        };
        entries.push((var.to_string(), value));
    }

    ProcessEnvironmentPatch { entries }
}

pub fn apply_environment_patch(patch: &ProcessEnvironmentPatch) {
    for (var, value) in &patch.entries {
        std::env::set_var(var, value);
    }
}

/// Appends an interactive-shell startup stanza that inserts the installed
/// site-packages directory at the front of the import search path.
pub fn append_startup_hook(
    layout: &PrefixLayout,
    python: PythonVersion,
    config_path: &Path,
) -> Result<()> {
    let site_packages = layout.site_packages_dir(python);
    let stanza = format!(
        "\nc.InteractiveShellApp.exec_lines = [\n    \
         \"import sys\",\n    \
         \"sp = '{sp}'\",\n    \
         \"if sp not in sys.path:\",\n    \
         \"    sys.path.insert(0, sp)\",\n]\n",
        sp = site_packages.display()
    );

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config_path)
        .with_context(|| format!("failed to open {}", config_path.display()))?;
    file.write_all(stanza.as_bytes())
        .with_context(|| format!("failed to append to {}", config_path.display()))
}

pub fn patch_live_process(
    layout: &PrefixLayout,
    python: PythonVersion,
    config_path: &Path,
) -> Result<ProcessEnvironmentPatch> {
    let patch = compute_environment_patch(layout, python, |var| std::env::var(var).ok());
    apply_environment_patch(&patch);
    append_startup_hook(layout, python, config_path)?;
    Ok(patch)
}
