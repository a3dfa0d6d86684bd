use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use condaboot_core::PythonVersion;

mod download;
mod error;
mod interpose;
mod probes;
mod reconcile;
mod restart;
mod runner;
mod verify;

pub use download::fetch_installer;
pub use error::BootstrapError;
pub use interpose::{
    append_startup_hook, apply_environment_patch, backup_path, bind_interpreter,
    compute_environment_patch, patch_live_process, render_trampoline, BindOutcome,
    ProcessEnvironmentPatch, TrampolineStyle, BACKUP_SUFFIX, TRAMPOLINE_MARKER,
};
pub use probes::detect_python_version;
pub use reconcile::{
    append_always_yes, apply_environment_spec, executable_on_path, install_packages,
    list_packages, probe_package_manager, write_pins, InstalledPackage, PackageManagerKind,
};
pub use restart::restart_kernel;
pub use runner::run_installer;
pub use verify::{check, CheckReport, EnvSnapshot, UnmetCondition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixLayout {
    prefix: PathBuf,
}

impl PrefixLayout {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.prefix.join("bin")
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.prefix.join("lib")
    }

    pub fn conda_meta_dir(&self) -> PathBuf {
        self.prefix.join("conda-meta")
    }

    pub fn pinned_path(&self) -> PathBuf {
        self.conda_meta_dir().join("pinned")
    }

    pub fn condarc_path(&self) -> PathBuf {
        self.prefix.join(".condarc")
    }

    pub fn site_packages_dir(&self, python: PythonVersion) -> PathBuf {
        self.lib_dir().join(python.lib_dir_name()).join("site-packages")
    }

    pub fn conda_sh_path(&self) -> PathBuf {
        self.prefix
            .join("etc")
            .join("profile.d")
            .join("conda.sh")
    }

    pub fn python_path(&self) -> PathBuf {
        self.bin_dir().join("python")
    }

    pub fn conda_path(&self) -> PathBuf {
        self.bin_dir().join("conda")
    }

    pub fn mamba_path(&self) -> PathBuf {
        self.bin_dir().join("mamba")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.prefix.join(".condaboot")
    }

    pub fn install_log_path(&self) -> PathBuf {
        self.state_dir().join("install.log")
    }

    pub fn env_update_log_path(&self) -> PathBuf {
        self.state_dir().join("env-update.log")
    }

    pub fn environment_file_path(&self) -> PathBuf {
        self.state_dir().join("environment.yml")
    }

    pub fn installer_scratch_path(&self) -> PathBuf {
        self.state_dir().join("installer.sh")
    }

    pub fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))
    }
}

pub fn default_prefix() -> PathBuf {
    PathBuf::from("/usr/local")
}
