use std::fmt;

use condaboot_core::PythonVersion;

use crate::interpose::TrampolineStyle;
use crate::reconcile::executable_on_path;
use crate::PrefixLayout;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub path: Option<String>,
    pub ld_library_path: Option<String>,
    pub pythonpath: Option<String>,
    pub conda_prefix: Option<String>,
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        Self {
            path: std::env::var("PATH").ok(),
            ld_library_path: std::env::var("LD_LIBRARY_PATH").ok(),
            pythonpath: std::env::var("PYTHONPATH").ok(),
            conda_prefix: std::env::var("CONDA_PREFIX").ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmetCondition {
    PackageManagerMissing,
    BinNotOnPath,
    LibNotOnLibraryPath,
    SitePackagesNotImportable,
    InheritedPythonPath,
    CondaPrefixMismatch {
        expected: String,
        found: Option<String>,
    },
}

impl fmt::Display for UnmetCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PackageManagerMissing => {
                write!(f, "no package manager executable on the search path")
            }
            Self::BinNotOnPath => write!(f, "prefix bin directory is not on PATH"),
            Self::LibNotOnLibraryPath => {
                write!(f, "prefix lib directory is not on LD_LIBRARY_PATH")
            }
            Self::SitePackagesNotImportable => {
                write!(f, "installed site-packages is not on the import search path")
            }
            Self::InheritedPythonPath => {
                write!(f, "PYTHONPATH is still inherited from the host environment")
            }
            Self::CondaPrefixMismatch { expected, found } => match found {
                Some(found) => write!(
                    f,
                    "CONDA_PREFIX points at {found} instead of {expected}"
                ),
                None => write!(f, "CONDA_PREFIX is not set (expected {expected})"),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub unmet: Vec<UnmetCondition>,
}

impl CheckReport {
    pub fn is_satisfied(&self) -> bool {
        self.unmet.is_empty()
    }
}

fn contains_entry(value: Option<&str>, entry: &str) -> bool {
    value
        .unwrap_or_default()
        .split(':')
        .any(|candidate| candidate == entry)
}

/// Pure over the snapshot apart from the filesystem probe for the
/// package-manager executable. Every condition is evaluated and reported
/// independently.
pub fn check(
    layout: &PrefixLayout,
    python: PythonVersion,
    style: TrampolineStyle,
    snapshot: &EnvSnapshot,
) -> CheckReport {
    let mut unmet = Vec::new();

    let path_value = snapshot.path.as_deref().unwrap_or_default();
    let manager_found = executable_on_path("conda", path_value).is_some()
        || executable_on_path("mamba", path_value).is_some();
    if !manager_found {
        unmet.push(UnmetCondition::PackageManagerMissing);
    }

    let bin = layout.bin_dir().display().to_string();
    if !contains_entry(snapshot.path.as_deref(), &bin) {
        unmet.push(UnmetCondition::BinNotOnPath);
    }

    let lib = layout.lib_dir().display().to_string();
    if !contains_entry(snapshot.ld_library_path.as_deref(), &lib) {
        unmet.push(UnmetCondition::LibNotOnLibraryPath);
    }

    match style {
        TrampolineStyle::ExecReal => {
            let site_packages = layout.site_packages_dir(python).display().to_string();
            if !contains_entry(snapshot.pythonpath.as_deref(), &site_packages) {
                unmet.push(UnmetCondition::SitePackagesNotImportable);
            }
        }
        TrampolineStyle::ActivateInstalled => {
            // The trampoline unsets PYTHONPATH so the installed interpreter
            // resolves its own site-packages.
            if snapshot
                .pythonpath
                .as_deref()
                .is_some_and(|value| !value.is_empty())
            {
                unmet.push(UnmetCondition::InheritedPythonPath);
            }

            let expected = layout.prefix().display().to_string();
            if snapshot.conda_prefix.as_deref() != Some(expected.as_str()) {
                unmet.push(UnmetCondition::CondaPrefixMismatch {
                    expected,
                    found: snapshot.conda_prefix.clone(),
                });
            }
        }
    }

    CheckReport { unmet }
}
