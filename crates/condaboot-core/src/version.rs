use std::fmt;

use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
}

impl PythonVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let mut parts = trimmed.split('.');
        let major = parts
            .next()
            .filter(|part| !part.is_empty())
            .ok_or_else(|| anyhow!("invalid python version: {value}"))?;
        let minor = parts
            .next()
            .ok_or_else(|| anyhow!("python version must have major.minor: {value}"))?;
        let major = major
            .parse::<u32>()
            .map_err(|_| anyhow!("invalid python major version: {value}"))?;
        let minor = minor
            .parse::<u32>()
            .map_err(|_| anyhow!("invalid python minor version: {value}"))?;
        Ok(Self { major, minor })
    }

    pub fn pin_line(&self) -> String {
        format!("python {}.{}.*", self.major, self.minor)
    }

    pub fn abi_pin_line(&self) -> String {
        format!(
            "python_abi {}.{}.* *cp{}{}*",
            self.major, self.minor, self.major, self.minor
        )
    }

    pub fn lib_dir_name(&self) -> String {
        format!("python{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CudaPin {
    family: String,
}

impl CudaPin {
    pub fn from_env_value(value: Option<&str>) -> Self {
        let family = match value.map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                raw.split('.').take(2).collect::<Vec<_>>().join(".")
            }
            _ => "*.*".to_string(),
        };
        Self { family }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn pin_line(&self) -> String {
        // CUDA 12 dropped the monolithic cudatoolkit package in favor of the
        // cuda-version metapackage.
        if self.family.starts_with("12") {
            format!("cuda-version {}.*", self.family)
        } else {
            format!("cudatoolkit {}.*", self.family)
        }
    }
}
