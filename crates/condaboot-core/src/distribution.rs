use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Mambaforge,
    Miniforge,
    Miniconda,
    Anaconda,
}

impl Distribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mambaforge => "mambaforge",
            Self::Miniforge => "miniforge",
            Self::Miniconda => "miniconda",
            Self::Anaconda => "anaconda",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "mambaforge" => Ok(Self::Mambaforge),
            "miniforge" => Ok(Self::Miniforge),
            "miniconda" => Ok(Self::Miniconda),
            "anaconda" => Ok(Self::Anaconda),
            _ => Err(anyhow!("unknown distribution: {value}")),
        }
    }

    pub fn installer_url(&self) -> &'static str {
        match self {
            Self::Mambaforge => {
                "https://github.com/conda-forge/miniforge/releases/download/23.1.0-1/Mambaforge-23.1.0-1-Linux-x86_64.sh"
            }
            Self::Miniforge => {
                "https://github.com/conda-forge/miniforge/releases/download/23.1.0-1/Miniforge3-23.1.0-1-Linux-x86_64.sh"
            }
            Self::Miniconda => {
                "https://repo.anaconda.com/miniconda/Miniconda3-py310_23.3.1-0-Linux-x86_64.sh"
            }
            Self::Anaconda => {
                "https://repo.anaconda.com/archive/Anaconda3-2023.03-1-Linux-x86_64.sh"
            }
        }
    }

    pub fn installer_sha256(&self) -> &'static str {
        match self {
            Self::Mambaforge => "cfb16c47dc2d115c8b114280aa605e322173f029fdb847a45348bf4bd23c62ab",
            Self::Miniforge => "7a5859e873ed36fc9a141fff0ac60e133b971b3413aed49a4c82693d4f4a2ad2",
            Self::Miniconda => "aef279d6baea7f67940f16aad17ebe5f6aac97487c7c03466ff01f4819e5a651",
            Self::Anaconda => "95102d7c732411f1458a20bdf47e4c1b0b6c8a21a2edfe4052ca370aaae57bab",
        }
    }
}

impl Default for Distribution {
    fn default() -> Self {
        Self::Mambaforge
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerSource {
    pub url: String,
    pub sha256: Option<String>,
}

impl InstallerSource {
    pub fn from_distribution(distribution: Distribution) -> Self {
        Self {
            url: distribution.installer_url().to_string(),
            sha256: Some(distribution.installer_sha256().to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, sha256: Option<String>) -> Self {
        Self {
            url: url.into(),
            sha256,
        }
    }
}
