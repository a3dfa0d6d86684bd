use std::path::PathBuf;

use thiserror::Error;

use crate::verify::UnmetCondition;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("installer checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("installer execution failed; logs are available at {}", log_path.display())]
    InstallFailure { log_path: PathBuf },
    #[error("{context}; logs are available at {}", log_path.display())]
    SubprocessFailure { context: String, log_path: PathBuf },
    #[error("environment checks failed: {}", format_unmet(unmet))]
    CheckFailure { unmet: Vec<UnmetCondition> },
}

fn format_unmet(unmet: &[UnmetCondition]) -> String {
    unmet
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
