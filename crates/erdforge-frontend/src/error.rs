//! Frontend errors
//!
//! Only unreadable input is fatal. Everything a frontend can recover from is
//! reported as a diagnostic on the extraction result instead.

use std::path::PathBuf;

/// Fatal frontend errors
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    /// Input source could not be read at all
    #[error("Cannot read input {path}: {reason}")]
    Input { path: PathBuf, reason: String },

    /// Detector output exists but is not valid region data
    #[error("Invalid region data in {path}: {reason}")]
    InvalidRegions { path: PathBuf, reason: String },
}

impl FrontendError {
    pub(crate) fn input(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Input {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}
