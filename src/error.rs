// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for cadex operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while splitting, annotating, concatenating or
/// verifying example files.
#[derive(Debug, Error)]
pub enum CadexError {
    /// Input path does not exist.
    #[error("Input path '{}' does not exist", .0.display())]
    InputNotFound(PathBuf),

    /// Input path exists but is not a regular file.
    #[error("Input path '{}' is not a file", .0.display())]
    NotAFile(PathBuf),

    /// Path exists but is not a directory.
    #[error("Path '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Output directory contains a sub-directory and cannot be reset.
    #[error("Directory '{}' inside output directory is not empty", .0.display())]
    OutputNotEmpty(PathBuf),

    /// Input and output directories resolve to the same location.
    #[error("Input and output directories are the same: '{}'", .0.display())]
    SameDirectory(PathBuf),

    /// Script interpreter could not be started.
    #[error("Interpreter '{0}' is not installed or not in PATH")]
    InterpreterUnavailable(String),

    /// Filesystem operation failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be read or written.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A report could not be serialized.
    #[error("Report error: {0}")]
    Report(String),

    /// Reference volume table is malformed.
    #[error("Invalid reference table '{}': {reason}", path.display())]
    Reference { path: PathBuf, reason: String },
}

impl CadexError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Result type for cadex operations.
pub type Result<T> = std::result::Result<T, CadexError>;

/// Attach a path to `std::io::Result` values.
pub(crate) trait IoContext<T> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| CadexError::io(path, e))
    }
}
