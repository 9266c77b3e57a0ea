// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tool configuration system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CadexError, IoContext, Result};
use crate::verify::Tolerance;

/// Default configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "cadex.toml";

/// Default interpreter used to execute example scripts
#[cfg(windows)]
pub const DEFAULT_INTERPRETER: &str = "python";
#[cfg(not(windows))]
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Line appended to the probe copy of every script
pub const DEFAULT_PROBE_LINE: &str = "print(part.volume)";

/// Locations used by the end-to-end pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelinePaths {
    /// Monolithic example file to split
    pub source: PathBuf,
    /// Directory receiving one file per example
    pub examples_dir: PathBuf,
    /// Directory receiving annotated copies
    pub executed_dir: PathBuf,
    /// File the annotated examples are appended to
    pub final_file: PathBuf,
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self {
            source: PathBuf::from("general_examples5.py"),
            examples_dir: PathBuf::from("examples"),
            executed_dir: PathBuf::from("examples_executed"),
            final_file: PathBuf::from("examples_final.py"),
        }
    }
}

/// Tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Interpreter executable used to run scripts
    pub interpreter: String,
    /// Statement appended to probe copies; its stdout becomes the volume
    pub probe_line: String,
    /// Extension of example scripts, without the dot
    pub extension: String,
    /// Minimum number of `#` characters forming a delimiter
    pub min_hashes: usize,
    /// Per-script timeout in seconds, 0 disables it
    pub timeout_secs: u64,
    /// Maximum parallel workers, auto-detected when unset
    pub jobs: Option<usize>,
    /// Relative tolerance for volume comparison
    pub rel_tolerance: f64,
    /// Absolute tolerance for volume comparison
    pub abs_tolerance: f64,
    /// Verbose output
    pub verbose: bool,
    /// Pipeline locations
    pub paths: PipelinePaths,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            probe_line: DEFAULT_PROBE_LINE.to_string(),
            extension: "py".to_string(),
            min_hashes: 3,
            timeout_secs: 120,
            jobs: None,
            rel_tolerance: 1e-6,
            abs_tolerance: 0.0,
            verbose: false,
            paths: PipelinePaths::default(),
        }
    }
}

impl ToolConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_path(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| CadexError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `cadex.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load an explicit config file (or `cadex.toml` when `None`), then apply
    /// environment overrides
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(CONFIG_FILE)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `CADEX_*` overrides from a variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(interpreter) = lookup("CADEX_PYTHON") {
            self.interpreter = interpreter;
        }

        if let Some(jobs) = lookup("CADEX_JOBS") {
            self.jobs = jobs.parse().ok().filter(|n| *n > 0);
        }

        if let Some(timeout) = lookup("CADEX_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.timeout_secs = secs;
            }
        }

        if let Some(verbose) = lookup("CADEX_VERBOSE") {
            self.verbose = parse_flag(&verbose);
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path.as_ref(), content).with_path(path.as_ref())?;
        Ok(())
    }

    /// Render configuration as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CadexError::Config(format!("failed to serialize config: {}", e)))
    }

    /// Per-script timeout
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Volume comparison tolerance
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.rel_tolerance, self.abs_tolerance)
    }
}

/// `true`, `1`, `yes` and `on`, in any case, enable a flag
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
