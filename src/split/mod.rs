// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Splitting a monolithic example script into one file per example

pub mod naming;
pub mod segment;

pub use naming::{numbered_stem, Heading, NamingScheme};
pub use segment::{is_delimiter_line, split_text, Example};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::error::{CadexError, IoContext, Result};

/// Delimiter interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitMode {
    /// Cut on `#` runs ending a line, trim pieces, drop empty ones
    #[default]
    Trimmed,
    /// Whole `#` lines start examples and stay in them; preamble is dropped
    Delimited,
}

impl SplitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitMode::Trimmed => "trimmed",
            SplitMode::Delimited => "delimited",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trimmed" | "trim" => Some(SplitMode::Trimmed),
            "delimited" | "keep" => Some(SplitMode::Delimited),
            _ => None,
        }
    }
}

/// Options controlling segmentation and output
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOptions {
    pub mode: SplitMode,
    /// Minimum `#` count of a delimiter
    pub min_hashes: usize,
    /// Drop the text before the first delimiter (trimmed mode)
    pub skip_preamble: bool,
    pub naming: NamingScheme,
    /// Extension of written files, without the dot
    pub extension: String,
    /// Empty and re-create the output directory first
    pub clean_output: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            mode: SplitMode::Trimmed,
            min_hashes: 3,
            skip_preamble: false,
            naming: NamingScheme::Numbered,
            extension: "py".to_string(),
            clean_output: true,
        }
    }
}

/// Files produced by a split run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitReport {
    pub output_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

impl SplitReport {
    pub fn count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Split `input` into per-example files inside `output_dir`
#[instrument(skip(options), fields(mode = options.mode.as_str()))]
pub fn extract_examples(
    input: &Path,
    output_dir: &Path,
    options: &SplitOptions,
) -> Result<SplitReport> {
    if options.clean_output {
        reset_output_dir(output_dir)?;
    } else {
        fs::create_dir_all(output_dir).with_path(output_dir)?;
    }

    if !input.exists() {
        return Err(CadexError::InputNotFound(input.to_path_buf()));
    }
    if !input.is_file() {
        return Err(CadexError::NotAFile(input.to_path_buf()));
    }

    let content = fs::read_to_string(input).with_path(input)?;
    let examples = split_text(&content, options);
    debug!(count = examples.len(), "segmented source");

    let mut used = HashSet::new();
    let mut files = Vec::with_capacity(examples.len());

    for example in &examples {
        let name = example.file_name(options.naming, &options.extension, &mut used);
        let path = output_dir.join(&name);
        fs::write(&path, &example.body).with_path(&path)?;
        info!(file = %name, "created example");
        files.push(path);
    }

    Ok(SplitReport {
        output_dir: output_dir.to_path_buf(),
        files,
    })
}

/// Remove files inside `dir` and the directory itself, then re-create it.
/// Sub-directories are never deleted.
pub fn reset_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(CadexError::NotADirectory(dir.to_path_buf()));
        }

        let mut subdirs = Vec::new();
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).with_path(dir)? {
            let entry = entry.with_path(dir)?;
            let file_type = entry.file_type().with_path(entry.path())?;
            if file_type.is_dir() {
                subdirs.push(entry.path());
            } else {
                files.push(entry.path());
            }
        }

        if let Some(subdir) = subdirs.into_iter().next() {
            return Err(CadexError::OutputNotEmpty(subdir));
        }

        for file in files {
            fs::remove_file(&file).with_path(&file)?;
        }
        fs::remove_dir(dir).with_path(dir)?;
        debug!(dir = %dir.display(), "removed previous output");
    }

    fs::create_dir_all(dir).with_path(dir)?;
    Ok(())
}
