// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Appending per-example files back into a single script

use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::error::{CadexError, IoContext, Result};
use crate::utils::{list_files, same_path};

/// Files appended by a concat run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcatReport {
    pub output: PathBuf,
    pub files: Vec<PathBuf>,
    pub bytes_written: u64,
}

/// Header written before each file's contents
pub fn contents_header(name: &str) -> String {
    format!("\n\n# Contents of {}\n", name)
}

/// Append every file directly inside `input_dir`, in name order, to
/// `output_file`
#[instrument]
pub fn append_files(input_dir: &Path, output_file: &Path) -> Result<ConcatReport> {
    if !input_dir.exists() {
        return Err(CadexError::InputNotFound(input_dir.to_path_buf()));
    }
    if !input_dir.is_dir() {
        return Err(CadexError::NotADirectory(input_dir.to_path_buf()));
    }

    let files = list_files(input_dir, None)?;

    let out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_file)
        .with_path(output_file)?;
    let mut writer = BufWriter::new(out);

    let mut appended = Vec::with_capacity(files.len());
    let mut bytes_written = 0u64;

    for path in files {
        if same_path(&path, output_file) {
            debug!(file = %path.display(), "skipping output file");
            continue;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = fs::read_to_string(&path).with_path(&path)?;
        let header = contents_header(&name);

        writer.write_all(header.as_bytes()).with_path(output_file)?;
        writer.write_all(content.as_bytes()).with_path(output_file)?;
        bytes_written += (header.len() + content.len()) as u64;

        info!(file = %name, output = %output_file.display(), "appended");
        appended.push(path);
    }

    writer.flush().with_path(output_file)?;

    Ok(ConcatReport {
        output: output_file.to_path_buf(),
        files: appended,
        bytes_written,
    })
}
