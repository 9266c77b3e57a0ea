// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Volume tables keyed by example name

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::annotate::{read_annotation, VolumeAnnotation};
use crate::error::{CadexError, IoContext, Result};
use crate::utils::list_files;

/// Recorded volume of one example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VolumeEntry {
    /// Numeric volume in mm^3
    Value(f64),
    /// The example was annotated but produced no number
    Unmeasured(String),
}

impl VolumeEntry {
    pub fn value(&self) -> Option<f64> {
        match self {
            VolumeEntry::Value(v) => Some(*v),
            VolumeEntry::Unmeasured(_) => None,
        }
    }

    fn from_annotation(annotation: VolumeAnnotation) -> Self {
        match annotation.value {
            Some(v) => VolumeEntry::Value(v),
            None => VolumeEntry::Unmeasured(annotation.text),
        }
    }
}

/// Volumes keyed by file stem (`example-01`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeTable {
    entries: BTreeMap<String, VolumeEntry>,
}

#[derive(Debug, Deserialize)]
struct TableFile {
    volumes: BTreeMap<String, f64>,
}

impl VolumeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: VolumeEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&VolumeEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VolumeEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse a `[volumes]` TOML table
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        let file: TableFile = toml::from_str(content).map_err(|e| CadexError::Reference {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut table = Self::new();
        for (name, volume) in file.volumes {
            if !volume.is_finite() {
                return Err(CadexError::Reference {
                    path: origin.to_path_buf(),
                    reason: format!("volume for '{}' is not finite", name),
                });
            }
            table.insert(name, VolumeEntry::Value(volume));
        }
        Ok(table)
    }

    /// Load a `[volumes]` TOML file
    pub fn from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        Self::from_toml_str(&content, path)
    }

    /// Collect the volume comments of every `extension` file in `dir`; files
    /// without a comment are left out
    pub fn from_annotated_dir(dir: &Path, extension: &str) -> Result<Self> {
        if !dir.is_dir() {
            return Err(CadexError::NotADirectory(dir.to_path_buf()));
        }

        let mut table = Self::new();
        for path in list_files(dir, Some(extension))? {
            let Some(name) = stem(&path) else { continue };
            match read_annotation(&path)? {
                Some(annotation) => table.insert(name, VolumeEntry::from_annotation(annotation)),
                None => debug!(file = %path.display(), "no volume comment"),
            }
        }
        Ok(table)
    }
}

/// Reference table from a TOML file or an annotated directory
pub fn load_reference(path: &Path, extension: &str) -> Result<VolumeTable> {
    if !path.exists() {
        return Err(CadexError::InputNotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        VolumeTable::from_annotated_dir(path, extension)
    } else {
        VolumeTable::from_toml(path)
    }
}

fn stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}
