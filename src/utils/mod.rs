// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Filesystem and serialization helpers

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{CadexError, Result};

/// Regular files directly inside `dir`, sorted by name, optionally limited to
/// one extension. Symlinks to files count as files.
pub fn list_files(dir: &Path, extension: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            match e.into_io_error() {
                Some(io) => CadexError::io(path, io),
                None => CadexError::NotADirectory(path),
            }
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = extension {
            if path.extension().map(|e| e != ext).unwrap_or(true) {
                continue;
            }
        }
        files.push(path.to_path_buf());
    }

    Ok(files)
}

/// Whether two paths name the same existing filesystem object
pub fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Durations as fractional seconds
pub mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_list_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("example-10.py"), "").unwrap();
        fs::write(dir.path().join("example-02.py"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested.py")).unwrap();
        fs::write(dir.path().join("nested.py").join("inner.py"), "").unwrap();

        let names = |files: Vec<PathBuf>| -> Vec<String> {
            files
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };

        let py = list_files(dir.path(), Some("py")).unwrap();
        assert_eq!(names(py), vec!["example-02.py", "example-10.py"]);

        let all = list_files(dir.path(), None).unwrap();
        assert_eq!(names(all), vec!["example-02.py", "example-10.py", "notes.txt"]);
    }

    #[test]
    fn test_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a");
        fs::create_dir(&nested).unwrap();
        assert!(same_path(&nested, &dir.path().join("a/../a")));
        assert!(!same_path(&nested, dir.path()));
        assert!(!same_path(&nested, &dir.path().join("missing")));
    }

    #[test]
    fn test_duration_round_trip() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Timed {
            #[serde(with = "serde_duration")]
            elapsed: std::time::Duration,
        }

        let json = serde_json::to_string(&Timed {
            elapsed: std::time::Duration::from_millis(1500),
        })
        .unwrap();
        assert_eq!(json, r#"{"elapsed":1.5}"#);
        let back: Timed = serde_json::from_str(&json).unwrap();
        assert_eq!(back.elapsed.as_millis(), 1500);
    }
}
