// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! `# Volume: ... mm^3` trailer comments

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{IoContext, Result};

const PREFIX: &str = "# Volume:";
const UNIT: &str = "mm^3";

/// Recorded instead of a volume when the probe run fails
pub const EXECUTION_ERROR: &str = "Error during execution";

/// Volume recovered from a trailer comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeAnnotation {
    /// Text between the prefix and the unit
    pub text: String,
    /// Parsed value, `None` for errors or non-numeric output
    pub value: Option<f64>,
}

impl VolumeAnnotation {
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        Self {
            text: text.to_string(),
            value: parse_volume(text),
        }
    }

    pub fn is_error(&self) -> bool {
        self.text == EXECUTION_ERROR
    }
}

/// Trailer appended to an annotated script. Multi-line output is folded onto
/// one line so the trailer stays a comment.
pub fn volume_comment(captured: &str) -> String {
    let folded = captured
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    format!("\n{} {} {}\n", PREFIX, folded, UNIT)
}

/// Parse a single `# Volume: <text> mm^3` line
pub fn parse_volume_comment(line: &str) -> Option<VolumeAnnotation> {
    let rest = line.trim().strip_prefix(PREFIX)?;
    let rest = rest.trim();
    let text = rest.strip_suffix(UNIT).unwrap_or(rest);
    Some(VolumeAnnotation::from_text(text))
}

/// Last volume comment in `content`
pub fn find_annotation(content: &str) -> Option<VolumeAnnotation> {
    content.lines().rev().find_map(parse_volume_comment)
}

/// Last volume comment in the file at `path`
pub fn read_annotation(path: &Path) -> Result<Option<VolumeAnnotation>> {
    let content = fs::read_to_string(path).with_path(path)?;
    Ok(find_annotation(&content))
}

/// A whole token that is a decimal or scientific number
fn number_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?$")
            .expect("number pattern is valid")
    })
}

/// Numeric volume from captured stdout. Scripts may print more than the
/// volume, so the last number token wins.
pub fn parse_volume(text: &str) -> Option<f64> {
    text.split_whitespace()
        .rev()
        .filter(|token| number_token().is_match(token))
        .filter_map(|token| token.parse::<f64>().ok())
        .find(|v| v.is_finite())
}
