// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cross-checking annotated volumes against reference volumes

pub mod reference;
pub mod reporter;

pub use reference::{load_reference, VolumeEntry, VolumeTable};
pub use reporter::VerificationReporter;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Closeness rule: `|a - b| <= max(relative * max(|a|, |b|), absolute)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub relative: f64,
    pub absolute: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            relative: 1e-6,
            absolute: 0.0,
        }
    }
}

impl Tolerance {
    pub fn new(relative: f64, absolute: f64) -> Self {
        Self {
            relative: relative.abs(),
            absolute: absolute.abs(),
        }
    }

    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        if !a.is_finite() || !b.is_finite() {
            return false;
        }
        let diff = (a - b).abs();
        diff <= (self.relative * a.abs().max(b.abs())).max(self.absolute)
    }
}

/// Result of checking one example
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    /// Volumes agree within tolerance
    Match,
    /// Volumes differ beyond tolerance
    Mismatch,
    /// One side has no numeric volume
    Unmeasured,
    /// Only one side knows the example
    MissingReference,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Match => "match",
            CheckStatus::Mismatch => "mismatch",
            CheckStatus::Unmeasured => "unmeasured",
            CheckStatus::MissingReference => "missing reference",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CheckStatus::Mismatch | CheckStatus::Unmeasured)
    }
}

/// One example's comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeCheck {
    pub name: String,
    pub measured: Option<f64>,
    pub reference: Option<f64>,
    /// `measured - reference` when both are known
    pub delta: Option<f64>,
    /// `|delta| / |reference|`
    pub relative_delta: Option<f64>,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Complete verification report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub tolerance: Tolerance,
    pub checks: Vec<VolumeCheck>,
    pub matched: usize,
    pub mismatched: usize,
    pub unmeasured: usize,
    pub missing: usize,
}

impl VerificationReport {
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            timestamp: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            tolerance,
            checks: Vec::new(),
            matched: 0,
            mismatched: 0,
            unmeasured: 0,
            missing: 0,
        }
    }

    pub fn add_check(&mut self, check: VolumeCheck) {
        match check.status {
            CheckStatus::Match => self.matched += 1,
            CheckStatus::Mismatch => self.mismatched += 1,
            CheckStatus::Unmeasured => self.unmeasured += 1,
            CheckStatus::MissingReference => self.missing += 1,
        }
        self.checks.push(check);
    }

    pub fn total(&self) -> usize {
        self.checks.len()
    }

    pub fn match_rate(&self) -> f32 {
        let compared = self.matched + self.mismatched + self.unmeasured;
        if compared == 0 {
            0.0
        } else {
            (self.matched as f32 / compared as f32) * 100.0
        }
    }

    pub fn has_failures(&self) -> bool {
        self.mismatched > 0 || self.unmeasured > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &VolumeCheck> {
        self.checks.iter().filter(|c| c.status.is_failure())
    }
}

/// Compare every measured example against `reference`. Reference entries with
/// no measurement are appended as `MissingReference`.
pub fn verify(
    measured: &VolumeTable,
    reference: &VolumeTable,
    tolerance: Tolerance,
) -> VerificationReport {
    let mut report = VerificationReport::new(tolerance);

    for (name, entry) in measured.iter() {
        let check = check_entry(name, Some(entry), reference.get(name), tolerance);
        debug!(example = name, status = check.status.as_str(), "checked volume");
        report.add_check(check);
    }

    for (name, entry) in reference.iter() {
        if measured.get(name).is_none() {
            report.add_check(check_entry(name, None, Some(entry), tolerance));
        }
    }

    report
}

fn check_entry(
    name: &str,
    measured: Option<&VolumeEntry>,
    reference: Option<&VolumeEntry>,
    tolerance: Tolerance,
) -> VolumeCheck {
    let measured_value = measured.and_then(VolumeEntry::value);
    let reference_value = reference.and_then(VolumeEntry::value);

    let (status, note) = match (measured, reference) {
        (Some(_), None) => (CheckStatus::MissingReference, Some("no reference volume".to_string())),
        (None, Some(_)) => (CheckStatus::MissingReference, Some("not measured".to_string())),
        (None, None) => (CheckStatus::MissingReference, None),
        (Some(m), Some(r)) => match (measured_value, reference_value) {
            (Some(a), Some(b)) if tolerance.is_close(a, b) => (CheckStatus::Match, None),
            (Some(_), Some(_)) => (CheckStatus::Mismatch, None),
            _ => (CheckStatus::Unmeasured, unmeasured_note(m, r)),
        },
    };

    let delta = match (measured_value, reference_value) {
        (Some(a), Some(b)) => Some(a - b),
        _ => None,
    };
    let relative_delta = match (delta, reference_value) {
        (Some(d), Some(b)) if b != 0.0 => Some(d.abs() / b.abs()),
        _ => None,
    };

    VolumeCheck {
        name: name.to_string(),
        measured: measured_value,
        reference: reference_value,
        delta,
        relative_delta,
        status,
        note,
    }
}

fn unmeasured_note(measured: &VolumeEntry, reference: &VolumeEntry) -> Option<String> {
    match (measured, reference) {
        (VolumeEntry::Unmeasured(text), _) => Some(format!("measured: {}", text)),
        (_, VolumeEntry::Unmeasured(text)) => Some(format!("reference: {}", text)),
        _ => None,
    }
}
