// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Verification report generator

use colored::Colorize;
use std::fs;
use std::path::Path;

use super::{CheckStatus, VerificationReport, VolumeCheck};
use crate::error::{CadexError, IoContext, Result};

/// Verification reporter
pub struct VerificationReporter;

impl VerificationReporter {
    /// Write JSON report
    pub fn write_json(report: &VerificationReport, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| CadexError::Report(format!("failed to serialize report: {}", e)))?;
        fs::write(path.as_ref(), json).with_path(path.as_ref())?;
        Ok(())
    }

    /// Write Markdown report
    pub fn write_markdown(report: &VerificationReport, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), Self::render_markdown(report)).with_path(path.as_ref())?;
        Ok(())
    }

    /// Render the Markdown report
    pub fn render_markdown(report: &VerificationReport) -> String {
        let mut md = String::new();

        md.push_str("# Volume Verification Report\n\n");
        md.push_str(&format!("**Generated:** {}\n\n", report.timestamp));
        md.push_str(&format!(
            "**Tolerance:** relative {:e}, absolute {}\n\n",
            report.tolerance.relative, report.tolerance.absolute
        ));
        md.push_str("---\n\n");

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Examples:** {}\n", report.total()));
        md.push_str(&format!(
            "- **Matched:** {} ({:.1}%)\n",
            report.matched,
            report.match_rate()
        ));
        md.push_str(&format!("- **Mismatched:** {}\n", report.mismatched));
        md.push_str(&format!("- **Unmeasured:** {}\n", report.unmeasured));
        md.push_str(&format!("- **Missing reference:** {}\n\n", report.missing));
        md.push_str("---\n\n");

        md.push_str("## Examples\n\n");
        md.push_str("| Example | Measured (mm^3) | Reference (mm^3) | Delta | Status |\n");
        md.push_str("|---|---:|---:|---:|---|\n");
        for check in &report.checks {
            md.push_str(&format!(
                "| `{}` | {} | {} | {} | {} |\n",
                check.name,
                fmt_volume(check.measured),
                fmt_volume(check.reference),
                fmt_delta(check),
                check.status.as_str()
            ));
        }
        md.push('\n');

        let failures: Vec<_> = report.failures().collect();
        if !failures.is_empty() {
            md.push_str("## Failures\n\n");
            for check in failures {
                md.push_str(&format!("- `{}`: {}\n", check.name, check.status.as_str()));
                if let Some(ref note) = check.note {
                    md.push_str(&format!("  - {}\n", note));
                }
            }
            md.push('\n');
        }

        md
    }

    /// Print terminal summary
    pub fn print_summary(report: &VerificationReport, verbose: bool) {
        println!("\n{}", "═".repeat(80).white());
        println!("{}", "Volume Verification".bold());
        println!("{}", "═".repeat(80).white());
        println!("  {} {}", "Timestamp:".white(), report.timestamp.cyan());
        println!(
            "  {} relative {:e}, absolute {}",
            "Tolerance:".white(),
            report.tolerance.relative,
            report.tolerance.absolute
        );
        println!("  {} {}", "Examples:".white(), report.total().to_string().cyan());
        println!(
            "  {} {} ({:.1}%)",
            "Matched:".white(),
            report.matched.to_string().green(),
            report.match_rate()
        );
        println!(
            "  {} {}",
            "Mismatched:".white(),
            if report.mismatched > 0 {
                report.mismatched.to_string().red()
            } else {
                report.mismatched.to_string().green()
            }
        );
        println!(
            "  {} {}",
            "Unmeasured:".white(),
            if report.unmeasured > 0 {
                report.unmeasured.to_string().red()
            } else {
                report.unmeasured.to_string().green()
            }
        );
        println!(
            "  {} {}",
            "Missing reference:".white(),
            report.missing.to_string().yellow()
        );

        println!("{}", "─".repeat(80).white());
        for check in &report.checks {
            let show = verbose || check.status != CheckStatus::Match;
            if !show {
                continue;
            }

            let icon = match check.status {
                CheckStatus::Match => "✓".green(),
                CheckStatus::Mismatch | CheckStatus::Unmeasured => "✗".red(),
                CheckStatus::MissingReference => "?".yellow(),
            };
            println!(
                "  {} {:<40} {:>16} {:>16}  {}",
                icon,
                check.name,
                fmt_volume(check.measured),
                fmt_volume(check.reference),
                fmt_delta(check).bright_black()
            );
            if let Some(ref note) = check.note {
                println!("      {}", note.yellow());
            }
        }

        println!("{}", "═".repeat(80).white());
    }
}

fn fmt_volume(volume: Option<f64>) -> String {
    match volume {
        Some(v) => format!("{:.3}", v),
        None => "-".to_string(),
    }
}

fn fmt_delta(check: &VolumeCheck) -> String {
    match (check.delta, check.relative_delta) {
        (Some(d), Some(r)) => format!("{:+.3} ({:.2e})", d, r),
        (Some(d), None) => format!("{:+.3}", d),
        _ => "-".to_string(),
    }
}
