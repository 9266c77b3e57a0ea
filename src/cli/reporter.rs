// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use colored::*;
use std::path::Path;
use std::time::Duration;

use crate::annotate::{AnnotationReport, AnnotationStatus};
use crate::concat::ConcatReport;
use crate::split::SplitReport;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report created example files
    pub fn report_split(report: &SplitReport) {
        for file in &report.files {
            println!("{} {}", "Created".green(), file_name(file).cyan());
        }

        if report.is_empty() {
            Self::report_warning("No examples found in the input file.");
        } else {
            Self::success(&format!(
                "Successfully processed {} examples into {}",
                report.count(),
                report.output_dir.display()
            ));
        }
    }

    /// Report per-file annotation outcomes
    pub fn report_annotation(report: &AnnotationReport, verbose: bool) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!(
            "{} {} → {}",
            "Annotated:".bold(),
            report.input_dir.display().to_string().cyan(),
            report.output_dir.display().to_string().cyan()
        );
        println!("{}", "━".repeat(80).bright_black());

        for outcome in &report.outcomes {
            let name = file_name(&outcome.file);
            let volume = outcome.volume_text.as_deref().unwrap_or("-");
            match outcome.status {
                AnnotationStatus::Annotated => {
                    println!(
                        "  {} {:<48} {} {}",
                        "✓".green(),
                        name,
                        volume.cyan(),
                        "mm^3".bright_black()
                    );
                }
                AnnotationStatus::ExecutionFailed => {
                    println!("  {} {:<48} {}", "✗".red(), name, volume.red());
                }
                AnnotationStatus::Error => {
                    println!("  {} {:<48} {}", "✗".red(), name, "not processed".red());
                }
            }

            if let Some(ref err) = outcome.error {
                if verbose || outcome.status == AnnotationStatus::Error {
                    println!("      {}", err.yellow());
                }
            }
            if verbose {
                println!(
                    "      {} {}",
                    "Time:".bright_black(),
                    Self::format_duration(outcome.duration).yellow()
                );
            }
        }

        println!("{}", "━".repeat(80).bright_black());
        println!(
            "  {} {} | {} {} | {} {} | {} {}",
            "Total:".bright_black(),
            report.total().to_string().cyan(),
            "Annotated:".bright_black(),
            report.count(AnnotationStatus::Annotated).to_string().green(),
            "Failed:".bright_black(),
            colored_count(report.count(AnnotationStatus::ExecutionFailed)),
            "Errors:".bright_black(),
            colored_count(report.count(AnnotationStatus::Error)),
        );
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(report.duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report concatenated files
    pub fn report_concat(report: &ConcatReport) {
        for file in &report.files {
            println!(
                "{} {} to {}",
                "Appending".green(),
                file_name(file).cyan(),
                report.output.display()
            );
        }
        Self::success(&format!(
            "Appended {} files ({} bytes) to {}",
            report.files.len(),
            report.bytes_written,
            report.output.display()
        ));
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print stage message
    pub fn progress(message: &str) {
        println!("{} {}...", "⏳".bright_blue(), message.bright_black());
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn colored_count(count: usize) -> ColoredString {
    if count > 0 {
        count.to_string().red()
    } else {
        count.to_string().green()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(
            Reporter::format_duration(Duration::from_micros(500)),
            "500µs"
        );
        assert_eq!(
            Reporter::format_duration(Duration::from_millis(5)),
            "5.00ms"
        );
        assert_eq!(Reporter::format_duration(Duration::from_secs(2)), "2.00s");
    }

    #[test]
    fn test_message_helpers_print() {
        Reporter::report_error("Failed to load configuration: bad value");
        Reporter::report_warning("No examples found in the input file.");
        Reporter::report_info("Report written to report.json");
        Reporter::success("done");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Path::new("examples/example-01.py")), "example-01.py");
        assert_eq!(file_name(Path::new("/")), "/");
    }
}
