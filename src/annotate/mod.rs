// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Executing example scripts and annotating copies with their volume

pub mod comment;
pub mod runner;

pub use comment::{
    find_annotation, parse_volume, parse_volume_comment, read_annotation, volume_comment,
    VolumeAnnotation, EXECUTION_ERROR,
};
pub use runner::{RunStatus, ScriptOutput, ScriptRunner};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::config::{ToolConfig, DEFAULT_PROBE_LINE};
use crate::error::{CadexError, IoContext, Result};
use crate::utils::serde_duration;
use crate::utils::{list_files, same_path};

/// Outcome of annotating one script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationStatus {
    /// Probe ran and its output was recorded
    Annotated,
    /// Probe exited non-zero or timed out; the error marker was recorded
    ExecutionFailed,
    /// The file could not be processed at all
    Error,
}

/// Per-file annotation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub file: PathBuf,
    pub status: AnnotationStatus,
    /// Text written into the volume comment
    pub volume_text: Option<String>,
    pub volume: Option<f64>,
    #[serde(with = "serde_duration")]
    pub duration: Duration,
    pub error: Option<String>,
}

impl FileOutcome {
    fn failed(file: &Path, duration: Duration, error: &CadexError) -> Self {
        Self {
            file: file.to_path_buf(),
            status: AnnotationStatus::Error,
            volume_text: None,
            volume: None,
            duration,
            error: Some(error.to_string()),
        }
    }
}

/// Summary of an annotation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub outcomes: Vec<FileOutcome>,
    #[serde(with = "serde_duration")]
    pub duration: Duration,
}

impl AnnotationReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn count(&self, status: AnnotationStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.status != AnnotationStatus::Annotated)
    }
}

/// Copies scripts, runs a probe copy of each and appends the printed volume
#[derive(Debug, Clone)]
pub struct VolumeAnnotator {
    runner: ScriptRunner,
    probe_line: String,
    extension: String,
    jobs: Option<usize>,
    show_progress: bool,
}

impl VolumeAnnotator {
    pub fn new(runner: ScriptRunner) -> Self {
        Self {
            runner,
            probe_line: DEFAULT_PROBE_LINE.to_string(),
            extension: "py".to_string(),
            jobs: None,
            show_progress: false,
        }
    }

    /// Build an annotator from the tool configuration
    pub fn from_config(config: &ToolConfig) -> Self {
        Self::new(ScriptRunner::with_timeout(
            config.interpreter.clone(),
            config.timeout(),
        ))
        .probe_line(config.probe_line.clone())
        .extension(config.extension.clone())
        .jobs(config.jobs)
    }

    pub fn probe_line(mut self, line: impl Into<String>) -> Self {
        self.probe_line = line.into();
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs.filter(|n| *n > 0);
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn runner(&self) -> &ScriptRunner {
        &self.runner
    }

    /// Annotate every matching script directly inside `input_dir`
    #[instrument(skip(self), fields(interpreter = self.runner.interpreter()))]
    pub fn annotate_dir(&self, input_dir: &Path, output_dir: &Path) -> Result<AnnotationReport> {
        if !input_dir.exists() {
            return Err(CadexError::InputNotFound(input_dir.to_path_buf()));
        }
        if !input_dir.is_dir() {
            return Err(CadexError::NotADirectory(input_dir.to_path_buf()));
        }
        fs::create_dir_all(output_dir).with_path(output_dir)?;
        if same_path(input_dir, output_dir) {
            return Err(CadexError::SameDirectory(output_dir.to_path_buf()));
        }
        self.runner.ensure_available()?;

        let start = Instant::now();
        let scripts = list_files(input_dir, Some(&self.extension))?;
        info!(count = scripts.len(), "annotating scripts");

        let pb = self.show_progress.then(|| {
            let p = ProgressBar::new(scripts.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                p.set_style(style.progress_chars("#>-"));
            }
            p
        });

        let work = || -> Vec<FileOutcome> {
            scripts
                .par_iter()
                .map(|script| {
                    let file_start = Instant::now();
                    let outcome = self
                        .annotate_file(script, output_dir)
                        .unwrap_or_else(|e| {
                            warn!(file = %script.display(), error = %e, "failed to process file");
                            FileOutcome::failed(script, file_start.elapsed(), &e)
                        });
                    if let Some(ref p) = pb {
                        p.inc(1);
                    }
                    outcome
                })
                .collect()
        };

        let outcomes = match self.jobs {
            Some(jobs) => match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                Ok(pool) => pool.install(work),
                Err(e) => {
                    warn!(error = %e, "falling back to the global thread pool");
                    work()
                }
            },
            None => work(),
        };

        if let Some(p) = pb {
            p.finish_and_clear();
        }

        Ok(AnnotationReport {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            outcomes,
            duration: start.elapsed(),
        })
    }

    /// Copy `script` into `output_dir` and append the probe's output to the copy
    pub fn annotate_file(&self, script: &Path, output_dir: &Path) -> Result<FileOutcome> {
        let start = Instant::now();
        let name = script
            .file_name()
            .ok_or_else(|| CadexError::NotAFile(script.to_path_buf()))?;
        let stem = script
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let copy_path = output_dir.join(name);
        fs::copy(script, &copy_path).with_path(&copy_path)?;
        debug!(from = %script.display(), to = %copy_path.display(), "copied script");

        // The probe file is removed when dropped, including on early return
        let mut probe = tempfile::Builder::new()
            .prefix(&format!("{}_temp", stem))
            .suffix(&format!(".{}", self.extension))
            .tempfile_in(output_dir)
            .with_path(output_dir)?;
        let source = fs::read(script).with_path(script)?;
        probe.write_all(&source).with_path(probe.path())?;
        write!(probe, "\n{}\n", self.probe_line).with_path(probe.path())?;
        probe.flush().with_path(probe.path())?;

        let output = self.runner.run(probe.path())?;

        let (status, captured, error) = match output.status {
            RunStatus::Success => (
                AnnotationStatus::Annotated,
                output.stdout.trim().to_string(),
                None,
            ),
            RunStatus::Failed(code) => (
                AnnotationStatus::ExecutionFailed,
                EXECUTION_ERROR.to_string(),
                Some(failure_message(code, &output.stderr)),
            ),
            RunStatus::TimedOut => (
                AnnotationStatus::ExecutionFailed,
                EXECUTION_ERROR.to_string(),
                Some(format!(
                    "timed out after {:?}",
                    self.runner.timeout().unwrap_or_default()
                )),
            ),
        };

        let mut copy = OpenOptions::new()
            .append(true)
            .open(&copy_path)
            .with_path(&copy_path)?;
        copy.write_all(volume_comment(&captured).as_bytes())
            .with_path(&copy_path)?;

        let probe_path = probe.path().to_path_buf();
        probe.close().with_path(&probe_path)?;

        let volume = match status {
            AnnotationStatus::Annotated => parse_volume(&captured),
            _ => None,
        };
        info!(file = %copy_path.display(), volume = %captured, "annotated");

        Ok(FileOutcome {
            file: script.to_path_buf(),
            status,
            volume_text: Some(captured),
            volume,
            duration: start.elapsed(),
            error,
        })
    }
}

fn failure_message(code: Option<i32>, stderr: &str) -> String {
    let head = match code {
        Some(code) => format!("exited with status {}", code),
        None => "terminated by signal".to_string(),
    };
    // The last stderr line is usually the exception
    match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
        Some(last) => format!("{}: {}", head, last.trim()),
        None => head,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message() {
        assert_eq!(
            failure_message(Some(1), "Traceback (most recent call last):\nNameError: name 'part' is not defined\n\n"),
            "exited with status 1: NameError: name 'part' is not defined"
        );
        assert_eq!(failure_message(None, ""), "terminated by signal");
    }

    #[test]
    fn test_report_counts() {
        let outcome = |status| FileOutcome {
            file: PathBuf::from("example-01.py"),
            status,
            volume_text: None,
            volume: None,
            duration: Duration::ZERO,
            error: None,
        };
        let report = AnnotationReport {
            input_dir: PathBuf::from("examples"),
            output_dir: PathBuf::from("examples_executed"),
            outcomes: vec![
                outcome(AnnotationStatus::Annotated),
                outcome(AnnotationStatus::ExecutionFailed),
                outcome(AnnotationStatus::Annotated),
            ],
            duration: Duration::ZERO,
        };

        assert_eq!(report.total(), 3);
        assert_eq!(report.count(AnnotationStatus::Annotated), 2);
        assert!(report.has_failures());
    }

    #[cfg(unix)]
    #[test]
    fn test_annotate_file_with_shell_probe() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        fs::create_dir_all(&input).unwrap();
        fs::create_dir_all(&output).unwrap();
        let script = input.join("example-01.sh");
        fs::write(&script, "VOLUME=48000.0").unwrap();

        let annotator = VolumeAnnotator::new(ScriptRunner::new("sh"))
            .probe_line("echo $VOLUME")
            .extension("sh");
        let outcome = annotator.annotate_file(&script, &output).unwrap();

        assert_eq!(outcome.status, AnnotationStatus::Annotated);
        assert_eq!(outcome.volume, Some(48000.0));
        assert_eq!(
            fs::read_to_string(output.join("example-01.sh")).unwrap(),
            "VOLUME=48000.0\n# Volume: 48000.0 mm^3\n"
        );
        // only the annotated copy is left behind
        assert_eq!(fs::read_dir(&output).unwrap().count(), 1);
        // source untouched
        assert_eq!(fs::read_to_string(&script).unwrap(), "VOLUME=48000.0");
    }
}
