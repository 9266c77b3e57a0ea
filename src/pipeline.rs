// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Split → annotate → concatenate in one run

use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, instrument};

use crate::annotate::{AnnotationReport, VolumeAnnotator};
use crate::concat::{append_files, ConcatReport};
use crate::config::ToolConfig;
use crate::error::{IoContext, Result};
use crate::split::{extract_examples, SplitOptions, SplitReport};

/// Results of every pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub split: SplitReport,
    pub annotation: AnnotationReport,
    pub concat: ConcatReport,
}

/// Run the full pipeline over `config.paths`. The final file is recreated so
/// repeated runs do not accumulate copies.
#[instrument(skip_all, fields(source = %config.paths.source.display()))]
pub fn run_pipeline(
    config: &ToolConfig,
    split_options: &SplitOptions,
    show_progress: bool,
) -> Result<PipelineReport> {
    let paths = &config.paths;

    let split = extract_examples(&paths.source, &paths.examples_dir, split_options)?;
    info!(examples = split.count(), "split stage done");

    let annotator = VolumeAnnotator::from_config(config)
        .extension(split_options.extension.clone())
        .show_progress(show_progress);
    let annotation = annotator.annotate_dir(&paths.examples_dir, &paths.executed_dir)?;
    info!(annotated = annotation.total(), "annotate stage done");

    if paths.final_file.exists() {
        fs::remove_file(&paths.final_file).with_path(&paths.final_file)?;
    }
    let concat = append_files(&paths.executed_dir, &paths.final_file)?;
    info!(files = concat.files.len(), "concat stage done");

    Ok(PipelineReport {
        split,
        annotation,
        concat,
    })
}
