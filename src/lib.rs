// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! cadex
//!
//! Tooling for collections of parametric CAD example scripts: split a
//! monolithic example file into one file per example, run each script and
//! append its computed volume as a trailing comment, concatenate the results
//! back together, and cross-check volumes against a reference table.
//!
//! All geometry is computed by the external interpreter; cadex only moves
//! text and runs processes.

pub mod annotate;
pub mod cli;
pub mod concat;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod split;
pub mod utils;
pub mod verify;

pub use annotate::{AnnotationReport, AnnotationStatus, ScriptRunner, VolumeAnnotator};
pub use concat::{append_files, ConcatReport};
pub use config::ToolConfig;
pub use error::{CadexError, Result};
pub use pipeline::{run_pipeline, PipelineReport};
pub use split::{extract_examples, split_text, NamingScheme, SplitMode, SplitOptions, SplitReport};
pub use verify::{verify, Tolerance, VerificationReport, VolumeTable};

/// Split options seeded from the tool configuration
pub fn split_options(config: &ToolConfig) -> SplitOptions {
    SplitOptions {
        min_hashes: config.min_hashes,
        extension: config.extension.clone(),
        ..SplitOptions::default()
    }
}
