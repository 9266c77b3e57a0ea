// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! cadex CLI

use anyhow::{anyhow, Context, Result};
use cadex::cli::{init_tracing, Reporter};
use cadex::split::{extract_examples, NamingScheme, SplitMode, SplitOptions};
use cadex::verify::{load_reference, verify, VerificationReporter, VolumeTable};
use cadex::{append_files, run_pipeline, split_options, ToolConfig, VolumeAnnotator};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cadex")]
#[command(about = "Split, execute, annotate and cross-check CAD example scripts", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./cadex.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SplitArgs {
    /// Delimiter handling (trimmed, delimited)
    #[arg(long, default_value = "trimmed")]
    mode: String,

    /// File naming (numbered, heading)
    #[arg(long, default_value = "numbered")]
    naming: String,

    /// Drop the text before the first delimiter
    #[arg(long)]
    skip_preamble: bool,

    /// Keep existing files in the output directory
    #[arg(long)]
    no_clean: bool,

    /// Minimum number of '#' characters in a delimiter
    #[arg(long)]
    min_hashes: Option<usize>,
}

#[derive(Args, Clone)]
struct RunArgs {
    /// Interpreter used to run scripts
    #[arg(long)]
    interpreter: Option<String>,

    /// Statement appended to each probe copy
    #[arg(long)]
    probe: Option<String>,

    /// Per-script timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,

    /// Parallel workers
    #[arg(short, long)]
    jobs: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a monolithic example file into one file per example
    Split {
        /// Input example file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        split: SplitArgs,
    },

    /// Run every script and append its volume as a trailing comment
    Annotate {
        /// Directory of example scripts
        input: Option<PathBuf>,

        /// Directory receiving annotated copies
        output: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,

        /// Write the annotation report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Append every file of a directory to a single file
    Concat {
        /// Input directory
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (appended to)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare annotated volumes with a reference table or directory
    Verify {
        /// Directory of annotated scripts
        measured: Option<PathBuf>,

        /// Reference TOML file ([volumes] table) or annotated directory
        #[arg(short, long)]
        reference: PathBuf,

        /// Relative tolerance
        #[arg(long)]
        rel_tol: Option<f64>,

        /// Absolute tolerance in mm^3
        #[arg(long)]
        abs_tol: Option<f64>,

        /// Directory for JSON and Markdown reports
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Split, annotate and concatenate using the configured paths
    Pipeline {
        /// Monolithic example file
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        split: SplitArgs,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Show the effective configuration or write it to a file
    Config {
        /// Write configuration to this file instead of printing it
        #[arg(long, value_name = "FILE")]
        write: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = execute(cli) {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<()> {
    let mut config = ToolConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    config.verbose |= cli.verbose;
    init_tracing(config.verbose);

    match cli.command {
        Commands::Split {
            input,
            output,
            split,
        } => {
            let input = input.unwrap_or_else(|| config.paths.source.clone());
            let output = output.unwrap_or_else(|| config.paths.examples_dir.clone());
            split_command(&config, &input, &output, &split)?;
        }
        Commands::Annotate {
            input,
            output,
            run,
            report,
        } => {
            apply_run_args(&mut config, &run);
            let input = input.unwrap_or_else(|| config.paths.examples_dir.clone());
            let output = output.unwrap_or_else(|| config.paths.executed_dir.clone());
            annotate_command(&config, &input, &output, report.as_deref())?;
        }
        Commands::Concat { input, output } => {
            let input = input.unwrap_or_else(|| config.paths.executed_dir.clone());
            let output = output.unwrap_or_else(|| config.paths.final_file.clone());
            let report = append_files(&input, &output)
                .with_context(|| format!("Failed to append files from {}", input.display()))?;
            Reporter::report_concat(&report);
        }
        Commands::Verify {
            measured,
            reference,
            rel_tol,
            abs_tol,
            out,
        } => {
            if let Some(rel) = rel_tol {
                config.rel_tolerance = rel;
            }
            if let Some(abs) = abs_tol {
                config.abs_tolerance = abs;
            }
            let measured = measured.unwrap_or_else(|| config.paths.executed_dir.clone());
            verify_command(&config, &measured, &reference, out.as_deref())?;
        }
        Commands::Pipeline { input, split, run } => {
            apply_run_args(&mut config, &run);
            if let Some(input) = input {
                config.paths.source = input;
            }
            pipeline_command(&config, &split)?;
        }
        Commands::Config { write } => match write {
            Some(path) => {
                config.save(&path)?;
                Reporter::success(&format!("Wrote configuration to {}", path.display()));
            }
            None => print!("{}", config.to_toml()?),
        },
        Commands::Version => {
            println!("cadex v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn build_split_options(config: &ToolConfig, args: &SplitArgs) -> Result<SplitOptions> {
    let mode = SplitMode::from_str(&args.mode).ok_or_else(|| {
        anyhow!("Unknown split mode: {}. Use trimmed or delimited", args.mode)
    })?;
    let naming = NamingScheme::from_str(&args.naming).ok_or_else(|| {
        anyhow!("Unknown naming scheme: {}. Use numbered or heading", args.naming)
    })?;

    let mut options = split_options(config);
    options.mode = mode;
    options.naming = naming;
    options.skip_preamble = args.skip_preamble;
    options.clean_output = !args.no_clean;
    if let Some(min) = args.min_hashes {
        options.min_hashes = min;
    }
    Ok(options)
}

fn apply_run_args(config: &mut ToolConfig, args: &RunArgs) {
    if let Some(ref interpreter) = args.interpreter {
        config.interpreter = interpreter.clone();
    }
    if let Some(ref probe) = args.probe {
        config.probe_line = probe.clone();
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if args.jobs.is_some() {
        config.jobs = args.jobs;
    }
}

fn split_command(config: &ToolConfig, input: &Path, output: &Path, args: &SplitArgs) -> Result<()> {
    let options = build_split_options(config, args)?;

    if config.verbose {
        println!(
            "{} {} ({} mode, {} naming)",
            "Splitting".bold(),
            input.display(),
            options.mode.as_str(),
            options.naming.as_str()
        );
    }

    let report = extract_examples(input, output, &options)
        .with_context(|| format!("Failed to split {}", input.display()))?;
    Reporter::report_split(&report);
    Ok(())
}

fn annotate_command(
    config: &ToolConfig,
    input: &Path,
    output: &Path,
    report_path: Option<&Path>,
) -> Result<()> {
    if config.verbose {
        Reporter::report_info(&format!(
            "Running scripts with '{}' (probe: {})",
            config.interpreter, config.probe_line
        ));
    }

    let annotator = VolumeAnnotator::from_config(config).show_progress(true);
    let report = annotator
        .annotate_dir(input, output)
        .with_context(|| format!("Failed to annotate {}", input.display()))?;

    Reporter::report_annotation(&report, config.verbose);

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Reporter::report_info(&format!("Report written to {}", path.display()));
    }

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

fn verify_command(
    config: &ToolConfig,
    measured_dir: &Path,
    reference_path: &Path,
    out: Option<&Path>,
) -> Result<()> {
    let measured = VolumeTable::from_annotated_dir(measured_dir, &config.extension)
        .with_context(|| format!("Failed to read volumes from {}", measured_dir.display()))?;
    let reference = load_reference(reference_path, &config.extension)
        .with_context(|| format!("Failed to load reference {}", reference_path.display()))?;

    if measured.is_empty() {
        Reporter::report_warning(&format!(
            "No volume comments found in {}",
            measured_dir.display()
        ));
    }

    let report = verify(&measured, &reference, config.tolerance());

    if let Some(dir) = out {
        std::fs::create_dir_all(dir)?;
        VerificationReporter::write_json(&report, dir.join("verify_report.json"))?;
        VerificationReporter::write_markdown(&report, dir.join("verify_report.md"))?;
    }

    VerificationReporter::print_summary(&report, config.verbose);

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

fn pipeline_command(config: &ToolConfig, args: &SplitArgs) -> Result<()> {
    let options = build_split_options(config, args)?;

    Reporter::progress(&format!(
        "Running pipeline {} → {} → {} → {}",
        config.paths.source.display(),
        config.paths.examples_dir.display(),
        config.paths.executed_dir.display(),
        config.paths.final_file.display()
    ));

    let report = run_pipeline(config, &options, true).context("Pipeline failed")?;

    Reporter::report_split(&report.split);
    Reporter::report_annotation(&report.annotation, config.verbose);
    Reporter::report_concat(&report.concat);

    if report.annotation.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}
