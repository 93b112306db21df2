// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! ogexport CLI - OmniGraffle canvas exporter

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use ogexport::commands;
use ogexport::config;
use ogexport::types::ExportFormat;

#[derive(Parser)]
#[command(name = "ogexport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Export format (one of: pdf, png, svg, eps)
    #[arg(short, long, value_name = "FMT", default_value = "pdf")]
    format: String,

    /// Canvas name (without it, TARGET must be a directory)
    #[arg(short, long, value_name = "NAME")]
    canvas: Option<String>,

    /// OmniGraffle application to automate
    #[arg(long, value_name = "NAME", env = "OGEXPORT_APP")]
    app: Option<String>,

    /// Export even when the existing target matches
    #[arg(long)]
    force: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Debug output (implies --verbose)
    #[arg(short, long)]
    debug: bool,

    /// Source OmniGraffle document
    source: PathBuf,

    /// Target file (with --canvas) or directory
    target: PathBuf,
}

fn main() -> Result<()> {
    // Argument errors exit with code 1 rather than clap's default 2
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if err.use_stderr() {
                let _ = err.print();
                std::process::exit(1);
            }
            err.exit();
        }
    };

    // Initialize logging
    let log_level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let Some(format) = ExportFormat::from_str(&cli.format) else {
        eprintln!(
            "Unknown format: {}. Supported: pdf, png, svg, eps",
            cli.format
        );
        std::process::exit(1);
    };

    if cli.canvas.is_none() && !cli.target.is_dir() {
        eprintln!("Without a canvas name, the target must be a directory");
        std::process::exit(1);
    }

    let config = config::load()?;
    let app = cli.app.unwrap_or(config.app);

    commands::export::run(
        &cli.source,
        &cli.target,
        format,
        cli.canvas.as_deref(),
        &app,
        cli.force,
    )
}
