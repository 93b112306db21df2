// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - exports one canvas or every canvas of a document

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::exporter::Exporter;
use crate::graffle::OmniGraffle;
use crate::types::{ExportFormat, ExportOutcome};

/// Run the export command
pub fn run(
    source: &Path,
    target: &Path,
    format: ExportFormat,
    canvas: Option<&str>,
    app: &str,
    force: bool,
) -> Result<()> {
    info!("Exporting {} as {}", source.display(), format);

    let graffle = OmniGraffle::open(source, app)
        .with_context(|| format!("Failed to open {}", source.display()))?;
    let exporter = Exporter::new(graffle);

    match canvas {
        Some(name) => {
            let outcome = exporter
                .export(name, target, format, force)
                .with_context(|| format!("Failed to export canvas {name}"))?;

            match outcome {
                ExportOutcome::Exported => {
                    println!("Exported {} to {}", name, target.display());
                }
                ExportOutcome::SkippedUnchanged => {
                    println!("Skipped {}: {} is up to date", name, target.display());
                }
                ExportOutcome::NoSuchCanvas => {
                    anyhow::bail!("No canvas named {} in {}", name, source.display());
                }
            }
        }
        None => {
            let outcomes = exporter
                .export_all(target, format, force)
                .with_context(|| format!("Failed to export {}", source.display()))?;

            let exported = outcomes
                .iter()
                .filter(|(_, o)| *o == ExportOutcome::Exported)
                .count();
            let skipped = outcomes.len() - exported;

            println!(
                "Exported {} canvas(es) to {}, {} up to date",
                exported,
                target.display(),
                skipped
            );
        }
    }

    Ok(())
}
