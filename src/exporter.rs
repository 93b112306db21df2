// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Change detection and the export driver
//!
//! The exporter decides whether asking the application to render is worth it:
//! an existing artifact whose recorded checksum matches the canvas's current
//! content is left alone. The current content is observed by rendering the
//! canvas to a throwaway PNG file and hashing that, so the comparison tracks
//! what the application would draw, not the artifact's own bytes.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

use crate::checksum;
use crate::graffle::CanvasRenderer;
use crate::types::{ExportFormat, ExportOutcome};

/// Drives canvas exports over an open document, skipping unchanged canvases
pub struct Exporter<R> {
    renderer: R,
}

impl<R: CanvasRenderer> Exporter<R> {
    /// Create an exporter over an opened document
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    /// Export one named canvas to `target`.
    ///
    /// With `force` unset and an existing `target`, the canvas is only
    /// re-rendered when its content checksum differs from the one recorded in
    /// the artifact (PDF Subject metadata for pdf, full-file hash otherwise).
    /// A missing canvas is reported as [`ExportOutcome::NoSuchCanvas`] without
    /// touching the filesystem.
    pub fn export(
        &self,
        canvas: &str,
        target: &Path,
        format: ExportFormat,
        force: bool,
    ) -> Result<ExportOutcome> {
        let known = self.renderer.canvas_names()?;
        if !known.iter().any(|name| name == canvas) {
            warn!("Canvas {} does not exist in the document", canvas);
            return Ok(ExportOutcome::NoSuchCanvas);
        }

        // The fresh checksum is carried forward into the new artifact when
        // the format can store it.
        let mut fresh = None;
        if target.is_file() && !force {
            let existing = if format.carries_checksum() {
                checksum::pdf_checksum(target)?
            } else {
                Some(checksum::file_checksum(target)?)
            };
            let current = self.canvas_checksum(canvas)?;

            if existing.as_deref() == Some(current.as_str()) {
                debug!(
                    "Not exporting {}: {} exists and has the same checksum",
                    canvas,
                    target.display()
                );
                return Ok(ExportOutcome::SkippedUnchanged);
            }
            fresh = Some(current);
        } else if format.carries_checksum() {
            fresh = Some(self.canvas_checksum(canvas)?);
        }

        self.renderer.render(canvas, target, format)?;
        debug!("Exported {} into {} as {}", canvas, target.display(), format);

        if format.carries_checksum() {
            if let Some(value) = fresh {
                checksum::embed_pdf_checksum(target, &value)?;
            }
        }

        Ok(ExportOutcome::Exported)
    }

    /// Export every canvas in the document into `target_dir`.
    ///
    /// Filenames are derived as `<canvas>.<extension>`. Returns the outcome
    /// for each canvas in document order.
    pub fn export_all(
        &self,
        target_dir: &Path,
        format: ExportFormat,
        force: bool,
    ) -> Result<Vec<(String, ExportOutcome)>> {
        let mut outcomes = Vec::new();

        for canvas in self.renderer.canvas_names()? {
            let target = target_dir.join(format!("{}.{}", canvas, format.extension()));
            debug!("Exporting {} into {} as {}", canvas, target.display(), format);
            let outcome = self.export(&canvas, &target, format, force)?;
            outcomes.push((canvas, outcome));
        }

        Ok(outcomes)
    }

    /// Checksum of the canvas's current content, observed through a
    /// throwaway PNG render that is deleted before returning
    fn canvas_checksum(&self, canvas: &str) -> Result<String> {
        let tmp = tempfile::Builder::new()
            .prefix("ogexport-")
            .suffix(".png")
            .tempfile()
            .context("Failed to create temporary render file")?;

        self.renderer.render(canvas, tmp.path(), ExportFormat::Png)?;
        checksum::file_checksum(tmp.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graffle::GraffleError;
    use lopdf::{dictionary, Document, Object};
    use std::cell::{Cell, RefCell};
    use std::fs;
    use tempfile::TempDir;

    /// Scripted stand-in for the application bridge. Canvas content is a
    /// revision counter; renders write deterministic bytes derived from it.
    struct FakeRenderer {
        canvases: RefCell<Vec<(String, u32)>>,
        renders: Cell<usize>,
    }

    impl FakeRenderer {
        fn new(names: &[&str]) -> Self {
            Self {
                canvases: RefCell::new(names.iter().map(|n| ((*n).to_string(), 0)).collect()),
                renders: Cell::new(0),
            }
        }

        /// Simulate an edit to a canvas
        fn touch(&self, canvas: &str) {
            let mut canvases = self.canvases.borrow_mut();
            let entry = canvases
                .iter_mut()
                .find(|(name, _)| name == canvas)
                .expect("unknown canvas");
            entry.1 += 1;
        }

        fn revision(&self, canvas: &str) -> u32 {
            self.canvases
                .borrow()
                .iter()
                .find(|(name, _)| name == canvas)
                .map(|(_, rev)| *rev)
                .expect("unknown canvas")
        }

        fn render_count(&self) -> usize {
            self.renders.get()
        }
    }

    impl CanvasRenderer for FakeRenderer {
        fn canvas_names(&self) -> Result<Vec<String>, GraffleError> {
            Ok(self
                .canvases
                .borrow()
                .iter()
                .map(|(name, _)| name.clone())
                .collect())
        }

        fn render(
            &self,
            canvas: &str,
            target: &Path,
            format: ExportFormat,
        ) -> Result<(), GraffleError> {
            self.renders.set(self.renders.get() + 1);
            let rev = self.revision(canvas);

            if format == ExportFormat::Pdf {
                write_fake_pdf(target);
            } else {
                fs::write(target, format!("{canvas}:{rev}:{}", format.extension()))?;
            }
            Ok(())
        }
    }

    /// Minimal one-page PDF standing in for an application render
    fn write_fake_pdf(path: &Path) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_pdf_export_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("alpha.pdf");
        let renderer = FakeRenderer::new(&["alpha"]);
        let exporter = Exporter::new(renderer);

        let first = exporter
            .export("alpha", &target, ExportFormat::Pdf, false)
            .unwrap();
        assert_eq!(first, ExportOutcome::Exported);
        assert!(target.is_file());
        // One throwaway PNG render for the checksum, one render of the target
        assert_eq!(exporter.renderer.render_count(), 2);

        let second = exporter
            .export("alpha", &target, ExportFormat::Pdf, false)
            .unwrap();
        assert_eq!(second, ExportOutcome::SkippedUnchanged);
        // Only the throwaway render happened; the target was left alone
        assert_eq!(exporter.renderer.render_count(), 3);
    }

    #[test]
    fn test_changed_canvas_is_reexported() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("alpha.pdf");
        let renderer = FakeRenderer::new(&["alpha"]);
        let exporter = Exporter::new(renderer);

        exporter
            .export("alpha", &target, ExportFormat::Pdf, false)
            .unwrap();

        exporter.renderer.touch("alpha");
        let outcome = exporter
            .export("alpha", &target, ExportFormat::Pdf, false)
            .unwrap();
        assert_eq!(outcome, ExportOutcome::Exported);

        // The new artifact records the new content checksum
        let outcome = exporter
            .export("alpha", &target, ExportFormat::Pdf, false)
            .unwrap();
        assert_eq!(outcome, ExportOutcome::SkippedUnchanged);
    }

    #[test]
    fn test_force_always_renders() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("alpha.pdf");
        let renderer = FakeRenderer::new(&["alpha"]);
        let exporter = Exporter::new(renderer);

        exporter
            .export("alpha", &target, ExportFormat::Pdf, false)
            .unwrap();
        let forced = exporter
            .export("alpha", &target, ExportFormat::Pdf, true)
            .unwrap();

        assert_eq!(forced, ExportOutcome::Exported);
    }

    #[test]
    fn test_missing_canvas_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("ghost.pdf");
        let renderer = FakeRenderer::new(&["alpha"]);
        let exporter = Exporter::new(renderer);

        let outcome = exporter
            .export("ghost", &target, ExportFormat::Pdf, false)
            .unwrap();

        assert_eq!(outcome, ExportOutcome::NoSuchCanvas);
        assert!(!target.exists());
        assert_eq!(exporter.renderer.render_count(), 0);
    }

    #[test]
    fn test_export_all_writes_one_file_per_canvas() {
        let dir = TempDir::new().unwrap();
        let renderer = FakeRenderer::new(&["alpha", "beta", "gamma"]);
        let exporter = Exporter::new(renderer);

        let outcomes = exporter
            .export_all(dir.path(), ExportFormat::Png, false)
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        for (canvas, outcome) in &outcomes {
            assert_eq!(*outcome, ExportOutcome::Exported);
            assert!(dir.path().join(format!("{canvas}.png")).is_file());
        }
    }

    #[test]
    fn test_eps_export_has_no_stored_record() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("alpha.eps");
        let renderer = FakeRenderer::new(&["alpha"]);
        let exporter = Exporter::new(renderer);

        // Without embedded metadata the existing-file hash never matches a
        // PNG rendering, so every run re-exports.
        for _ in 0..2 {
            let outcome = exporter
                .export("alpha", &target, ExportFormat::Eps, false)
                .unwrap();
            assert_eq!(outcome, ExportOutcome::Exported);
        }
    }

    #[test]
    fn test_unchanged_png_export_is_skipped() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("alpha.png");
        let renderer = FakeRenderer::new(&["alpha"]);
        let exporter = Exporter::new(renderer);

        // PNG renders are byte-stable here, so the full-file hash of the
        // existing artifact matches the throwaway render.
        let first = exporter
            .export("alpha", &target, ExportFormat::Png, false)
            .unwrap();
        let second = exporter
            .export("alpha", &target, ExportFormat::Png, false)
            .unwrap();

        assert_eq!(first, ExportOutcome::Exported);
        assert_eq!(second, ExportOutcome::SkippedUnchanged);
    }

    #[test]
    fn test_exported_pdf_is_tagged() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("alpha.pdf");
        let renderer = FakeRenderer::new(&["alpha"]);
        let exporter = Exporter::new(renderer);

        exporter
            .export("alpha", &target, ExportFormat::Pdf, false)
            .unwrap();

        let recorded = checksum::pdf_checksum(&target).unwrap();
        assert!(recorded.is_some());
        assert_eq!(recorded.unwrap().len(), 64);
    }
}
