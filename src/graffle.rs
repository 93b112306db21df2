// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! AppleScript automation bridge to the OmniGraffle application
//!
//! Every operation is one blocking `osascript` invocation. The bridge only
//! knows how to do two things with an open document: list its canvas names
//! and ask the application to save one canvas to a file. Everything else
//! (change detection, checksum bookkeeping) lives in [`crate::exporter`].

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

use crate::types::ExportFormat;

/// Application automated when no override is configured
pub const DEFAULT_APP: &str = "OmniGraffle Professional 5";

/// Errors surfaced by the automation bridge
#[derive(Debug, Error)]
pub enum GraffleError {
    /// The source document does not exist on disk
    #[error("document {} does not exist", .0.display())]
    DocumentNotFound(PathBuf),
    /// Spawning `osascript` or touching the filesystem failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The script ran but the application reported an error
    #[error("AppleScript failed (exit {status}): {stderr}")]
    Script {
        /// Exit code reported by `osascript`
        status: i32,
        /// Stderr emitted by `osascript`
        stderr: String,
    },
}

/// Rendering operations the exporter needs from the external application.
///
/// The trait seam keeps the change detector testable without a GUI session.
pub trait CanvasRenderer {
    /// Names of all canvases in the open document, in document order
    fn canvas_names(&self) -> Result<Vec<String>, GraffleError>;

    /// Render the named canvas to `target` in `format`
    fn render(
        &self,
        canvas: &str,
        target: &Path,
        format: ExportFormat,
    ) -> Result<(), GraffleError>;
}

/// Handle to a document opened in a running OmniGraffle instance
#[derive(Debug)]
pub struct OmniGraffle {
    app: String,
    document: PathBuf,
}

impl OmniGraffle {
    /// Open `document` in the named application, activating it first.
    ///
    /// Fails immediately when the document does not exist. The export area
    /// is set to all graphics once here so that later saves render whole
    /// canvases rather than the current selection.
    pub fn open(document: &Path, app: &str) -> Result<Self, GraffleError> {
        if !document.is_file() {
            return Err(GraffleError::DocumentNotFound(document.to_path_buf()));
        }
        let document = document.canonicalize()?;

        let script = format!(
            r#"tell application "{app}"
    activate
    set area type of current export settings to all graphics
    open POSIX file "{doc}"
end tell"#,
            app = escape(app),
            doc = escape(&document.to_string_lossy()),
        );
        run_osascript(&script)?;
        debug!("Opened OmniGraffle file: {}", document.display());

        Ok(Self {
            app: app.to_string(),
            document,
        })
    }

    /// Absolute path of the opened document
    #[must_use]
    pub fn document(&self) -> &Path {
        &self.document
    }
}

impl CanvasRenderer for OmniGraffle {
    fn canvas_names(&self) -> Result<Vec<String>, GraffleError> {
        // Joined with linefeeds rather than osascript's default comma
        // separation, which canvas names may legally contain.
        let script = format!(
            r#"tell application "{app}"
    set _names to name of every canvas of document "{doc}"
end tell
set {{_tid, text item delimiters of AppleScript}} to {{text item delimiters of AppleScript, linefeed}}
set _out to _names as text
set text item delimiters of AppleScript to _tid
return _out"#,
            app = escape(&self.app),
            doc = escape(&document_name(&self.document)),
        );

        let out = run_osascript(&script)?;
        Ok(out
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }

    fn render(
        &self,
        canvas: &str,
        target: &Path,
        format: ExportFormat,
    ) -> Result<(), GraffleError> {
        let script = format!(
            r#"tell application "{app}"
    set _doc to document "{doc}"
    set canvas of front window to (first canvas of _doc whose name is "{canvas}")
    save _doc as "{kind}" in POSIX file "{target}"
end tell"#,
            app = escape(&self.app),
            doc = escape(&document_name(&self.document)),
            canvas = escape(canvas),
            kind = escape(format.save_as_type()),
            target = escape(&target.to_string_lossy()),
        );

        run_osascript(&script)?;
        debug!("Rendered {} into {} as {}", canvas, target.display(), format);
        Ok(())
    }
}

/// Run a script through `osascript`, returning its trimmed stdout
fn run_osascript(script: &str) -> Result<String, GraffleError> {
    let output = Command::new("osascript").arg("-e").arg(script).output()?;

    if !output.status.success() {
        return Err(GraffleError::Script {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .trim_end_matches(['\r', '\n'])
        .to_string())
}

/// Escape a string for inclusion in a double-quoted AppleScript literal
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// The name the application knows an open document by (its file name)
fn document_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy().into_owned(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_requires_existing_document() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.graffle");

        let err = OmniGraffle::open(&missing, DEFAULT_APP).unwrap_err();
        assert!(matches!(err, GraffleError::DocumentNotFound(path) if path == missing));
    }

    #[test]
    fn test_escape_quotes_and_backslashes() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape(r#"Canvas "A""#), r#"Canvas \"A\""#);
        assert_eq!(escape(r"back\slash"), r"back\\slash");
        assert_eq!(escape(r#"\""#), r#"\\\""#);
    }

    #[test]
    fn test_document_name_is_file_name() {
        assert_eq!(
            document_name(Path::new("/tmp/project/diagrams.graffle")),
            "diagrams.graffle"
        );
    }
}
