// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Content checksums for exported artifacts
//!
//! A checksum written into a PDF reflects the rendered content of the canvas
//! at export time, not the artifact's own bytes. It lives in the Subject
//! entry of the document information dictionary, behind a fixed marker so an
//! artifact produced by anything else reads as untagged.

use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Marker prefixing the checksum stored in a PDF's Subject attribute
pub const PDF_CHECKSUM_MARKER: &str = "OmnigraffleExportChecksum: ";

/// Compute the hex-encoded SHA-256 checksum of a file's contents
pub fn file_checksum(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Extract the export checksum recorded in a PDF's Subject attribute.
///
/// Returns `None` when the artifact carries no marker, i.e. it was never
/// written by this tool.
pub fn pdf_checksum(path: &Path) -> Result<Option<String>> {
    let doc =
        Document::load(path).with_context(|| format!("Failed to read PDF {}", path.display()))?;

    let Some(subject) = read_subject(&doc) else {
        return Ok(None);
    };

    Ok(subject
        .strip_prefix(PDF_CHECKSUM_MARKER)
        .map(str::to_owned))
}

/// Write the export checksum into a PDF's Subject attribute, rewriting the
/// artifact in place
pub fn embed_pdf_checksum(path: &Path, checksum: &str) -> Result<()> {
    let mut doc =
        Document::load(path).with_context(|| format!("Failed to read PDF {}", path.display()))?;

    set_subject(&mut doc, &format!("{PDF_CHECKSUM_MARKER}{checksum}"))?;

    doc.save(path)
        .with_context(|| format!("Failed to rewrite PDF {}", path.display()))?;
    debug!("Stored checksum {} in {}", checksum, path.display());

    Ok(())
}

/// Read the Subject string out of the document information dictionary
fn read_subject(doc: &Document) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };

    match info.get(b"Subject").ok()? {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// Set the Subject string, creating the information dictionary if the
/// document has none
fn set_subject(doc: &mut Document, value: &str) -> Result<()> {
    let existing = doc.trailer.get(b"Info").ok().cloned();

    match existing {
        Some(Object::Reference(id)) => {
            let info = doc
                .get_object_mut(id)
                .and_then(Object::as_dict_mut)
                .context("Malformed document information dictionary")?;
            info.set("Subject", Object::string_literal(value));
        }
        Some(Object::Dictionary(mut dict)) => {
            dict.set("Subject", Object::string_literal(value));
            let id = doc.add_object(Object::Dictionary(dict));
            doc.trailer.set("Info", Object::Reference(id));
        }
        _ => {
            let mut dict = Dictionary::new();
            dict.set("Subject", Object::string_literal(value));
            let id = doc.add_object(Object::Dictionary(dict));
            doc.trailer.set("Info", Object::Reference(id));
        }
    }

    Ok(())
}
