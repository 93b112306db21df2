// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! ogexport library - OmniGraffle canvas export with change detection
//!
//! This crate provides the core functionality for exporting canvases from
//! OmniGraffle documents into image formats, re-exporting only the canvases
//! whose rendered content changed since the previous run. Rendering itself is
//! delegated to the OmniGraffle application over AppleScript; this crate
//! decides when a render is worth asking for.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod checksum;
pub mod commands;
pub mod config;
pub mod exporter;
pub mod graffle;

/// Core data types
pub mod types {
    use std::fmt;

    /// Export formats understood by the application's save operation
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ExportFormat {
        /// Apple PDF; the only format that carries the embedded export checksum
        Pdf,
        /// Portable Network Graphics
        Png,
        /// Scalable Vector Graphics
        Svg,
        /// Encapsulated PostScript
        Eps,
    }

    impl ExportFormat {
        /// Parse a format from a user-supplied string
        #[must_use]
        pub fn from_str(s: &str) -> Option<Self> {
            match s.to_lowercase().as_str() {
                "pdf" => Some(Self::Pdf),
                "png" => Some(Self::Png),
                "svg" => Some(Self::Svg),
                "eps" => Some(Self::Eps),
                _ => None,
            }
        }

        /// Get the file extension for this format
        #[must_use]
        pub fn extension(&self) -> &'static str {
            match self {
                Self::Pdf => "pdf",
                Self::Png => "png",
                Self::Svg => "svg",
                Self::Eps => "eps",
            }
        }

        /// The save-as type name the application's scripting interface expects
        #[must_use]
        pub fn save_as_type(&self) -> &'static str {
            match self {
                Self::Pdf => "Apple PDF pasteboard type",
                Self::Png => "PNG",
                Self::Svg => "SVG",
                Self::Eps => "EPS Format",
            }
        }

        /// Whether artifacts in this format store the export checksum in
        /// their metadata
        #[must_use]
        pub fn carries_checksum(&self) -> bool {
            matches!(self, Self::Pdf)
        }
    }

    impl fmt::Display for ExportFormat {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.extension())
        }
    }

    /// Result of exporting a single canvas
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ExportOutcome {
        /// The canvas was rendered and written to the target path
        Exported,
        /// The existing target already matches the canvas content
        SkippedUnchanged,
        /// No canvas with the requested name exists in the document
        NoSuchCanvas,
    }

    impl ExportOutcome {
        /// Whether the operation produced or confirmed an up-to-date artifact
        #[must_use]
        pub fn is_success(&self) -> bool {
            !matches!(self, Self::NoSuchCanvas)
        }
    }

}

/// Prelude for common imports
pub mod prelude {
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
