//! # ARPG Development Tools
//!
//! Command-line tools for development:
//! - Content and config validation
//! - Headless encounter runs for balance checks

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod simulate;
pub mod validate;

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The engine rejected a file or an action.
    #[error(transparent)]
    Combat(#[from] arpg_core::error::CombatError),

    /// A required data file is absent.
    #[error("Missing data file: {}", .0.display())]
    MissingFile(PathBuf),

    /// A report could not be rendered.
    #[error("Failed to render report: {0}")]
    Render(#[from] ron::Error),
}

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;
