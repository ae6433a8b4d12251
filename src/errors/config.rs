// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while loading configuration, before any unit is streamed.

use thiserror::Error;

use crate::errors::{ScriptParseError, TurtleParseError};

/// Configuration errors are fatal: they are reported before streaming starts
/// and identify the offending update by its position (1-based) and name.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Invalid iteration limit '{value}' for update No. {index} ({name}): expected an integer or \"*\"")]
    InvalidIterationLimit {
        index: usize,
        name: String,
        value: String,
    },

    #[error("The passed update No. {index} looks like a file path, however the file '{locator}' could not be found")]
    ScriptNotFound { index: usize, locator: String },

    #[error("Update parse error for update No. {index} ({name}): {source}")]
    ScriptSyntax {
        index: usize,
        name: String,
        #[source]
        source: ScriptParseError,
    },

    #[error("Failed to parse base graph '{locator}': {source}")]
    BaseGraph {
        locator: String,
        #[source]
        source: TurtleParseError,
    },

    #[error("Graph name '{name}' is reserved for unit context")]
    ReservedGraphName { name: String },

    #[error("Debug output path '{path}' is not a usable directory: {reason}")]
    DebugDirectory { path: String, reason: String },
}
