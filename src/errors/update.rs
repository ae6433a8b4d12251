// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Syntax error in an update script.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}, column {column}: {message}")]
pub struct ScriptParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Failure while executing one update operation against a dataset.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpdateError {
    #[error("Graph '{graph}' is read-only")]
    ReadOnlyGraph { graph: String },

    #[error("Update operation failed: {0}")]
    Failed(String),
}
