// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors at the source and sink boundary.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {message}")]
pub struct TurtleParseError {
    pub line: usize,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read from source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse segment {segment}: {source}")]
    Parse {
        segment: usize,
        #[source]
        source: TurtleParseError,
    },
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to write to sink: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink already terminated")]
    Terminated,
}
