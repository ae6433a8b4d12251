// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod io;
mod update;

pub use config::ConfigError;
pub use execution::{StreamError, WorkerError};
pub use io::{SinkError, SourceError, TurtleParseError};
pub use update::{ScriptParseError, UpdateError};
