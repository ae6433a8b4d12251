// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for settings resolved at startup.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An update was added to the catalog.
///
/// # Log Level
/// `debug!` - Catalog detail
pub struct UpdateRegistered<'a> {
    pub index: usize,
    pub name: &'a str,
    pub limit: u32,
    pub operations: usize,
}

impl Display for UpdateRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered update #{} '{}': {} operations, up to {} iterations",
            self.index, self.name, self.operations, self.limit
        )
    }
}

impl StructuredLog for UpdateRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            index = self.index,
            name = self.name,
            limit = self.limit,
            operations = self.operations,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("update", span_name = name, update = self.name)
    }
}

/// A requested iteration limit was lowered to the hard cap.
///
/// # Log Level
/// `warn!` - Configuration was adjusted
pub struct IterationLimitCapped<'a> {
    pub name: &'a str,
    pub requested: &'a str,
    pub cap: u32,
}

impl Display for IterationLimitCapped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Update '{}' requested {} iterations; capping at {}",
            self.name, self.requested, self.cap
        )
    }
}

impl StructuredLog for IterationLimitCapped<'_> {
    fn log(&self) {
        tracing::warn!(
            name = self.name,
            requested = self.requested,
            cap = self.cap,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("iteration_limit", span_name = name, update = self.name)
    }
}

/// Debug output is enabled for one output kind.
///
/// # Log Level
/// `info!` - Startup event
pub struct DebugOutputEnabled<'a> {
    pub kind: &'a str,
    pub directory: &'a str,
    pub unit_ids: &'a [String],
}

impl Display for DebugOutputEnabled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.unit_ids.is_empty() {
            write!(
                f,
                "Writing {} snapshots to '{}' for the first unit",
                self.kind, self.directory
            )
        } else {
            write!(
                f,
                "Writing {} snapshots to '{}' for units [{}]",
                self.kind,
                self.directory,
                self.unit_ids.join(", ")
            )
        }
    }
}

impl StructuredLog for DebugOutputEnabled<'_> {
    fn log(&self) {
        tracing::info!(kind = self.kind, directory = self.directory, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("debug_output", span_name = name, kind = self.kind)
    }
}
