// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Update scripts.
//!
//! The engine only depends on [`GraphUpdate`]: something that can be run
//! against a [`Dataset`] either as a whole or one elementary operation at a
//! time. [`UpdateRequest`] is the built-in implementation, a subset of
//! SPARQL 1.1 Update covering data operations, pattern-driven
//! `DELETE`/`INSERT ... WHERE` and `CLEAR`. Patterns support `GRAPH`,
//! `OPTIONAL`, `UNION`, `MINUS`, `BIND`, `FILTER` expressions (including
//! `[NOT] EXISTS`) and property paths.

mod ast;
mod eval;
mod expression;
mod parser;

pub use ast::{
    Arithmetic, ClearTarget, Comparison, Expression, Function, Group, GroupElement, PathPattern,
    PatternTerm, PropertyPath, QuadPattern, TriplePattern, UpdateOperation, UpdateRequest,
    VarOrGraph,
};
pub use parser::parse_update;

use crate::errors::UpdateError;
use crate::graph::Dataset;

/// An executable transformation over a dataset.
pub trait GraphUpdate: Send + Sync {
    /// Number of elementary operations.
    fn step_count(&self) -> usize;

    fn execute_step(&self, step: usize, dataset: &mut Dataset) -> Result<(), UpdateError>;

    /// Human readable form of one operation, used in debug output and logs.
    fn describe_step(&self, step: usize) -> String;

    /// Run every operation in order, stopping at the first failure.
    fn execute(&self, dataset: &mut Dataset) -> Result<(), UpdateError> {
        for step in 0..self.step_count() {
            self.execute_step(step, dataset)?;
        }
        Ok(())
    }
}

impl GraphUpdate for UpdateRequest {
    fn step_count(&self) -> usize {
        self.operations().len()
    }

    fn execute_step(&self, step: usize, dataset: &mut Dataset) -> Result<(), UpdateError> {
        let operation = self
            .operations()
            .get(step)
            .ok_or_else(|| UpdateError::Failed(format!("no operation at step {}", step)))?;
        eval::apply(operation, dataset)
    }

    fn describe_step(&self, step: usize) -> String {
        self.operation_text(step).unwrap_or_default().to_string()
    }
}
