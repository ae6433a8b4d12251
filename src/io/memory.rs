// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::errors::{SinkError, SourceError};
use crate::graph::Unit;
use crate::traits::{UnitSink, UnitSource};

/// Source backed by a queue of ready units.
#[derive(Debug, Default)]
pub struct VecSource {
    units: VecDeque<Unit>,
}

impl VecSource {
    pub fn new(units: impl IntoIterator<Item = Unit>) -> Self {
        Self {
            units: units.into_iter().collect(),
        }
    }
}

#[async_trait]
impl UnitSource for VecSource {
    fn can_read(&self) -> bool {
        !self.units.is_empty()
    }

    async fn read(&mut self) -> Result<Option<Unit>, SourceError> {
        Ok(self.units.pop_front())
    }
}

/// Sink that keeps every written unit.
#[derive(Debug, Default)]
pub struct CollectingSink {
    units: Vec<Unit>,
    terminate_calls: usize,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn into_units(self) -> Vec<Unit> {
        self.units
    }

    pub fn terminate_calls(&self) -> usize {
        self.terminate_calls
    }
}

#[async_trait]
impl UnitSink for CollectingSink {
    async fn write(&mut self, unit: Unit) -> Result<(), SinkError> {
        if self.terminate_calls > 0 {
            return Err(SinkError::Terminated);
        }
        self.units.push(unit);
        Ok(())
    }

    async fn terminate(&mut self) -> Result<(), SinkError> {
        self.terminate_calls += 1;
        Ok(())
    }
}
