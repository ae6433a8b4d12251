// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::{SinkError, SourceError};
use crate::graph::Unit;

/// Producer of units.
///
/// End of stream is signalled by `can_read` returning `false`. A `read` that
/// yields `Ok(None)` is a transient empty read and the caller simply asks
/// again.
#[async_trait]
pub trait UnitSource: Send {
    /// Non-blocking readiness check.
    fn can_read(&self) -> bool;

    async fn read(&mut self) -> Result<Option<Unit>, SourceError>;
}

/// Consumer of transformed units, written strictly in input order.
#[async_trait]
pub trait UnitSink: Send {
    async fn write(&mut self, unit: Unit) -> Result<(), SinkError>;

    /// Called exactly once after the final write.
    async fn terminate(&mut self) -> Result<(), SinkError>;
}

#[async_trait]
impl<K> UnitSink for Box<K>
where
    K: UnitSink + ?Sized,
{
    async fn write(&mut self, unit: Unit) -> Result<(), SinkError> {
        (**self).write(unit).await
    }

    async fn terminate(&mut self) -> Result<(), SinkError> {
        (**self).terminate().await
    }
}
