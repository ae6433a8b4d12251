// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::SinkError;
use crate::graph::Unit;
use crate::traits::UnitSink;

/// Sink that hands every unit to each of several downstream sinks.
///
/// Units share their graph, so a copy per sink costs one reference count.
/// A failing sink does not stop delivery to the others; the first error is
/// returned once every sink has been tried. `terminate` reaches each sink
/// exactly once.
pub struct FanOutSink<K> {
    sinks: Vec<K>,
}

impl<K> FanOutSink<K>
where
    K: UnitSink,
{
    pub fn new(sinks: impl IntoIterator<Item = K>) -> Self {
        Self {
            sinks: sinks.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sinks(&self) -> &[K] {
        &self.sinks
    }

    pub fn into_sinks(self) -> Vec<K> {
        self.sinks
    }
}

#[async_trait]
impl<K> UnitSink for FanOutSink<K>
where
    K: UnitSink,
{
    async fn write(&mut self, unit: Unit) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(error) = sink.write(unit.clone()).await {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn terminate(&mut self) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(error) = sink.terminate().await {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::turtle::parse_document;
    use crate::io::{CollectingSink, TurtleSink};

    fn unit(text: &str) -> Unit {
        Unit::new(parse_document(text).unwrap())
    }

    #[tokio::test]
    async fn test_every_sink_receives_every_unit() {
        let mut fan = FanOutSink::new([CollectingSink::new(), CollectingSink::new()]);
        fan.write(unit("<http://ex.org/a> <http://ex.org/p> \"1\" .")).await.unwrap();
        fan.write(unit("<http://ex.org/b> <http://ex.org/p> \"2\" .")).await.unwrap();
        fan.terminate().await.unwrap();

        for sink in fan.sinks() {
            assert_eq!(sink.units().len(), 2);
            assert_eq!(sink.terminate_calls(), 1);
        }
        let sinks = fan.into_sinks();
        assert_eq!(sinks[0].units(), sinks[1].units());
    }

    #[tokio::test]
    async fn test_mixed_sinks_behind_boxes() {
        let sinks: Vec<Box<dyn UnitSink>> = vec![
            Box::new(TurtleSink::new(Vec::new())),
            Box::new(CollectingSink::new()),
        ];
        let mut fan = FanOutSink::new(sinks);
        assert_eq!(fan.len(), 2);
        fan.write(unit("<http://ex.org/a> <http://ex.org/p> <http://ex.org/b> ."))
            .await
            .unwrap();
        fan.terminate().await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_starve_the_others() {
        let mut closed = CollectingSink::new();
        closed.terminate().await.unwrap();
        let mut fan = FanOutSink::new([closed, CollectingSink::new()]);

        let err = fan.write(unit("<a:x> <a:p> <a:y> .")).await.unwrap_err();
        assert!(matches!(err, SinkError::Terminated));
        assert_eq!(fan.sinks()[1].units().len(), 1);

        fan.terminate().await.unwrap();
        assert_eq!(fan.sinks()[0].terminate_calls(), 2);
        assert_eq!(fan.sinks()[1].terminate_calls(), 1);
    }
}
