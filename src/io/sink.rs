// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::errors::SinkError;
use crate::graph::Unit;
use crate::io::segmented::DEFAULT_SEGMENT_DELIMITER;
use crate::io::turtle::{self, PrefixMap};
use crate::traits::UnitSink;

/// Writes each unit as sorted statements followed by the segment delimiter.
///
/// IRIs under a configured namespace are written in prefixed form. With
/// prefix deduplication on, each `@prefix` line appears only the first time
/// the prefix is used in the stream; otherwise every unit repeats the
/// declarations it needs.
pub struct TurtleSink<W> {
    writer: W,
    prefixes: PrefixMap,
    deduplicate_prefixes: bool,
    declared: BTreeSet<String>,
    delimiter: String,
    terminated: bool,
}

impl<W> TurtleSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            prefixes: PrefixMap::new(),
            deduplicate_prefixes: false,
            declared: BTreeSet::new(),
            delimiter: DEFAULT_SEGMENT_DELIMITER.to_string(),
            terminated: false,
        }
    }

    pub fn with_prefixes(mut self, prefixes: PrefixMap, deduplicate: bool) -> Self {
        self.prefixes = prefixes;
        self.deduplicate_prefixes = deduplicate;
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn render(&mut self, unit: &Unit) -> String {
        let mut body = String::new();
        let used = turtle::write_graph(unit.graph(), &self.prefixes, &mut body);

        let mut text = String::new();
        for prefix in used {
            if self.deduplicate_prefixes && !self.declared.insert(prefix.clone()) {
                continue;
            }
            if let Some(namespace) = self.prefixes.get(&prefix) {
                text.push_str(&turtle::prefix_line(&prefix, namespace));
            }
        }
        text.push_str(&body);
        text.push_str(&self.delimiter);
        text.push('\n');
        text
    }
}

#[async_trait]
impl<W> UnitSink for TurtleSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, unit: Unit) -> Result<(), SinkError> {
        if self.terminated {
            return Err(SinkError::Terminated);
        }
        let text = self.render(&unit);
        self.writer.write_all(text.as_bytes()).await?;
        Ok(())
    }

    async fn terminate(&mut self) -> Result<(), SinkError> {
        self.terminated = true;
        self.writer.flush().await?;
        Ok(())
    }
}
