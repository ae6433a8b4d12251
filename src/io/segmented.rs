// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::errors::SourceError;
use crate::graph::Unit;
use crate::io::turtle::TurtleReader;
use crate::traits::UnitSource;

pub const DEFAULT_SEGMENT_DELIMITER: &str = "###";

/// Splits a line stream into units at every line equal to the delimiter.
///
/// The last segment does not need a trailing delimiter. Segments without any
/// statement come back as transient empty reads.
pub struct SegmentedSource<R> {
    reader: R,
    delimiter: String,
    turtle: TurtleReader,
    exhausted: bool,
    line_no: usize,
    segment: usize,
}

impl<R> SegmentedSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self::with_delimiter(reader, DEFAULT_SEGMENT_DELIMITER)
    }

    pub fn with_delimiter(reader: R, delimiter: impl Into<String>) -> Self {
        Self {
            reader,
            delimiter: delimiter.into(),
            turtle: TurtleReader::new(),
            exhausted: false,
            line_no: 0,
            segment: 0,
        }
    }
}

#[async_trait]
impl<R> UnitSource for SegmentedSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    fn can_read(&self) -> bool {
        !self.exhausted
    }

    async fn read(&mut self) -> Result<Option<Unit>, SourceError> {
        let first_line = self.line_no + 1;
        let mut text = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            let bytes = match self.reader.read_line(&mut line).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.exhausted = true;
                    return Err(SourceError::Io(e));
                }
            };
            if bytes == 0 {
                self.exhausted = true;
                break;
            }
            self.line_no += 1;
            let content = line.trim_end_matches(['\n', '\r']);
            if content == self.delimiter {
                break;
            }
            text.push_str(content);
            text.push('\n');
        }

        self.segment += 1;
        let graph = self
            .turtle
            .parse(&text, first_line)
            .map_err(|source| SourceError::Parse {
                segment: self.segment,
                source,
            })?;
        if graph.is_empty() {
            return Ok(None);
        }
        Ok(Some(Unit::new(graph)))
    }
}
