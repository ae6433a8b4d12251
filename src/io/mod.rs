// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Concrete stream collaborators.

pub mod fanout;
pub mod memory;
pub mod segmented;
pub mod sink;
pub mod turtle;

pub use fanout::FanOutSink;
pub use memory::{CollectingSink, VecSource};
pub use segmented::{SegmentedSource, DEFAULT_SEGMENT_DELIMITER};
pub use sink::TurtleSink;
