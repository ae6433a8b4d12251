// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod catalog;
mod loader;
mod runtime;

pub mod consts;

pub use catalog::{IterationLimit, UpdateCatalog, UpdateSpec};
pub use loader::{
    load_config, BaseGraphConfig, Config, ConfigFormat, DebugOutputConfig, IterationSetting,
    UpdateConfig,
};
pub use runtime::RuntimeBuilder;
