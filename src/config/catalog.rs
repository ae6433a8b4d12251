// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::consts::{DEFAULT_UPDATE_NAME, HARD_ITERATION_CAP};
use crate::config::{IterationSetting, UpdateConfig};
use crate::errors::ConfigError;
use crate::observability::messages::config::{IterationLimitCapped, UpdateRegistered};
use crate::observability::messages::StructuredLog;
use crate::update::{parse_update, GraphUpdate};

/// How many times an update may run on one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationLimit {
    /// At most this many iterations.
    Count(u32),
    /// Until nothing changes, bounded by [`HARD_ITERATION_CAP`].
    Unbounded,
}

impl IterationLimit {
    /// The effective bound, never above the hard cap.
    pub fn resolve(&self) -> u32 {
        match self {
            IterationLimit::Count(n) => (*n).min(HARD_ITERATION_CAP),
            IterationLimit::Unbounded => HARD_ITERATION_CAP,
        }
    }
}

impl fmt::Display for IterationLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IterationLimit::Count(n) => write!(f, "{}", n),
            IterationLimit::Unbounded => write!(f, "*"),
        }
    }
}

/// One entry of the update catalog.
#[derive(Clone)]
pub struct UpdateSpec {
    name: String,
    script: String,
    update: Arc<dyn GraphUpdate>,
    limit: IterationLimit,
}

impl UpdateSpec {
    pub fn new(
        name: impl Into<String>,
        script: impl Into<String>,
        update: Arc<dyn GraphUpdate>,
        limit: IterationLimit,
    ) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
            update,
            limit,
        }
    }

    /// Parse `script` as an update script.
    pub fn parse(
        name: impl Into<String>,
        script: impl Into<String>,
        limit: IterationLimit,
    ) -> Result<Self, crate::errors::ScriptParseError> {
        let script = script.into();
        let request = parse_update(&script)?;
        Ok(Self::new(name, script, Arc::new(request), limit))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn update(&self) -> &dyn GraphUpdate {
        self.update.as_ref()
    }

    pub fn limit(&self) -> IterationLimit {
        self.limit
    }
}

impl fmt::Debug for UpdateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateSpec")
            .field("name", &self.name)
            .field("limit", &self.limit)
            .field("steps", &self.update.step_count())
            .finish()
    }
}

/// The validated, ordered list of updates applied to every unit.
#[derive(Debug, Clone, Default)]
pub struct UpdateCatalog {
    specs: Vec<UpdateSpec>,
}

impl UpdateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, spec: UpdateSpec) {
        self.specs.push(spec);
    }

    /// Resolve and parse every configured update.
    ///
    /// Each entry's `script` is read as a file when such a file exists and
    /// taken as inline script text otherwise. Errors name the entry by its
    /// 1-based position.
    pub fn from_config(entries: &[UpdateConfig]) -> Result<Self, ConfigError> {
        let mut catalog = Self::new();
        for (offset, entry) in entries.iter().enumerate() {
            catalog.push(resolve_entry(offset + 1, entry)?);
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&UpdateSpec> {
        self.specs.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UpdateSpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(UpdateSpec::name).collect()
    }

    pub fn scripts(&self) -> Vec<&str> {
        self.specs.iter().map(UpdateSpec::script).collect()
    }

    pub fn iteration_limits(&self) -> Vec<IterationLimit> {
        self.specs.iter().map(UpdateSpec::limit).collect()
    }
}

fn resolve_limit(index: usize, name: &str, setting: &IterationSetting) -> Result<IterationLimit, ConfigError> {
    let invalid = |value: String| ConfigError::InvalidIterationLimit {
        index,
        name: name.to_string(),
        value,
    };
    let requested = match setting {
        IterationSetting::Count(n) => *n,
        IterationSetting::Text(text) if text.trim() == "*" => return Ok(IterationLimit::Unbounded),
        IterationSetting::Text(text) => text.trim().parse::<u64>().map_err(|_| invalid(text.clone()))?,
    };
    if requested > u64::from(HARD_ITERATION_CAP) {
        IterationLimitCapped {
            name,
            requested: &requested.to_string(),
            cap: HARD_ITERATION_CAP,
        }
        .log();
        return Ok(IterationLimit::Count(HARD_ITERATION_CAP));
    }
    // Bounded by the cap checked above.
    Ok(IterationLimit::Count(requested as u32))
}

fn resolve_entry(index: usize, entry: &UpdateConfig) -> Result<UpdateSpec, ConfigError> {
    let locator = entry.script.trim();
    let from_file = fs::read_to_string(Path::new(locator)).ok();
    let read_from_file = from_file.is_some();
    let script = from_file.unwrap_or_else(|| entry.script.clone());

    let name = match (&entry.name, read_from_file) {
        (Some(name), _) => name.clone(),
        (None, true) => Path::new(locator)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| locator.to_string()),
        (None, false) => DEFAULT_UPDATE_NAME.to_string(),
    };

    let limit = resolve_limit(index, &name, &entry.iterations)?;
    let request = parse_update(&script).map_err(|source| {
        if !read_from_file && locator.to_ascii_lowercase().ends_with(".sparql") {
            ConfigError::ScriptNotFound {
                index,
                locator: locator.to_string(),
            }
        } else {
            ConfigError::ScriptSyntax {
                index,
                name: name.clone(),
                source,
            }
        }
    })?;

    UpdateRegistered {
        index,
        name: &name,
        limit: limit.resolve(),
        operations: request.step_count(),
    }
    .log();
    Ok(UpdateSpec::new(name, script, Arc::new(request), limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(script: &str, iterations: IterationSetting) -> UpdateConfig {
        UpdateConfig {
            name: None,
            script: script.to_string(),
            iterations,
        }
    }

    #[test]
    fn test_inline_script_gets_default_name() {
        let catalog = UpdateCatalog::from_config(&[entry(
            "INSERT DATA { <a> <b> <c> }",
            IterationSetting::Count(2),
        )])
        .unwrap();
        assert_eq!(catalog.names(), vec![DEFAULT_UPDATE_NAME]);
        assert_eq!(catalog.iteration_limits(), vec![IterationLimit::Count(2)]);
    }

    #[test]
    fn test_script_read_from_file_is_named_after_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mark.sparql");
        std::fs::write(&path, "INSERT DATA { <a> <b> <c> }").unwrap();

        let catalog = UpdateCatalog::from_config(&[entry(
            path.to_str().unwrap(),
            IterationSetting::Text("*".to_string()),
        )])
        .unwrap();
        assert_eq!(catalog.names(), vec!["mark.sparql"]);
        assert_eq!(catalog.scripts(), vec!["INSERT DATA { <a> <b> <c> }"]);
        assert_eq!(catalog.get(0).unwrap().limit().resolve(), HARD_ITERATION_CAP);
    }

    #[test]
    fn test_missing_sparql_file_is_reported_as_path() {
        let err = UpdateCatalog::from_config(&[
            entry("INSERT DATA { <a> <b> <c> }", IterationSetting::Count(1)),
            entry("rules/missing.sparql", IterationSetting::Count(1)),
        ])
        .unwrap_err();
        match err {
            ConfigError::ScriptNotFound { index, locator } => {
                assert_eq!(index, 2);
                assert_eq!(locator, "rules/missing.sparql");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_sparql_extension_matches_any_case() {
        let err = UpdateCatalog::from_config(&[entry("rules/Missing.SPARQL", IterationSetting::Count(1))])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ScriptNotFound { index: 1, ref locator } if locator == "rules/Missing.SPARQL"
        ));
    }

    #[test]
    fn test_bad_syntax_names_the_update() {
        let err = UpdateCatalog::from_config(&[UpdateConfig {
            name: Some("broken".to_string()),
            script: "INSERT { ?s <p> ?o ".to_string(),
            iterations: IterationSetting::Count(1),
        }])
        .unwrap_err();
        assert!(matches!(err, ConfigError::ScriptSyntax { index: 1, ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_iteration_limits() {
        assert_eq!(
            resolve_limit(1, "u", &IterationSetting::Count(5000)).unwrap(),
            IterationLimit::Count(HARD_ITERATION_CAP)
        );
        assert_eq!(
            resolve_limit(1, "u", &IterationSetting::Text("12".to_string())).unwrap(),
            IterationLimit::Count(12)
        );
        assert!(matches!(
            resolve_limit(3, "u", &IterationSetting::Text("often".to_string())),
            Err(ConfigError::InvalidIterationLimit { index: 3, .. })
        ));
        assert_eq!(IterationLimit::Unbounded.to_string(), "*");
    }
}
