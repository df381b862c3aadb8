//! Sheriff configuration: walk bounds, core-builder patterns, and the
//! default snapshot location.
//!
//! A missing config file is not an error; every field has a default. A file
//! that exists must parse cleanly and carry a supported schema version.

use crate::explain::{
    ExplainPolicy, DEFAULT_LOOK_BACK_LIMIT, DEFAULT_SATURATION_CAP, DEFAULT_SEARCH_LIMIT,
};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheriffConfig {
    pub schema_version: u32,
    /// Snapshot read when neither `--snapshot` nor `SHERIFF_SNAPSHOT` names
    /// one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    /// How many revisions below the start `failure-reason` may probe.
    #[serde(default = "default_search_limit")]
    pub search_limit: u64,
    /// Failing-test count at which the status service truncates results.
    #[serde(default = "default_saturation_cap")]
    pub saturation_cap: usize,
    /// How many builds back a red builder's transition find may walk.
    #[serde(default = "default_look_back_limit")]
    pub look_back_limit: u64,
    /// Regex patterns naming the core builders; empty means every builder.
    #[serde(default)]
    pub core_builders: Vec<String>,
}

fn default_search_limit() -> u64 {
    DEFAULT_SEARCH_LIMIT
}

fn default_saturation_cap() -> usize {
    DEFAULT_SATURATION_CAP
}

fn default_look_back_limit() -> u64 {
    DEFAULT_LOOK_BACK_LIMIT
}

impl SheriffConfig {
    pub fn explain_policy(&self) -> ExplainPolicy {
        ExplainPolicy {
            search_limit: self.search_limit,
            saturation_cap: self.saturation_cap,
        }
    }

    pub fn core_builder_patterns(&self) -> Result<Vec<Regex>> {
        self.core_builders
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .with_context(|| format!("invalid core_builders pattern {pattern:?}"))
            })
            .collect()
    }
}

pub fn default_config() -> SheriffConfig {
    SheriffConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        snapshot: None,
        search_limit: DEFAULT_SEARCH_LIMIT,
        saturation_cap: DEFAULT_SATURATION_CAP,
        look_back_limit: DEFAULT_LOOK_BACK_LIMIT,
        core_builders: Vec::new(),
    }
}

/// Render a pretty JSON config stub for `sheriff init`.
pub fn config_stub() -> String {
    serde_json::to_string_pretty(&default_config()).expect("serialize config stub")
}

/// Default location: `<config dir>/sheriff/config.json`.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("cannot determine a configuration directory"))?;
    Ok(config_dir.join("sheriff").join("config.json"))
}

pub fn load_config(path: &Path) -> Result<SheriffConfig> {
    if !path.is_file() {
        return Ok(default_config());
    }
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: SheriffConfig =
        serde_json::from_slice(&bytes).context("parse sheriff config JSON")?;
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    Ok(config)
}

pub fn write_config(path: &Path, config: &SheriffConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize sheriff config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.search_limit, DEFAULT_SEARCH_LIMIT);
        assert_eq!(config.saturation_cap, DEFAULT_SATURATION_CAP);
        assert_eq!(config.look_back_limit, DEFAULT_LOOK_BACK_LIMIT);
        assert!(config.snapshot.is_none());
        assert!(config.core_builders.is_empty());
    }

    #[test]
    fn written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheriff").join("config.json");
        let mut config = default_config();
        config.snapshot = Some(PathBuf::from("/var/sheriff/tree.json"));
        config.core_builders = vec!["Release".to_string()];
        write_config(&path, &config).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.snapshot, Some(PathBuf::from("/var/sheriff/tree.json")));
        assert_eq!(loaded.core_builders, vec!["Release".to_string()]);
    }

    #[test]
    fn stub_parses_back_to_the_defaults() {
        let parsed: SheriffConfig = serde_json::from_str(&config_stub()).unwrap();
        assert_eq!(parsed.schema_version, CONFIG_SCHEMA_VERSION);
        assert_eq!(parsed.search_limit, DEFAULT_SEARCH_LIMIT);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "schema_version": 1, "serach_limit": 10 }"#).unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parse sheriff config"));
    }

    #[test]
    fn unsupported_schema_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "schema_version": 9 }"#).unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("schema_version 9"));
    }

    #[test]
    fn bad_core_pattern_is_reported_with_the_pattern() {
        let mut config = default_config();
        config.core_builders = vec!["[".to_string()];
        let err = config.core_builder_patterns().unwrap_err();
        assert!(format!("{err:#}").contains("core_builders pattern"));
    }
}
