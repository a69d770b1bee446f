//! Override policy configuration and snapshot files.
//!
//! A config selects which built-in policies wrap a snapshot and how the
//! logging universe is filtered. It is plain JSON so it can sit next to the
//! snapshot it applies to.
use crate::groups::{Groups, LoggingFilter};
use crate::policy::{Chain, ForcedGroups, Holdout};
use crate::schema::ProctorResult;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Pack of policies applied to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holdout: Option<HoldoutConfig>,
    /// Test name to pinned bucket value. Pins win over the hold-out.
    #[serde(default)]
    pub forced: BTreeMap<String, i32>,
    #[serde(default)]
    pub logging_filter: LoggingFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldoutConfig {
    pub test_name: String,
    pub active_value: i32,
}

impl PolicyConfig {
    /// Compose the configured policies: forced pins first, then the hold-out.
    pub fn build_policy(&self) -> Chain {
        let mut chain = Chain::new();
        if !self.forced.is_empty() {
            chain = chain.then(ForcedGroups::new(self.forced.clone()));
        }
        if let Some(holdout) = &self.holdout {
            chain = chain.then(Holdout::new(holdout.test_name.clone(), holdout.active_value));
        }
        chain
    }

    pub fn build_groups(&self, proctor_result: ProctorResult) -> Groups {
        Groups::with_override(proctor_result, self.build_policy())
            .with_logging_filter(self.logging_filter)
    }
}

/// The config used when none is given: no overrides, full logging universe.
pub fn default_config() -> PolicyConfig {
    PolicyConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        holdout: None,
        forced: BTreeMap::new(),
        logging_filter: LoggingFilter::All,
    }
}

/// Render a pretty JSON config stub.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&default_config()).context("serialize config stub")
}

pub fn load_config(path: &Path) -> Result<PolicyConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: PolicyConfig =
        serde_json::from_slice(&bytes).context("parse policy config JSON")?;
    tracing::debug!(
        path = %path.display(),
        forced = config.forced.len(),
        holdout = config.holdout.is_some(),
        "loaded policy config"
    );
    Ok(config)
}

/// Persist a config in a stable JSON format.
pub fn write_config(path: &Path, config: &PolicyConfig) -> Result<()> {
    let text = serde_json::to_string_pretty(config).context("serialize policy config")?;
    write_text(path, &text)
}

/// Reject configs this version cannot apply.
pub fn validate_config(config: &PolicyConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported policy config schema_version {}",
            config.schema_version
        ));
    }
    if let Some(holdout) = &config.holdout {
        if holdout.test_name.trim().is_empty() {
            return Err(anyhow!("holdout.test_name must be non-empty"));
        }
        if config.forced.contains_key(&holdout.test_name) {
            return Err(anyhow!(
                "hold-out test {:?} cannot also be forced",
                holdout.test_name
            ));
        }
    }
    if let Some(name) = config.forced.keys().find(|name| name.trim().is_empty()) {
        return Err(anyhow!("forced entries need a test name (got {name:?})"));
    }
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<ProctorResult> {
    let bytes = fs::read(path).with_context(|| format!("read snapshot {}", path.display()))?;
    let snapshot: ProctorResult =
        serde_json::from_slice(&bytes).context("parse snapshot JSON")?;
    tracing::info!(
        path = %path.display(),
        matrix_version = %snapshot.matrix_version,
        tests = snapshot.buckets.len(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

pub fn write_snapshot(path: &Path, snapshot: &ProctorResult) -> Result<()> {
    let text = serde_json::to_string_pretty(snapshot).context("serialize snapshot")?;
    write_text(path, &text)
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
