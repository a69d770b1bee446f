//! Logging strings and client-side config exports.
//!
//! Nothing here resolves values on its own: every entry is the effective
//! value from [`Groups::effective_value`] and every description or payload
//! comes from the resolution chain in [`crate::resolve`].
use crate::groups::Groups;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A test requested by client-side code, with the value to use when the test
/// was not evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedTest {
    pub name: String,
    pub fallback_value: i32,
}

impl RequestedTest {
    pub fn new(name: impl Into<String>, fallback_value: i32) -> Self {
        Self {
            name: name.into(),
            fallback_value,
        }
    }
}

impl FromStr for RequestedTest {
    type Err = anyhow::Error;

    /// Parse `NAME=FALLBACK`.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected NAME=FALLBACK (got {s:?})"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("test name must be non-empty (got {s:?})"));
        }
        let fallback_value = value
            .trim()
            .parse::<i32>()
            .with_context(|| format!("invalid fallback value {value:?}"))?;
        Ok(Self::new(name, fallback_value))
    }
}

/// One `[value, payload]` pair of the ordered client config. Serializes as a
/// two-element JSON array with `null` for "no payload".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsTestConfig(pub i32, pub Option<serde_json::Value>);

impl Groups {
    /// Tests taking part in logging output, sorted by name.
    pub fn get_logging_test_names(&self) -> Vec<&str> {
        self.proctor_result
            .buckets
            .keys()
            .map(String::as_str)
            .filter(|name| self.logging_filter.admits(self, name))
            .collect()
    }

    /// `name-description` for every evaluated test, sorted by name.
    pub fn to_long_string(&self) -> String {
        self.proctor_result
            .buckets
            .keys()
            .map(|name| format!("{name}-{}", self.get_description(name).unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `name<value>` entries followed by `allocation:name<value>` entries,
    /// each segment sorted by name.
    pub fn to_logging_string(&self) -> String {
        let mut out = String::new();
        self.append_both(&mut out, ',', &self.get_logging_test_names());
        out
    }

    /// Append `name<value>` for each requested test that was evaluated.
    pub fn append_test_groups_without_allocations<S: AsRef<str>>(
        &self,
        buf: &mut String,
        separator: char,
        test_names: &[S],
    ) {
        self.append_entries(buf, separator, test_names, false);
    }

    /// Append `allocation:name<value>` for each requested test that was
    /// evaluated.
    pub fn append_test_groups_with_allocations<S: AsRef<str>>(
        &self,
        buf: &mut String,
        separator: char,
        test_names: &[S],
    ) {
        self.append_entries(buf, separator, test_names, true);
    }

    /// Both entry forms over the whole logging universe. Callers must not rely
    /// on the emitted order.
    pub fn append_test_groups(&self, buf: &mut String, separator: char) {
        self.append_both(buf, separator, &self.get_logging_test_names());
    }

    /// Effective value of every test in the logging universe.
    pub fn get_java_script_config(&self) -> BTreeMap<String, i32> {
        self.get_logging_test_names()
            .into_iter()
            .filter_map(|name| Some((name.to_string(), self.effective_value(name)?)))
            .collect()
    }

    /// `[value, payload]` for each requested test, in request order.
    pub fn get_java_script_config_for(&self, tests: &[RequestedTest]) -> Vec<JsTestConfig> {
        tests
            .iter()
            .map(|test| {
                JsTestConfig(
                    self.get_value(&test.name, test.fallback_value),
                    self.get_payload(&test.name).fetch_value(),
                )
            })
            .collect()
    }

    fn append_both<S: AsRef<str>>(&self, buf: &mut String, separator: char, test_names: &[S]) {
        let mut with_allocations = String::new();
        self.append_entries(&mut with_allocations, separator, test_names, true);
        let wrote_plain = self.append_entries(buf, separator, test_names, false);
        if wrote_plain && !with_allocations.is_empty() {
            buf.push(separator);
        }
        buf.push_str(&with_allocations);
    }

    /// Returns whether anything was written.
    fn append_entries<S: AsRef<str>>(
        &self,
        buf: &mut String,
        separator: char,
        test_names: &[S],
        with_allocations: bool,
    ) -> bool {
        let mut wrote = false;
        for name in test_names {
            let name = name.as_ref();
            let Some(value) = self.effective_value(name) else {
                continue;
            };
            let allocation = if with_allocations {
                match self.proctor_result.allocations.get(name) {
                    Some(allocation) => Some(allocation.id.as_str()),
                    None => {
                        tracing::debug!(test = name, "no allocation for evaluated test");
                        continue;
                    }
                }
            } else {
                None
            };
            if wrote {
                buf.push(separator);
            }
            if let Some(id) = allocation {
                buf.push_str(id);
                buf.push(':');
            }
            buf.push_str(name);
            buf.push_str(&value.to_string());
            wrote = true;
        }
        wrote
    }
}
