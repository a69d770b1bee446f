//! The groups façade bound to one snapshot and one override policy.
//!
//! Every query resolves the *effective* value of a test: the policy's answer
//! for the determined bucket, never the raw value. Payload, serialization, and
//! re-projection all build on [`Groups::effective_value`].
use crate::policy::{BucketOverride, Identity};
use crate::schema::ProctorResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which evaluated tests take part in logging and client config output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoggingFilter {
    /// Every test with a determined bucket.
    #[default]
    All,
    /// Skip tests whose definition is silent and tests whose effective value
    /// is negative. Tests without a definition count as non-silent.
    ActiveNonSilent,
}

impl LoggingFilter {
    pub(crate) fn admits(self, groups: &Groups, test_name: &str) -> bool {
        match self {
            LoggingFilter::All => true,
            LoggingFilter::ActiveNonSilent => {
                let silent = groups
                    .proctor_result
                    .test_definitions
                    .get(test_name)
                    .is_some_and(|definition| definition.silent);
                !silent && groups.get_value(test_name, -1) >= 0
            }
        }
    }
}

/// Stateless view over an allocation snapshot.
///
/// Cloning is cheap; clones share the snapshot and the policy.
#[derive(Clone)]
pub struct Groups {
    pub(crate) proctor_result: Arc<ProctorResult>,
    pub(crate) policy: Arc<dyn BucketOverride>,
    pub(crate) logging_filter: LoggingFilter,
}

impl Groups {
    /// Bind a snapshot with the identity policy.
    pub fn new(proctor_result: impl Into<Arc<ProctorResult>>) -> Self {
        Self::with_override(proctor_result, Identity)
    }

    /// Bind a snapshot with a custom override policy.
    pub fn with_override(
        proctor_result: impl Into<Arc<ProctorResult>>,
        policy: impl BucketOverride + 'static,
    ) -> Self {
        Self::with_shared_override(proctor_result, Arc::new(policy))
    }

    pub fn with_shared_override(
        proctor_result: impl Into<Arc<ProctorResult>>,
        policy: Arc<dyn BucketOverride>,
    ) -> Self {
        Self {
            proctor_result: proctor_result.into(),
            policy,
            logging_filter: LoggingFilter::default(),
        }
    }

    pub fn with_logging_filter(mut self, logging_filter: LoggingFilter) -> Self {
        self.logging_filter = logging_filter;
        self
    }

    pub fn logging_filter(&self) -> LoggingFilter {
        self.logging_filter
    }

    pub fn is_empty(&self) -> bool {
        self.proctor_result.buckets.is_empty()
    }

    /// Every evaluated test, sorted by name.
    pub fn test_names(&self) -> Vec<&str> {
        self.proctor_result
            .buckets
            .keys()
            .map(String::as_str)
            .collect()
    }

    /// Effective value of `test_name`, or `None` if it was not evaluated.
    pub fn effective_value(&self, test_name: &str) -> Option<i32> {
        let determined = self.proctor_result.buckets.get(test_name)?;
        Some(self.policy.override_value(test_name, determined, self))
    }

    /// True iff the test was evaluated and its effective value is `value`.
    pub fn is_bucket_active(&self, test_name: &str, value: i32) -> bool {
        self.effective_value(test_name) == Some(value)
    }

    /// Like [`Groups::is_bucket_active`], but an unevaluated test behaves as
    /// if `fallback` were its value. The policy is still consulted for
    /// evaluated tests.
    pub fn is_bucket_active_or(&self, test_name: &str, value: i32, fallback: i32) -> bool {
        self.get_value(test_name, fallback) == value
    }

    /// Effective value of `test_name`, or `default` if it was not evaluated.
    pub fn get_value(&self, test_name: &str, default: i32) -> i32 {
        self.effective_value(test_name).unwrap_or(default)
    }
}

impl fmt::Debug for Groups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Groups")
            .field("matrix_version", &self.proctor_result.matrix_version)
            .field("tests", &self.proctor_result.buckets.len())
            .field("logging_filter", &self.logging_filter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "groups_tests.rs"]
mod tests;
