//! Override policies that reinterpret determined bucket values.
//!
//! A policy sees the test name, the bucket the allocation engine picked, and
//! the [`Groups`] it is bound to, so it can consult other tests' effective
//! state (hold-outs) or the test's own definition (forced groups).
//!
//! Policies must be deterministic for a fixed snapshot: the same test may be
//! resolved several times while answering one request.
use crate::groups::Groups;
use crate::schema::TestBucket;
use std::collections::BTreeMap;

/// Extension point that maps a determined bucket to its effective value.
pub trait BucketOverride: Send + Sync {
    fn override_value(&self, test_name: &str, determined: &TestBucket, groups: &Groups) -> i32;

    /// The value this policy decides for the test, or `None` when it leaves
    /// the test alone. A [`Chain`] stops at the first claim.
    ///
    /// By default a policy claims a test only when it changes its value.
    fn claim(&self, test_name: &str, determined: &TestBucket, groups: &Groups) -> Option<i32> {
        let value = self.override_value(test_name, determined, groups);
        (value != determined.value).then_some(value)
    }
}

impl<F> BucketOverride for F
where
    F: Fn(&str, &TestBucket, &Groups) -> i32 + Send + Sync,
{
    fn override_value(&self, test_name: &str, determined: &TestBucket, groups: &Groups) -> i32 {
        self(test_name, determined, groups)
    }
}

/// Keeps the determined value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl BucketOverride for Identity {
    fn override_value(&self, _test_name: &str, determined: &TestBucket, _groups: &Groups) -> i32 {
        determined.value
    }
}

/// While `test_name` is active with `active_value`, every other test is
/// forced to the smallest value in its own definition.
///
/// Tests without a definition, or with an empty one, keep their value. An
/// unevaluated hold-out test counts as value `-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holdout {
    pub test_name: String,
    pub active_value: i32,
}

impl Holdout {
    pub fn new(test_name: impl Into<String>, active_value: i32) -> Self {
        Self {
            test_name: test_name.into(),
            active_value,
        }
    }
}

impl BucketOverride for Holdout {
    fn override_value(&self, test_name: &str, determined: &TestBucket, groups: &Groups) -> i32 {
        self.claim(test_name, determined, groups)
            .unwrap_or(determined.value)
    }

    fn claim(&self, test_name: &str, _determined: &TestBucket, groups: &Groups) -> Option<i32> {
        if test_name == self.test_name
            || !groups.is_bucket_active_or(&self.test_name, self.active_value, -1)
        {
            return None;
        }
        groups
            .get_proctor_result()
            .test_definitions
            .get(test_name)?
            .min_value()
    }
}

/// Pins tests to fixed values, as long as the value is one their own
/// definition declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForcedGroups {
    pub forced: BTreeMap<String, i32>,
}

impl ForcedGroups {
    pub fn new(forced: BTreeMap<String, i32>) -> Self {
        Self { forced }
    }

    pub fn force(mut self, test_name: impl Into<String>, value: i32) -> Self {
        self.forced.insert(test_name.into(), value);
        self
    }
}

impl BucketOverride for ForcedGroups {
    fn override_value(&self, test_name: &str, determined: &TestBucket, groups: &Groups) -> i32 {
        self.claim(test_name, determined, groups)
            .unwrap_or(determined.value)
    }

    /// A pin claims its test even when it repeats the determined value.
    fn claim(&self, test_name: &str, _determined: &TestBucket, groups: &Groups) -> Option<i32> {
        let &value = self.forced.get(test_name)?;
        groups
            .get_proctor_result()
            .test_definitions
            .get(test_name)?
            .bucket_with_value(value)
            .map(|bucket| bucket.value)
    }
}

/// Tries each policy in order; the first one that claims the test wins.
#[derive(Default)]
pub struct Chain {
    policies: Vec<Box<dyn BucketOverride>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, policy: impl BucketOverride + 'static) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl BucketOverride for Chain {
    fn override_value(&self, test_name: &str, determined: &TestBucket, groups: &Groups) -> i32 {
        self.claim(test_name, determined, groups)
            .unwrap_or(determined.value)
    }

    fn claim(&self, test_name: &str, determined: &TestBucket, groups: &Groups) -> Option<i32> {
        self.policies
            .iter()
            .find_map(|policy| policy.claim(test_name, determined, groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ProctorResult, TestDefinition};

    fn snapshot() -> ProctorResult {
        let inactive = TestBucket::new("inactive", -1, "inactive");
        let control = TestBucket::new("control", 0, "control");
        let active = TestBucket::new("active", 1, "active");
        let mut result = ProctorResult::empty("1");
        result.buckets.insert("hold".to_string(), active.clone());
        result.buckets.insert("abtst".to_string(), active.clone());
        result.buckets.insert("nodef".to_string(), active.clone());
        result.test_definitions.insert(
            "hold".to_string(),
            TestDefinition::with_buckets(vec![inactive.clone(), active.clone()]),
        );
        result.test_definitions.insert(
            "abtst".to_string(),
            TestDefinition::with_buckets(vec![inactive, control, active]),
        );
        result
    }

    #[test]
    fn holdout_forces_smallest_defined_value() {
        let groups = Groups::with_override(snapshot(), Holdout::new("hold", 1));
        assert_eq!(groups.get_value("hold", 42), 1);
        assert_eq!(groups.get_value("abtst", 42), -1);
        assert_eq!(groups.get_value("nodef", 42), 1);
    }

    #[test]
    fn holdout_is_inert_when_not_active() {
        let groups = Groups::with_override(snapshot(), Holdout::new("hold", 2));
        assert_eq!(groups.get_value("abtst", 42), 1);

        let groups = Groups::with_override(snapshot(), Holdout::new("missing", 1));
        assert_eq!(groups.get_value("abtst", 42), 1);
    }

    #[test]
    fn forced_groups_require_a_defined_value() {
        let policy = ForcedGroups::default().force("abtst", 0).force("hold", 7);
        let groups = Groups::with_override(snapshot(), policy);
        assert_eq!(groups.get_value("abtst", 42), 0);
        assert_eq!(groups.get_value("hold", 42), 1);
    }

    #[test]
    fn chain_takes_first_changing_policy() {
        let chain = Chain::new()
            .then(ForcedGroups::default().force("abtst", 0))
            .then(Holdout::new("hold", 1));
        assert_eq!(chain.len(), 2);
        let groups = Groups::with_override(snapshot(), chain);
        assert_eq!(groups.get_value("abtst", 42), 0);
        assert_eq!(groups.get_value("hold", 42), 1);
    }

    #[test]
    fn pin_matching_determined_value_still_stops_the_chain() {
        let chain = Chain::new()
            .then(ForcedGroups::default().force("abtst", 1))
            .then(Holdout::new("hold", 1));
        let groups = Groups::with_override(snapshot(), chain);
        assert_eq!(groups.get_value("abtst", 42), 1);
        assert_eq!(groups.get_value("nodef", 42), 1);

        let pinned = ForcedGroups::default().force("abtst", 1);
        let determined = TestBucket::new("active", 1, "active");
        assert_eq!(pinned.claim("abtst", &determined, &groups), Some(1));
        assert_eq!(pinned.claim("nodef", &determined, &groups), None);
    }

    #[test]
    fn holdout_claims_only_defined_tests_while_active() {
        let groups = Groups::new(snapshot());
        let determined = TestBucket::new("active", 1, "active");
        let holdout = Holdout::new("hold", 1);
        assert_eq!(holdout.claim("abtst", &determined, &groups), Some(-1));
        assert_eq!(holdout.claim("nodef", &determined, &groups), None);
        assert_eq!(holdout.claim("hold", &determined, &groups), None);
        assert_eq!(Holdout::new("hold", 2).claim("abtst", &determined, &groups), None);
    }

    #[test]
    fn closures_are_policies() {
        let groups = Groups::with_override(
            snapshot(),
            |name: &str, determined: &TestBucket, _groups: &Groups| {
                if name == "nodef" {
                    5
                } else {
                    determined.value
                }
            },
        );
        assert_eq!(groups.get_value("nodef", 42), 5);
        assert_eq!(groups.get_value("abtst", 42), 1);
    }
}
