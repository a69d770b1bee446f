//! Snapshot accessors: the bound original, a plain copy, and a copy with
//! overrides folded into its buckets.
use crate::groups::Groups;
use crate::resolve::{resolve_bucket, EVALUATED_ORDER};
use crate::schema::{Payload, ProctorResult, TestBucket};
use std::collections::BTreeMap;
use std::sync::Arc;

impl Groups {
    /// The snapshot this instance was built from, unchanged.
    pub fn get_proctor_result(&self) -> &Arc<ProctorResult> {
        &self.proctor_result
    }

    /// A fresh copy of the snapshot with no overrides applied.
    pub fn get_raw_proctor_result(&self) -> ProctorResult {
        ProctorResult::clone(&self.proctor_result)
    }

    /// A fresh snapshot whose buckets carry the effective values, as if the
    /// allocation engine had picked them. Allocations and definitions are
    /// copied unchanged.
    pub fn get_as_proctor_result(&self) -> ProctorResult {
        let buckets: BTreeMap<String, TestBucket> = self
            .proctor_result
            .buckets
            .iter()
            .map(|(name, determined)| {
                let value = self.policy.override_value(name, determined, self);
                (name.clone(), self.project_bucket(name, determined, value))
            })
            .collect();
        ProctorResult {
            matrix_version: self.proctor_result.matrix_version.clone(),
            buckets,
            allocations: self.proctor_result.allocations.clone(),
            test_definitions: self.proctor_result.test_definitions.clone(),
        }
    }

    fn project_bucket(&self, test_name: &str, determined: &TestBucket, value: i32) -> TestBucket {
        if value == determined.value {
            return determined.clone();
        }
        tracing::debug!(
            test = test_name,
            from = determined.value,
            to = value,
            "bucket value overridden"
        );
        let order = &EVALUATED_ORDER;
        match resolve_bucket(&self.proctor_result, order, test_name, value, None, |_| true) {
            Some((_, bucket)) => bucket.clone(),
            None => {
                tracing::debug!(
                    test = test_name,
                    value,
                    "overridden value has no catalogued bucket"
                );
                TestBucket {
                    name: String::new(),
                    value,
                    description: String::new(),
                    payload: Payload::default(),
                }
            }
        }
    }
}
