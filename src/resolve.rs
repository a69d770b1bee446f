//! Payload and description resolution for effective values.
//!
//! Resolution walks a fixed list of lookup steps in order. Each step names a
//! source and the value it is matched against:
//!
//! 1. the determined bucket, when the effective value equals its raw value;
//! 2. the bucket with the effective value in the test's own definition;
//! 3. the caller-supplied fallback bucket, when its value is the effective one;
//! 4. the bucket with the fallback's value in the test's own definition.
//!
//! An unevaluated test takes the fallback's value as its effective value and
//! starts at the definition lookup. Payload and description queries skip
//! buckets whose payload or description is empty, so a bare matching bucket
//! does not hide a populated one further down.
use crate::groups::Groups;
use crate::schema::{Payload, ProctorResult, TestBucket, EMPTY_PAYLOAD};

/// Where a resolved bucket came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketSource {
    Determined,
    Definition,
    Fallback,
}

/// The value a lookup step matches buckets against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupValue {
    Effective,
    FallbackValue,
}

pub type LookupStep = (BucketSource, LookupValue);

/// Lookup order for a test that has a determined bucket.
pub const EVALUATED_ORDER: [LookupStep; 4] = [
    (BucketSource::Determined, LookupValue::Effective),
    (BucketSource::Definition, LookupValue::Effective),
    (BucketSource::Fallback, LookupValue::Effective),
    (BucketSource::Definition, LookupValue::FallbackValue),
];

/// Lookup order for a test that was not evaluated.
pub const UNEVALUATED_ORDER: [LookupStep; 2] = [
    (BucketSource::Definition, LookupValue::FallbackValue),
    (BucketSource::Fallback, LookupValue::FallbackValue),
];

impl BucketSource {
    /// The bucket this source offers for `value`, if any.
    pub fn lookup<'a>(
        self,
        result: &'a ProctorResult,
        test_name: &str,
        value: i32,
        fallback: Option<&'a TestBucket>,
    ) -> Option<&'a TestBucket> {
        match self {
            BucketSource::Determined => result
                .buckets
                .get(test_name)
                .filter(|bucket| bucket.value == value),
            BucketSource::Definition => result
                .test_definitions
                .get(test_name)?
                .bucket_with_value(value),
            BucketSource::Fallback => fallback.filter(|bucket| bucket.value == value),
        }
    }
}

/// Find the first bucket along `order` that `accept` takes.
///
/// `value` is the effective value. Steps keyed on the fallback value are
/// skipped when no fallback bucket is given.
pub fn resolve_bucket<'a>(
    result: &'a ProctorResult,
    order: &[LookupStep],
    test_name: &str,
    value: i32,
    fallback: Option<&'a TestBucket>,
    accept: impl Fn(&TestBucket) -> bool,
) -> Option<(BucketSource, &'a TestBucket)> {
    order.iter().find_map(|&(source, target)| {
        let value = match target {
            LookupValue::Effective => value,
            LookupValue::FallbackValue => fallback?.value,
        };
        source
            .lookup(result, test_name, value, fallback)
            .filter(|bucket| accept(*bucket))
            .map(|bucket| (source, bucket))
    })
}

impl Groups {
    /// Bucket backing the effective value of `test_name`.
    pub fn get_bucket(&self, test_name: &str) -> Option<&TestBucket> {
        self.resolve_active_bucket(test_name, None, |_| true)
    }

    /// Like [`Groups::get_bucket`]; when nothing backs the effective value,
    /// settles on the definition's bucket for the fallback's value.
    pub fn get_bucket_with_fallback<'a>(
        &'a self,
        test_name: &str,
        fallback: &'a TestBucket,
    ) -> Option<&'a TestBucket> {
        self.resolve_active_bucket(test_name, Some(fallback), |_| true)
    }

    /// Payload for the effective value, or [`EMPTY_PAYLOAD`].
    pub fn get_payload(&self, test_name: &str) -> &Payload {
        self.resolve_payload(test_name, None)
    }

    pub fn get_payload_with_fallback<'a>(
        &'a self,
        test_name: &str,
        fallback: &'a TestBucket,
    ) -> &'a Payload {
        self.resolve_payload(test_name, Some(fallback))
    }

    /// Description for the effective value, if a bucket with a non-empty
    /// description backs it.
    pub fn get_description(&self, test_name: &str) -> Option<&str> {
        self.resolve_description(test_name, None)
    }

    pub fn get_description_with_fallback<'a>(
        &'a self,
        test_name: &str,
        fallback: &'a TestBucket,
    ) -> Option<&'a str> {
        self.resolve_description(test_name, Some(fallback))
    }

    fn resolve_payload<'a>(
        &'a self,
        test_name: &str,
        fallback: Option<&'a TestBucket>,
    ) -> &'a Payload {
        self.resolve_active_bucket(test_name, fallback, |bucket| !bucket.payload.is_empty())
            .map_or(&EMPTY_PAYLOAD, |bucket| &bucket.payload)
    }

    fn resolve_description<'a>(
        &'a self,
        test_name: &str,
        fallback: Option<&'a TestBucket>,
    ) -> Option<&'a str> {
        self.resolve_active_bucket(test_name, fallback, |bucket| !bucket.description.is_empty())
            .map(|bucket| bucket.description.as_str())
    }

    fn resolve_active_bucket<'a>(
        &'a self,
        test_name: &str,
        fallback: Option<&'a TestBucket>,
        accept: impl Fn(&TestBucket) -> bool,
    ) -> Option<&'a TestBucket> {
        let (order, value) = match self.effective_value(test_name) {
            Some(value) => (&EVALUATED_ORDER[..], value),
            None => (&UNEVALUATED_ORDER[..], fallback?.value),
        };
        resolve_bucket(&self.proctor_result, order, test_name, value, fallback, accept)
            .map(|(_, bucket)| bucket)
    }
}
