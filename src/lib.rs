//! Group resolution and presentation for experiment allocation snapshots.
//!
//! An allocation engine assigns each evaluated test a bucket and records the
//! allocation that routed the user there. [`Groups`] binds one such snapshot
//! ([`ProctorResult`]) to an override policy and answers every question from
//! the policy's *effective* value:
//!
//! - scalar queries: [`Groups::is_bucket_active`], [`Groups::get_value`],
//!   [`Groups::get_payload`], [`Groups::get_description`];
//! - logging strings: [`Groups::to_long_string`], [`Groups::to_logging_string`]
//!   and the `append_test_groups*` family;
//! - client config: [`Groups::get_java_script_config`] and
//!   [`Groups::get_java_script_config_for`];
//! - snapshots: [`Groups::get_proctor_result`], [`Groups::get_raw_proctor_result`],
//!   [`Groups::get_as_proctor_result`].
//!
//! Nothing here fails: unknown tests and missing definitions degrade to the
//! caller's default or to [`EMPTY_PAYLOAD`].
pub mod config;
pub mod groups;
pub mod policy;
pub mod project;
pub mod resolve;
pub mod schema;
pub mod serialize;

pub use groups::{Groups, LoggingFilter};
pub use policy::{BucketOverride, Chain, ForcedGroups, Holdout, Identity};
pub use resolve::{BucketSource, LookupValue};
pub use schema::{
    Allocation, Payload, PayloadValue, ProctorResult, Range, TestBucket, TestDefinition,
    EMPTY_PAYLOAD,
};
pub use serialize::{JsTestConfig, RequestedTest};
