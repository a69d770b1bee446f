//! CLI argument parsing for snapshot inspection.
//!
//! Every command reads one snapshot, applies an optional policy config, and
//! prints a single output surface of the groups library.
use clap::{Args, Parser, Subcommand};
use proctor_groups::RequestedTest;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pgroups",
    version,
    about = "Resolve and print experiment groups from an allocation snapshot",
    after_help = "Examples:\n  pgroups logging --snapshot result.json\n  pgroups long --snapshot result.json --config policy.json\n  pgroups js-config --snapshot result.json --test bgtst=-1 --test abtst=0\n  pgroups value --snapshot result.json --test abtst --default -1\n  pgroups project --snapshot result.json --config policy.json --out projected.json\n  pgroups init-config --out policy.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the logging string (values, then allocation-prefixed values)
    Logging(SnapshotArgs),
    /// Print `test-description` for every evaluated test
    Long(SnapshotArgs),
    JsConfig(JsConfigArgs),
    Value(ValueArgs),
    Project(ProjectArgs),
    InitConfig(InitConfigArgs),
}

/// Inputs shared by every command that reads a snapshot.
#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Snapshot JSON produced by the allocation engine
    #[arg(long, value_name = "PATH")]
    pub snapshot: PathBuf,

    /// Policy config JSON (hold-out, forced groups, logging filter)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(about = "Print client-side config as JSON")]
pub struct JsConfigArgs {
    #[command(flatten)]
    pub input: SnapshotArgs,

    /// Requested test with its fallback value; switches to the list form
    #[arg(long = "test", value_name = "NAME=FALLBACK")]
    pub tests: Vec<RequestedTest>,
}

#[derive(Args, Debug)]
#[command(about = "Print the effective value of one test")]
pub struct ValueArgs {
    #[command(flatten)]
    pub input: SnapshotArgs,

    /// Test name
    #[arg(long, value_name = "NAME")]
    pub test: String,

    /// Value printed when the test was not evaluated
    #[arg(long, value_name = "N", default_value_t = -1, allow_negative_numbers = true)]
    pub default: i32,
}

#[derive(Args, Debug)]
#[command(about = "Print or write the snapshot with overrides applied")]
pub struct ProjectArgs {
    #[command(flatten)]
    pub input: SnapshotArgs,

    /// Emit the snapshot as loaded, without overrides
    #[arg(long)]
    pub raw: bool,

    /// Output path; stdout when omitted
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(about = "Write a policy config stub")]
pub struct InitConfigArgs {
    /// Output path for the config
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}
