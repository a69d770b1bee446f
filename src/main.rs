use anyhow::{anyhow, Context, Result};
use clap::Parser;
use proctor_groups::config;
use proctor_groups::Groups;
use std::fs;
use std::path::Path;

mod cli;

fn main() -> Result<()> {
    let args = cli::RootArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        cli::Command::Logging(args) => {
            println!("{}", open_groups(&args)?.to_logging_string());
            Ok(())
        }
        cli::Command::Long(args) => {
            println!("{}", open_groups(&args)?.to_long_string());
            Ok(())
        }
        cli::Command::JsConfig(args) => cmd_js_config(args),
        cli::Command::Value(args) => {
            let groups = open_groups(&args.input)?;
            println!("{}", groups.get_value(&args.test, args.default));
            Ok(())
        }
        cli::Command::Project(args) => cmd_project(args),
        cli::Command::InitConfig(args) => cmd_init_config(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_groups(args: &cli::SnapshotArgs) -> Result<Groups> {
    let config = match &args.config {
        Some(path) => {
            let config = config::load_config(path)?;
            config::validate_config(&config)
                .with_context(|| format!("validate config {}", path.display()))?;
            config
        }
        None => config::default_config(),
    };
    let snapshot = config::load_snapshot(&args.snapshot)?;
    Ok(config.build_groups(snapshot))
}

fn cmd_js_config(args: cli::JsConfigArgs) -> Result<()> {
    let groups = open_groups(&args.input)?;
    let text = if args.tests.is_empty() {
        serde_json::to_string_pretty(&groups.get_java_script_config())
    } else {
        serde_json::to_string_pretty(&groups.get_java_script_config_for(&args.tests))
    }
    .context("serialize client config")?;
    println!("{text}");
    Ok(())
}

fn cmd_project(args: cli::ProjectArgs) -> Result<()> {
    let groups = open_groups(&args.input)?;
    let snapshot = if args.raw {
        groups.get_raw_proctor_result()
    } else {
        groups.get_as_proctor_result()
    };
    match &args.out {
        Some(out) => {
            config::write_snapshot(out, &snapshot)?;
            tracing::info!(path = %out.display(), raw = args.raw, "wrote snapshot");
        }
        None => {
            let text = serde_json::to_string_pretty(&snapshot).context("serialize snapshot")?;
            println!("{text}");
        }
    }
    Ok(())
}

fn cmd_init_config(args: cli::InitConfigArgs) -> Result<()> {
    ensure_writable(&args.out, args.force)?;
    let stub = config::config_stub()?;
    fs::write(&args.out, stub).with_context(|| format!("write {}", args.out.display()))?;
    println!("wrote {}", args.out.display());
    Ok(())
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    Ok(())
}
