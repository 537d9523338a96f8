//! Schema Preparation CLI
//!
//! Stages and validates a keyspace schema directory the same way a test
//! database bootstrap would.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vitess_schema_prep::{CleanupPolicy, PrepConfig, RuleRegistry, SchemaPreparer};

#[derive(Parser)]
#[command(name = "schema-prep")]
#[command(about = "Stage and validate Vitess keyspace schema directories")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long)]
    config: Option<String>,

    /// Extra classpath resource root (repeatable)
    #[arg(long = "classpath-root")]
    classpath_roots: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage a schema directory and keep the staged copy
    Prepare {
        #[command(flatten)]
        target: Target,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stage, validate and remove the staged copy
    Validate {
        #[command(flatten)]
        target: Target,

        /// Write a JSON report to this file
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// List registered lint rules
    Rules,
}

#[derive(Args)]
struct Target {
    /// Schema directory reference (classpath:... or filesystem:...); falls back to schema.dir
    schema_dir: Option<String>,

    /// Fail on lint violations
    #[arg(long)]
    lint: bool,

    /// Disable a lint rule (repeatable)
    #[arg(long = "disable")]
    disabled_rules: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = PrepConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    config.classpath.roots.extend(cli.classpath_roots);

    match cli.command {
        Commands::Prepare { target, json } => {
            apply_target(&mut config, target);
            let prepared = SchemaPreparer::from_config(&config)?;

            if json {
                let output = serde_json::json!({
                    "reference": prepared.reference().as_str(),
                    "staged_path": prepared.current_schema_dir_path(),
                    "bundle_hash": prepared.bundle_hash(),
                    "keyspaces": prepared.keyspaces(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("✅ Staged {} at {}", prepared.reference(), prepared.current_schema_dir_path().display());
                for keyspace in prepared.keyspaces() {
                    println!(
                        "  {} ({}, {} migration(s), {} table(s))",
                        keyspace.name(),
                        if keyspace.is_sharded() { "sharded" } else { "unsharded" },
                        keyspace.migrations().len(),
                        keyspace.tables().len()
                    );
                }
            }
            Ok(())
        }

        Commands::Validate { target, report } => {
            apply_target(&mut config, target);
            config.staging.cleanup = CleanupPolicy::RemoveOnDrop;

            println!("🔍 Validating {}", config.schema.dir.as_deref().unwrap_or("<unset>"));
            let prepared = SchemaPreparer::from_config(&config)?;

            let keyspaces: Vec<_> = prepared
                .keyspaces()
                .iter()
                .map(|k| {
                    serde_json::json!({
                        "name": k.name(),
                        "sharded": k.is_sharded(),
                        "shards": k.shard_count(),
                        "migrations": k.migrations().len(),
                        "tables": k.tables(),
                    })
                })
                .collect();

            let report_json = serde_json::to_string_pretty(&serde_json::json!({
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "reference": prepared.reference().as_str(),
                "lint": config.schema.lint,
                "bundle_hash": prepared.bundle_hash(),
                "keyspaces": keyspaces,
            }))?;
            prepared.cleanup()?;

            if let Some(path) = report {
                std::fs::write(&path, &report_json)?;
                println!("✅ Report written to {:?}", path);
            } else {
                println!("{}", report_json);
            }
            Ok(())
        }

        Commands::Rules => {
            let mut registry = RuleRegistry::builtin();
            registry.disable_all(&config.lint.disabled_rules)?;
            for (rule, enabled) in registry.rules() {
                let marker = if enabled { "✅" } else { "⛔" };
                println!("{} {:<30} {}", marker, rule.name(), rule.description());
            }
            Ok(())
        }
    }
}

fn apply_target(config: &mut PrepConfig, target: Target) {
    if let Some(dir) = target.schema_dir {
        config.schema.dir = Some(dir);
    }
    config.schema.lint |= target.lint;
    config.lint.disabled_rules.extend(target.disabled_rules);
}
