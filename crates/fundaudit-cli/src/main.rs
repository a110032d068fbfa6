//! fundaudit — audit fund legal documents against the regulatory rule
//! library from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fundaudit_core::{audit, DocumentBundle};

#[derive(Parser)]
#[command(
    name = "fundaudit",
    version,
    about = "Audit Chinese public-fund legal documents against the regulatory rule library"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full audit and print the report as JSON
    Audit {
        /// Document bundle (YAML or JSON)
        bundle: PathBuf,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,

        /// Print a one-line-per-rule summary instead of JSON
        #[arg(long)]
        summary: bool,
    },
    /// Validate a bundle against the embedded schema without auditing
    Validate {
        /// Document bundle (YAML or JSON)
        bundle: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Audit {
            bundle,
            pretty,
            summary,
        } => {
            let bundle = DocumentBundle::from_file(&bundle)
                .with_context(|| format!("failed to load bundle {}", bundle.display()))?;
            info!(fid = %bundle.fid, mold = ?bundle.mold, "auditing document");
            let report = audit(&bundle);
            if summary {
                for result in &report.results {
                    let verdict = if result.is_compliance { "ok" } else { "FAIL" };
                    println!("{:<18} {:<6} {}", result.label, verdict, result.name);
                }
                println!(
                    "{}/{} rules compliant",
                    report.compliant_count(),
                    report.results.len()
                );
            } else if pretty {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", serde_json::to_string(&report)?);
            }
            let all_compliant = report.results.iter().all(|r| r.is_compliance);
            Ok(if all_compliant {
                ExitCode::SUCCESS
            } else {
                // distinguish "ran fine, found problems" from hard errors
                ExitCode::from(2)
            })
        }
        Command::Validate { bundle } => {
            let path = bundle;
            DocumentBundle::from_file(&path)
                .with_context(|| format!("bundle {} is invalid", path.display()))?;
            println!("{} is valid", path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
