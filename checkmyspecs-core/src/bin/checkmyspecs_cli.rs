//! Check My Specs CLI - Bridge interface for the web front end
//!
//! Commands: specs, check
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 when any file fails its spec

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use checkmyspecs_core::{
    BatchReport, CheckPipeline, FileVerdict, SpecCatalog, Verdict, VerdictStatus,
};

#[derive(Parser)]
#[command(name = "checkmyspecs-cli")]
#[command(about = "Check My Specs - artwork checker for billboard specs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Alternative catalog JSON file (defaults to the built-in catalog)
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available specs
    Specs,

    /// Check artwork files against a spec
    Check {
        /// Spec name, exactly as listed by `specs`
        #[arg(short, long)]
        spec: String,

        /// Artwork files (.jpg, .jpeg or .pdf)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => error!(error = %e, "failed to serialise output"),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog = match &cli.catalog {
        Some(path) => match SpecCatalog::load_from_file(path) {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, "failed to load catalog");
                println!("{}", serde_json::json!({"error": e.to_string()}));
                return ExitCode::FAILURE;
            }
        },
        None => SpecCatalog::builtin().clone(),
    };

    let pipeline = CheckPipeline::new(catalog);

    match cli.command {
        Commands::Specs => {
            let specs: Vec<_> = pipeline.catalog()
                .list()
                .iter()
                .map(|p| serde_json::json!({
                    "name": p.name,
                    "format": p.family(),
                    "size": p.size,
                }))
                .collect();

            print_json(&specs);
            ExitCode::SUCCESS
        }

        Commands::Check { spec, files } => {
            let mut entries = Vec::with_capacity(files.len());
            for path in &files {
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());

                let entry = match fs::read(path) {
                    Ok(bytes) => FileVerdict::check(&pipeline, &bytes, &spec, &filename),
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "cannot read file");
                        FileVerdict {
                            filename,
                            sha256: String::new(),
                            verdict: Verdict::error(format!("Cannot read file: {}", e)),
                        }
                    }
                };
                entries.push(entry);
            }

            let report = BatchReport::from_entries(&spec, entries);
            print_json(&report);

            if report.count(VerdictStatus::Error) > 0 {
                ExitCode::FAILURE
            } else if report.all_passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)  // Spec failure
            }
        }
    }
}
