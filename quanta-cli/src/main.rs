//! Quanta CLI
//!
//! Usage:
//! - `quanta "10 km/hr" m/s`: parse a quantity and convert it
//! - `quanta --json "3 m^2" cm`: print the result as JSON
//! - `quanta --list`: list registered units
//!
//! `QUANTA_CATALOG` names a JSON catalog loaded on top of the defaults.
//! `RUST_LOG` controls log output on stderr (default `info`).

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use quanta_core::QuantaError;
use quanta_units::{UnitRegistry, UnitSpec};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: quanta [--json] <quantity> [target]
       quanta --list

Examples:
  quanta \"10 km/hr\" m/s
  quanta \"100 degC\" degF
  quanta --json \"9.81 m/s^2\" ft/s^2";

#[derive(Debug, Error)]
enum CliError {
    #[error("{}", .0.report())]
    Quanta(#[from] QuantaError),

    #[error("cannot read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot serialize result: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}\n\n{usage}", usage = USAGE)]
    Usage(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Convert {
        json: bool,
        quantity: String,
        target: Option<String>,
    },
    List,
    Help,
}

fn parse_args(args: &[String]) -> Result<Command, CliError> {
    let mut json = false;
    let mut positional = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--json" => json = true,
            "--list" => return Ok(Command::List),
            "-h" | "--help" => return Ok(Command::Help),
            flag if flag.starts_with("--") => {
                return Err(CliError::Usage(format!("unknown option {}", flag)));
            }
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let quantity = positional
        .next()
        .ok_or_else(|| CliError::Usage("missing quantity".to_string()))?;
    let target = positional.next();
    if let Some(extra) = positional.next() {
        return Err(CliError::Usage(format!("unexpected argument {}", extra)));
    }

    Ok(Command::Convert { json, quantity, target })
}

/// Default catalog plus the optional JSON catalog
fn build_registry(catalog: Option<PathBuf>) -> Result<Arc<UnitRegistry>, CliError> {
    let mut builder = UnitRegistry::builder().with_defaults(true);
    if let Some(path) = catalog {
        let json = fs::read_to_string(&path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?;
        let specs = UnitSpec::parse_catalog(&json)?;
        info!(path = %path.display(), units = specs.len(), "loading unit catalog");
        builder = builder.with_definitions(specs);
    }
    Ok(builder.build()?)
}

fn execute(command: &Command, registry: &Arc<UnitRegistry>) -> Result<String, CliError> {
    match command {
        Command::Help => Ok(USAGE.to_string()),
        Command::List => Ok(list_units(registry)),
        Command::Convert { json, quantity, target } => {
            let parsed = registry.parse(quantity)?;
            debug!(input = %quantity, parsed = ?parsed, "parsed quantity");

            let result = match target {
                Some(target) => parsed.to_expr(target)?,
                None => parsed,
            };

            if *json {
                Ok(serde_json::to_string_pretty(&result.record())?)
            } else {
                Ok(result.to_string())
            }
        }
    }
}

fn list_units(registry: &UnitRegistry) -> String {
    registry
        .definitions()
        .into_iter()
        .map(|(name, def)| {
            if def.base == name {
                format!("{} (base)", name)
            } else if def.has_offset() {
                format!("{} = {} {} + {}", name, def.factor, def.base, def.offset)
            } else {
                format!("{} = {} {}", name, def.factor, def.base)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let catalog = env::var_os("QUANTA_CATALOG").map(PathBuf::from);

    let outcome = parse_args(&args).and_then(|command| {
        let registry = build_registry(catalog)?;
        execute(&command, &registry)
    });

    match outcome {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
