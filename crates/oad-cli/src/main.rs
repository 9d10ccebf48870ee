use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use indexmap::IndexMap;
use serde_json::Value;

use oad_core::actions::{self, ActionRegistration, SignatureParam};
use oad_core::catalog::{Document, ParamKind};
use oad_core::config::{self, CONFIG_FILE_NAME, OadConfig};
use oad_core::normalize;
use oad_core::parse::{self, RawSpec};
use oad_dispatch::dispatcher::{Dispatcher, DispatcherConfig};

#[derive(Parser)]
#[command(name = "oad", about = "OpenAPI action dispatcher", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a spec file and summarize its actions
    Validate {
        /// Path to the spec file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Inspect the compiled action catalog of a spec file
    Inspect {
        /// Path to the spec file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Invoke one action against a live server
    Invoke {
        /// Action identifier, as shown by inspect
        id: String,

        /// Argument values; omitted parameters use their defaults
        #[arg(value_name = "NAME=VALUE")]
        args: Vec<String>,

        /// Path to the spec file; defaults to the configured one
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Base URL override; defaults to the document's, then the
        /// configured host
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Initialize a new oad configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { input } => cmd_validate(input),

        Commands::Inspect { input, format } => cmd_inspect(input, format),

        Commands::Invoke {
            id,
            args,
            input,
            base_url,
        } => cmd_invoke(id, args, input, base_url),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oad", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<OadConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn load_document(path: &PathBuf) -> Result<Document> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    let parsed = match ext {
        "json" => parse::from_json(&content)?,
        _ => parse::from_yaml(&content)?,
    };

    let document = normalize::normalize(&parsed)?;
    Ok(document)
}

fn cmd_validate(input: PathBuf) -> Result<()> {
    let content = fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let ext = input.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    let parsed = match ext {
        "json" => parse::from_json(&content)?,
        _ => parse::from_yaml(&content)?,
    };

    let title = match &parsed {
        RawSpec::V2(spec) => &spec.info.title,
        RawSpec::V3(spec) => &spec.info.title,
    };
    eprintln!("Valid {} document: {}", parsed.version_label(), title);

    let document = normalize::normalize(&parsed)?;
    if !document.base_url.is_empty() {
        eprintln!("  Base URL: {}", document.base_url);
    }
    eprintln!("  Paths: {}", document.paths.len());
    eprintln!("  Actions: {}", document.operation_count());

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(input: PathBuf, format: InspectFormat) -> Result<()> {
    let document = load_document(&input)?;
    let summary = build_inspect_summary(&document);

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(document: &Document) -> serde_json::Value {
    let registrations = actions::compile(document);

    let listed: Vec<serde_json::Value> = document
        .operations()
        .zip(&registrations)
        .map(|(op, registration)| {
            let parameters: Vec<serde_json::Value> = op
                .parameters
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "name": p.name,
                        "location": p.location.as_str(),
                        "kind": p.kind.as_str(),
                    })
                })
                .collect();
            serde_json::json!({
                "id": op.id,
                "name": registration.display_name,
                "method": op.method.as_str(),
                "path": op.path,
                "parameters": parameters,
            })
        })
        .collect();

    serde_json::json!({
        "base_url": document.base_url,
        "actions": listed,
    })
}

fn cmd_invoke(
    id: String,
    args: Vec<String>,
    input: Option<PathBuf>,
    base_url: Option<String>,
) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let input = input.unwrap_or_else(|| PathBuf::from(&cfg.spec_file));
    let document = load_document(&input)?;

    let operation = document.find_operation(&id).with_context(|| {
        let known: Vec<&str> = document.operations().map(|op| op.id.as_str()).collect();
        format!("no action {id:?}; known actions: {}", known.join(", "))
    })?;

    let base = base_url
        .or_else(|| (!document.base_url.is_empty()).then(|| document.base_url.clone()))
        .unwrap_or_else(|| cfg.base_url());
    if base.is_empty() {
        anyhow::bail!("no base URL: pass --base-url or set host in {CONFIG_FILE_NAME}");
    }
    log::debug!("resolved base URL {base}");

    let registration = actions::compile_operation(operation);
    let overrides = parse_overrides(&args)?;
    let values = argument_values(&registration, &overrides)?;

    eprintln!("{} {} → {}", operation.method, operation.path, base);

    let dispatcher = Dispatcher::new(DispatcherConfig::default())?;
    let (tx, rx) = mpsc::channel();
    dispatcher.invoke(operation, &base, values, move |outcome| {
        // Send only fails when the receiver is already gone.
        let _ = tx.send(outcome);
    })?;
    let outcome = rx
        .recv()
        .context("dispatcher stopped without completing the request")?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if outcome.result_status == -1 {
        std::process::exit(1);
    }
    Ok(())
}

/// Split `NAME=VALUE` arguments into an ordered name→value mapping.
fn parse_overrides(args: &[String]) -> Result<IndexMap<String, String>> {
    let mut overrides = IndexMap::new();
    for arg in args {
        let (name, value) = arg
            .split_once('=')
            .with_context(|| format!("argument {arg:?} is not of the form NAME=VALUE"))?;
        overrides.insert(name.to_string(), value.to_string());
    }
    Ok(overrides)
}

/// Build the positional value vector for one action: supplied arguments
/// parsed per the parameter's kind, signature defaults for the rest.
fn argument_values(
    registration: &ActionRegistration,
    overrides: &IndexMap<String, String>,
) -> Result<Vec<Value>> {
    for name in overrides.keys() {
        if !registration.signature.iter().any(|p| p.name == *name) {
            anyhow::bail!("action {} has no parameter {name:?}", registration.id);
        }
    }
    registration
        .signature
        .iter()
        .map(|param| match overrides.get(&param.name) {
            Some(text) => parse_value(param, text),
            None => Ok(param.default.clone()),
        })
        .collect()
}

fn parse_value(param: &SignatureParam, text: &str) -> Result<Value> {
    let value = match param.kind {
        ParamKind::Integer => Value::from(text.parse::<i64>().with_context(|| {
            format!("parameter {} expects an integer, got {text:?}", param.name)
        })?),
        ParamKind::Number => Value::from(text.parse::<f64>().with_context(|| {
            format!("parameter {} expects a number, got {text:?}", param.name)
        })?),
        ParamKind::Boolean => Value::from(text.parse::<bool>().with_context(|| {
            format!("parameter {} expects true or false, got {text:?}", param.name)
        })?),
        ParamKind::String | ParamKind::File => Value::from(text),
    };
    Ok(value)
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
