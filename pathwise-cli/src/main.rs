//! pathwise - resolve and complete command lines against a manifest.
//!
//! ```bash
//! pathwise --manifest commands.toml resolve give Steve diamond 5
//! pathwise --manifest commands.toml --json suggest "give Steve "
//! pathwise --manifest commands.toml tree give
//! ```
//!
//! Exit codes: 0 on success, 1 when the line does not dispatch (or an unknown
//! command is named), 2 when the manifest or config cannot be loaded.

mod manifest;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pathwise::{
    ArgumentInput, Command, ConsoleSource, DispatchConfig, DispatchError, Dispatcher,
    PermissionedSource, Resolution, Source, Value,
};
use serde_json::json;
use tracing::{debug, info};

use crate::manifest::Manifest;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command manifest (TOML).
    #[arg(short, long, global = true, default_value = "commands.toml")]
    manifest: PathBuf,

    /// Dispatch config. Defaults to `pathwise.toml` next to the manifest if present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Act as a named source holding only the `--grant`ed permissions
    /// instead of the console.
    #[arg(long, global = true)]
    source: Option<String>,

    /// Permission granted to `--source` (repeatable, `node.*` allowed).
    #[arg(long = "grant", global = true)]
    grants: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Match a line and print the bound values.
    Resolve {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },
    /// Completion candidates for the last token (quote the line to keep a trailing space).
    Suggest {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },
    /// Draw the pathway tree of one command, or of all.
    Tree { command: Option<String> },
    /// List usage lines of one command, or of all.
    Usages { command: Option<String> },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    let dispatcher = match load(&cli) {
        Ok(dispatcher) => dispatcher,
        Err(err) => {
            eprintln!("error: {:#}", err);
            return ExitCode::from(2);
        }
    };

    let source: Box<dyn Source> = match &cli.source {
        Some(name) => Box::new(
            cli.grants
                .iter()
                .fold(PermissionedSource::new(name), |s, g| s.grant(g)),
        ),
        None => Box::new(ConsoleSource),
    };

    let outcome = match &cli.command {
        Commands::Resolve { line } => resolve(&cli, &dispatcher, source.as_ref(), &line.join(" ")),
        Commands::Suggest { line } => suggest(&cli, &dispatcher, source.as_ref(), &line.join(" ")),
        Commands::Tree { command } => tree(&cli, &dispatcher, command.as_deref()),
        Commands::Usages { command } => usages(&cli, &dispatcher, command.as_deref()),
    };
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

fn load(cli: &Cli) -> Result<Dispatcher> {
    let config = match &cli.config {
        Some(path) => {
            if !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            DispatchConfig::load_from_path(path)
        }
        None => cli
            .manifest
            .parent()
            .map(DispatchConfig::load)
            .unwrap_or_default(),
    };
    debug!(?config, "dispatch config");

    let manifest = Manifest::load(&cli.manifest)
        .with_context(|| format!("failed to load manifest {}", cli.manifest.display()))?;
    let dispatcher = manifest
        .into_dispatcher(config)
        .context("failed to register manifest commands")?;
    info!(commands = dispatcher.commands().len(), "dispatcher ready");
    Ok(dispatcher)
}

fn resolve(
    cli: &Cli,
    dispatcher: &Dispatcher,
    source: &dyn Source,
    line: &str,
) -> Result<bool> {
    let input = ArgumentInput::split(line);
    match dispatcher.dispatch(source, &input) {
        Ok(resolution) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
            } else {
                print_resolution(&resolution);
            }
            Ok(true)
        }
        Err(err) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&json!({ "error": err }))?);
            }
            eprintln!("{}", describe_failure(&err));
            Ok(false)
        }
    }
}

fn print_resolution(resolution: &Resolution) {
    println!("{}", resolution.usage());
    if let Some(handler) = resolution.handler() {
        println!("  handler: {}", handler);
    }
    for argument in resolution.arguments.iter() {
        let value = argument
            .value
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_else(|| "-".to_string());
        let marker = if argument.defaulted { " (default)" } else { "" };
        println!("  {} = {}{}", argument.name, value, marker);
    }
    for flag in resolution.arguments.flags() {
        let value = flag
            .value
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_else(|| "-".to_string());
        println!("  --{} = {}", flag.name, value);
    }
}

fn describe_failure(err: &DispatchError) -> String {
    let mut out = format!("error: {}", err);
    if let DispatchError::Match(failure) = err {
        for usage in failure.closest_usages().iter().skip(1) {
            out.push_str("\n  also: ");
            out.push_str(usage);
        }
    }
    out
}

fn suggest(
    cli: &Cli,
    dispatcher: &Dispatcher,
    source: &dyn Source,
    line: &str,
) -> Result<bool> {
    let candidates = dispatcher.suggest(source, &ArgumentInput::split(line));
    if cli.json {
        println!("{}", serde_json::to_string(&candidates)?);
    } else {
        for candidate in &candidates {
            println!("{}", candidate);
        }
    }
    Ok(true)
}

fn selected<'d>(dispatcher: &'d Dispatcher, label: Option<&str>) -> Result<Vec<&'d Command>> {
    match label {
        Some(label) => match dispatcher.command(label) {
            Some(command) => Ok(vec![command]),
            None => bail!("unknown command '{}'", label),
        },
        None => Ok(dispatcher.commands().iter().collect()),
    }
}

fn tree(cli: &Cli, dispatcher: &Dispatcher, label: Option<&str>) -> Result<bool> {
    let commands = selected(dispatcher, label)?;
    if cli.json {
        let trees: Vec<_> = commands
            .iter()
            .map(|c| json!({ "command": c.name(), "tree": c.tree().render() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&trees)?);
    } else {
        for command in commands {
            print!("{}", command.tree().render());
        }
    }
    Ok(true)
}

fn usages(cli: &Cli, dispatcher: &Dispatcher, label: Option<&str>) -> Result<bool> {
    let commands = selected(dispatcher, label)?;
    let lines: Vec<String> = commands.iter().flat_map(|c| c.usages()).collect();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        for line in lines {
            println!("{}", line);
        }
    }
    Ok(true)
}
