//! shade - rewrite lighten()/darken() calls in stylesheets
//!
//! Reads stylesheets (files or stdin), replaces every resolvable
//! `lighten(color, N%)` / `darken(color, N%)` call with an
//! `hsla(h, s%, l%, 1)` literal, and writes the result.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{debug, info, warn};

use shade_core::{Config, LogLevel, Processor, Warning, logging};

/// shade - rewrite lighten()/darken() calls into hsla() literals
#[derive(Parser, Debug)]
#[command(name = "shade", version, about, long_about = None)]
struct Args {
    /// Stylesheets to process ("-" or nothing reads stdin)
    inputs: Vec<PathBuf>,

    /// Write the result to this file instead of stdout (single input only)
    #[arg(short, long, conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Overwrite each input file with its result
    #[arg(long)]
    in_place: bool,

    /// Rewrite a single declaration value and print it
    #[arg(short, long, value_name = "VALUE", conflicts_with_all = ["inputs", "output", "in_place"])]
    eval: Option<String>,

    /// Path to the configuration file (uses XDG lookup if not specified)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Diagnostic verbosity (silent, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// How warnings are printed on stderr
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    message_format: MessageFormat,

    /// Exit with a non-zero status if any warning was produced
    #[arg(long)]
    deny_warnings: bool,

    /// Print example configuration and exit
    #[arg(long)]
    print_example_config: bool,

    /// Validate configuration and exit (returns non-zero on errors)
    #[arg(long)]
    check_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// `file:line:column: message`
    Human,
    /// One JSON object per line
    Json,
}

/// A warning tagged with the input it came from, for `--message-format json`.
#[derive(Serialize)]
struct WarningRecord<'a> {
    file: &'a str,
    #[serde(flatten)]
    warning: &'a Warning,
}

/// Where a stylesheet is read from.
enum Input<'a> {
    Stdin,
    File(&'a Path),
}

impl Input<'_> {
    fn label(&self) -> String {
        match self {
            Input::Stdin => "<stdin>".to_string(),
            Input::File(path) => path.display().to_string(),
        }
    }

    fn read(&self) -> anyhow::Result<String> {
        match self {
            Input::Stdin => {
                let mut css = String::new();
                io::stdin()
                    .read_to_string(&mut css)
                    .context("failed to read stdin")?;
                Ok(css)
            }
            Input::File(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display())),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // --print-example-config: print the example config with comments
    if args.print_example_config {
        print!("{}", shade_core::config::DEFAULT_CONFIG_TOML);
        return ExitCode::SUCCESS;
    }

    // If --config is specified, it must exist and be valid (no fallback)
    let load_result = match Config::find_and_load(args.config.as_deref()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = load_result.config;

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let level = args
        .log_level
        .unwrap_or_else(|| config.log_level())
        .raised(args.verbose);
    logging::init(level);

    if let Some(ref source) = load_result.source {
        info!("Loaded configuration from {:?}", source);
    } else if load_result.used_defaults {
        debug!("Using default configuration (no config file found)");
    }

    // --check-config: just validate and exit
    if args.check_config {
        if let Some(ref source) = load_result.source {
            println!("Configuration valid: {}", source.display());
        } else {
            println!("Configuration valid (using defaults)");
        }
        return ExitCode::SUCCESS;
    }

    let processor = Processor::new(&config);

    match run(&args, &processor) {
        Ok(warnings) if warnings > 0 && args.deny_warnings => {
            eprintln!("Error: {} warning(s) emitted with --deny-warnings", warnings);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Process every input and return the number of warnings emitted.
fn run(args: &Args, processor: &Processor) -> anyhow::Result<usize> {
    if let Some(ref value) = args.eval {
        return eval(args.message_format, processor, value);
    }

    let inputs: Vec<Input<'_>> = if args.inputs.is_empty() {
        vec![Input::Stdin]
    } else {
        args.inputs
            .iter()
            .map(|path| {
                if path.as_os_str() == "-" {
                    Input::Stdin
                } else {
                    Input::File(path)
                }
            })
            .collect()
    };

    if args.output.is_some() && inputs.len() > 1 {
        bail!("--output can only be used with a single input");
    }
    if args.in_place && inputs.iter().any(|input| matches!(input, Input::Stdin)) {
        bail!("--in-place cannot be used when reading stdin");
    }

    let mut total_warnings = 0;

    for input in &inputs {
        let label = input.label();
        let css = input.read()?;
        let processed = processor.process(&css);
        debug!(
            "{}: {} bytes in, {} bytes out",
            label,
            css.len(),
            processed.css.len()
        );

        report_warnings(args.message_format, &label, &processed.warnings)?;
        total_warnings += processed.warnings.len();

        match (input, &args.output) {
            (Input::File(path), _) if args.in_place => {
                if processed.css != css {
                    std::fs::write(path, &processed.css)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("Rewrote {}", path.display());
                }
            }
            (_, Some(output)) => std::fs::write(output, &processed.css)
                .with_context(|| format!("failed to write {}", output.display()))?,
            _ => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(processed.css.as_bytes())
                    .context("failed to write stdout")?;
                stdout.flush().context("failed to write stdout")?;
            }
        }
    }

    Ok(total_warnings)
}

/// Handle `--eval`: rewrite one value and print it.
fn eval(format: MessageFormat, processor: &Processor, value: &str) -> anyhow::Result<usize> {
    let result = processor.rewrite_declaration(value);

    let warnings: Vec<Warning> = result
        .diagnostics
        .iter()
        .map(|diagnostic| Warning {
            line: 1,
            column: 1,
            property: String::new(),
            message: diagnostic.to_string(),
        })
        .collect();
    report_warnings(format, "<eval>", &warnings)?;

    println!("{}", result.value);
    Ok(warnings.len())
}

fn report_warnings(format: MessageFormat, label: &str, warnings: &[Warning]) -> anyhow::Result<()> {
    for warning in warnings {
        match format {
            // Subject to the configured log level
            MessageFormat::Human => warn!(
                "{}:{}:{}: {}",
                label, warning.line, warning.column, warning.message
            ),
            MessageFormat::Json => {
                let record = WarningRecord {
                    file: label,
                    warning,
                };
                eprintln!("{}", serde_json::to_string(&record)?);
            }
        }
    }
    Ok(())
}
