//! MC-AIXI-CTW agent runner.
//!
//! The main entry point for aixi, handling:
//! - Running experiments and transfer runs against the reference environments
//! - Validating experiment files
//! - Showing configuration, presets and the experiment schema

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use aixi_common::{OutputFormat, SCHEMA_VERSION};
use aixi_config::{validate_experiment, ConfigSnapshot};
use aixi_core::config::{
    list_presets, load_config, ConfigError, ConfigOptions, ExperimentConfig, ResolvedConfig,
};
use aixi_core::environment::build_environment;
use aixi_core::exit_codes::ExitCode;
use aixi_core::experiment::{
    run_experiment, run_transfer, ExperimentError, ExperimentSummary, JsonlWriter, NullSink,
    TelemetrySink,
};
use aixi_core::log_event;
use aixi_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use clap::{Args, Parser, Subcommand};

/// MC-AIXI-CTW - a Monte-Carlo approximation of AIXI over a context-tree model
#[derive(Parser)]
#[command(name = "aixi")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Experiment file (TOML or JSON)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Built-in preset to use instead of an experiment file
    #[arg(long, global = true, conflicts_with = "config")]
    preset: Option<String>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an experiment (or a transfer run with --then)
    Run(RunArgs),

    /// Validate the experiment and build its environment
    Check,

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Second experiment: play the first, then this one, then the first again
    #[arg(long)]
    then: Option<PathBuf>,

    /// Override the RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the base cycle count
    #[arg(long)]
    cycles: Option<u64>,

    /// Override the per-search time budget (seconds)
    #[arg(long)]
    search_timeout: Option<f64>,

    /// Write one JSON line per cycle to this file
    #[arg(long)]
    telemetry: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved experiment
    Show,
    /// Print the JSON schema of experiment files
    Schema,
    /// List built-in presets
    Presets,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are not errors.
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    // Machine-readable stdout pairs with machine-readable stderr.
    let cli_format = cli.global.format.is_machine().then_some(LogFormat::Jsonl);
    init_logging(&LogConfig::from_env(cli_level, cli_format));

    let exit_code = match cli.command {
        None => run(&cli.global, &RunArgs::default()),
        Some(Commands::Run(args)) => run(&cli.global, &args),
        Some(Commands::Check) => run_check(&cli.global),
        Some(Commands::Config(args)) => run_config(&cli.global, &args),
        Some(Commands::Version) => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

fn config_options(global: &GlobalOpts) -> ConfigOptions {
    ConfigOptions {
        path: global.config.clone(),
        preset: global.preset.clone(),
    }
}

fn apply_overrides(experiment: &mut ExperimentConfig, args: &RunArgs) {
    if let Some(seed) = args.seed {
        experiment.seed = Some(seed);
    }
    if let Some(cycles) = args.cycles {
        experiment.schedule.total_cycles = cycles;
    }
    if let Some(secs) = args.search_timeout {
        experiment.agent.search_timeout_secs = secs;
    }
}

fn load_for_run(options: &ConfigOptions, args: &RunArgs) -> Result<ResolvedConfig, ConfigError> {
    let mut config = load_config(options)?;
    apply_overrides(&mut config.experiment, args);
    validate_experiment(&config.experiment)?;
    Ok(config)
}

fn open_sink(global: &GlobalOpts, args: &RunArgs) -> std::io::Result<Box<dyn TelemetrySink>> {
    match (&args.telemetry, global.format) {
        (Some(path), _) => {
            let file = File::create(path)?;
            Ok(Box::new(JsonlWriter::new(BufWriter::new(file))))
        }
        // JSONL output streams the cycle records themselves.
        (None, OutputFormat::Jsonl) => Ok(Box::new(JsonlWriter::new(std::io::stdout()))),
        (None, _) => Ok(Box::new(NullSink)),
    }
}

fn run(global: &GlobalOpts, args: &RunArgs) -> ExitCode {
    let config = match load_for_run(&config_options(global), args) {
        Ok(config) => config,
        Err(e) => return output_config_error(global, &e),
    };
    let second = match &args.then {
        Some(path) => {
            let options = ConfigOptions {
                path: Some(path.clone()),
                preset: None,
            };
            match load_for_run(&options, args) {
                Ok(config) => Some(config),
                Err(e) => return output_config_error(global, &e),
            }
        }
        None => None,
    };

    let log = LogContext::new(generate_run_id(), config.label());
    if config.is_default() {
        log_event!(
            log,
            INFO,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "no experiment file found, using built-in defaults"
        );
    } else {
        log_event!(
            log,
            INFO,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "experiment loaded",
            source = tracing::field::display(&config.resolved.source)
        );
    }

    let sink = match open_sink(global, args) {
        Ok(sink) => sink,
        Err(e) => {
            log_event!(
                log,
                ERROR,
                event_names::INTERNAL_ERROR,
                Stage::Init,
                "cannot open telemetry file",
                error = tracing::field::display(&e)
            );
            return output_run_error(global, &ExperimentError::Common(e.into()));
        }
    };

    let result = match &second {
        Some(second) => run_transfer(&config.experiment, &second.experiment, sink.as_ref(), &log),
        None => run_experiment(&config.experiment, sink.as_ref(), &log),
    };

    match result {
        Ok(summary) => {
            output_summary(global, &config.snapshot(), &summary);
            ExitCode::Clean
        }
        Err(e) => {
            log_event!(
                log,
                ERROR,
                event_names::INTERNAL_ERROR,
                Stage::Report,
                "run failed",
                code = e.code(),
                error = tracing::field::display(&e)
            );
            output_run_error(global, &e)
        }
    }
}

fn output_summary(global: &GlobalOpts, snapshot: &ConfigSnapshot, summary: &ExperimentSummary) {
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "ok",
                "config": snapshot,
                "summary": summary,
            });
            println!("{}", to_pretty(&response));
        }
        OutputFormat::Jsonl => {
            let line = serde_json::json!({ "summary": summary });
            println!("{}", line);
        }
        OutputFormat::Summary => {
            println!(
                "[{}] run: {} game(s), {} cycles, total reward {}, average {:.4}",
                summary.run_id,
                summary.games.len(),
                summary.lifetime,
                summary.total_reward,
                summary.average_reward
            );
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# aixi run {}", summary.run_id);
            println!();
            println!("| game | environment | cycles | episodes | avg reward | eval avg reward |");
            println!("|------|-------------|--------|----------|------------|-----------------|");
            for game in &summary.games {
                println!(
                    "| {} | {} | {} | {} | {:.4} | {:.4} |",
                    game.game,
                    game.environment,
                    game.cycles,
                    game.episodes,
                    game.average_reward,
                    game.evaluation_average_reward
                );
            }
            println!();
            println!("Total reward: {}", summary.total_reward);
            println!("Model nodes: {}", summary.model_nodes);
            println!("Config hash: {}", snapshot.content_hash);
        }
    }
}

fn output_run_error(global: &GlobalOpts, error: &ExperimentError) -> ExitCode {
    let exit_code = ExitCode::from(error);
    output_error(global, "run", error.code(), &error.to_string());
    exit_code
}

fn run_check(global: &GlobalOpts) -> ExitCode {
    let config = match load_config(&config_options(global)) {
        Ok(config) => config,
        Err(e) => return output_config_error(global, &e),
    };

    let mut checks = Vec::new();
    let mut all_ok = true;

    let params = config.experiment.agent_params();
    checks.push(match &params {
        Ok(params) => serde_json::json!({
            "check": "agent",
            "status": "ok",
            "bits_per_cycle": params.bits_per_cycle(),
        }),
        Err(e) => {
            all_ok = false;
            serde_json::json!({ "check": "agent", "status": "error", "error": e.to_string() })
        }
    });

    checks.push(match build_environment(&config.experiment.environment, Some(0)) {
        Ok(env) => serde_json::json!({
            "check": "environment",
            "status": "ok",
            "name": env.name(),
            "interface": env.interface(),
        }),
        Err(e) => {
            all_ok = false;
            serde_json::json!({
                "check": "environment",
                "status": "error",
                "error": e.to_string(),
                "remediation": e.remediation(),
            })
        }
    });

    let snapshot = config.snapshot();
    let response = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": if all_ok { "ok" } else { "error" },
        "source": snapshot.source,
        "path": snapshot.path,
        "checks": checks,
    });

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => println!("{}", to_pretty(&response)),
        OutputFormat::Summary => {
            let status = if all_ok { "OK" } else { "FAILED" };
            println!("check: {} ({})", status, config.label());
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# aixi check");
            println!();
            for check in &checks {
                let name = check.get("check").and_then(|v| v.as_str()).unwrap_or("?");
                let status = check.get("status").and_then(|v| v.as_str()).unwrap_or("?");
                let symbol = if status == "ok" { "✓" } else { "✗" };
                println!("{} {}: {}", symbol, name, status);
                if let Some(error) = check.get("error").and_then(|v| v.as_str()) {
                    println!("  Error: {}", error);
                }
            }
        }
    }

    if all_ok {
        ExitCode::Clean
    } else {
        ExitCode::ConfigError
    }
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    match &args.command {
        ConfigCommands::Show => run_config_show(global),
        ConfigCommands::Schema => {
            let schema = schemars::schema_for!(ExperimentConfig);
            println!("{}", to_pretty(&schema));
            ExitCode::Clean
        }
        ConfigCommands::Presets => {
            let presets = list_presets();
            match global.format {
                OutputFormat::Md | OutputFormat::Summary => {
                    for preset in &presets {
                        println!("{:<22} {}", preset.name.as_str(), preset.description);
                    }
                }
                OutputFormat::Exitcode => {}
                _ => {
                    let response = serde_json::json!({
                        "schema_version": SCHEMA_VERSION,
                        "presets": presets,
                    });
                    println!("{}", to_pretty(&response));
                }
            }
            ExitCode::Clean
        }
    }
}

/// Display the resolved experiment (including defaults if no file is present).
fn run_config_show(global: &GlobalOpts) -> ExitCode {
    let config = match load_config(&config_options(global)) {
        Ok(config) => config,
        Err(e) => return output_config_error(global, &e),
    };

    match global.format {
        OutputFormat::Md | OutputFormat::Summary => match toml::to_string_pretty(&config.experiment) {
            Ok(text) => {
                println!("# source: {}", config.resolved.source);
                print!("{}", text);
            }
            Err(e) => {
                output_error(global, "config show", 20, &e.to_string());
                return ExitCode::InternalError;
            }
        },
        OutputFormat::Exitcode => {}
        _ => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "snapshot": config.snapshot(),
                "experiment": config.experiment,
            });
            println!("{}", to_pretty(&response));
        }
    }
    ExitCode::Clean
}

/// Output a config error in the appropriate format.
fn output_config_error(global: &GlobalOpts, error: &ConfigError) -> ExitCode {
    let exit_code = ExitCode::from(error);
    output_error(global, "config", error.code(), &error.to_string());
    exit_code
}

fn output_error(global: &GlobalOpts, command: &str, code: u32, message: &str) {
    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "command": command,
                "error": {
                    "code": code,
                    "message": message,
                }
            });
            eprintln!("{}", to_pretty(&response));
        }
        OutputFormat::Summary => eprintln!("{} error [{}]: {}", command, code, message),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            eprintln!("# Error");
            eprintln!();
            eprintln!("{} [{}]: {}", command, code, message);
        }
    }
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "aixi_version": env!("CARGO_PKG_VERSION"),
        "config_schema_version": aixi_config::CONFIG_SCHEMA_VERSION,
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => println!("{}", to_pretty(&version_info)),
        OutputFormat::Exitcode => {}
        _ => {
            println!("aixi {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

fn to_pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        format!(r#"{{"error":"serialization_failed","message":"{}"}}"#, e)
    })
}
