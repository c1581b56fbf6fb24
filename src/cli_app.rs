//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{ArgGroup, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use deadlock_analyzer::analysis::detector::DeadlockDetector;
use deadlock_analyzer::analysis::safety::{SafetyChecker, SafetyVerdict};
use deadlock_analyzer::core::config::{Config, OutputFormat};
use deadlock_analyzer::core::errors::DlaError;
use deadlock_analyzer::engine::trace::Tee;
use deadlock_analyzer::logger::jsonl::{JsonlConfig, JsonlWriter};
use deadlock_analyzer::logger::text::TextTrace;
use deadlock_analyzer::model::matrix::ResourceMatrix;
use deadlock_analyzer::model::resources;
use deadlock_analyzer::model::scenario::{BUILTIN_SCENARIOS, Scenario};
use deadlock_analyzer::model::{format_sequence, process_label};

/// Deadlock Analyzer: deadlock detection and Banker's safety checks.
#[derive(Debug, Parser)]
#[command(
    name = "dla",
    author,
    version,
    about = "Deadlock Analyzer - resource allocation graph checks",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Narrate every scan round on stderr.
    #[arg(long, global = true)]
    trace: bool,
    /// Append scan events as JSON lines to this file.
    #[arg(long, global = true, value_name = "PATH")]
    trace_jsonl: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Detect deadlocked processes from outstanding requests.
    Detect(ScenarioArgs),
    /// Check whether a state is safe (Banker's algorithm).
    Safety(ScenarioArgs),
    /// Show derived quantities: total resources, availability, need.
    Inspect(ScenarioArgs),
    /// List built-in scenarios.
    Scenarios,
    /// View and validate configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
    /// Show version.
    Version,
}

#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["scenario", "builtin"])))]
struct ScenarioArgs {
    /// Scenario file (.toml, or .json).
    #[arg(value_name = "SCENARIO")]
    scenario: Option<PathBuf>,
    /// Use a built-in scenario (see `dla scenarios`).
    #[arg(long, value_name = "NAME")]
    builtin: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input (bad scenario, bad config, unknown built-in).
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// The analysis ran and the answer is negative (deadlock or unsafe).
    #[error("{0}")]
    Verdict(String),
    /// Internal failure, e.g. rendering the config back to TOML.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
            Self::Verdict(_) => 4,
        }
    }
}

impl From<DlaError> for CliError {
    fn from(value: DlaError) -> Self {
        match value {
            DlaError::Serialization { .. } => Self::Internal(value.to_string()),
            _ if value.is_input_error() => Self::User(value.to_string()),
            _ => Self::Runtime(value.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Detect(args) => run_detect(cli, args),
        Command::Safety(args) => run_safety(cli, args),
        Command::Inspect(args) => run_inspect(cli, args),
        Command::Scenarios => run_scenarios(cli),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
        Command::Version => emit_version(cli),
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let config = Config::load(cli.config.as_deref())?;
    if !config.output.color {
        control::set_override(false);
    }
    Ok(config)
}

fn load_scenario(args: &ScenarioArgs, config: &Config) -> Result<Scenario, CliError> {
    let scenario = match (&args.scenario, &args.builtin) {
        (Some(path), _) => Scenario::load(path)?,
        (None, Some(name)) => Scenario::builtin(name).ok_or_else(|| {
            let known: Vec<&str> = BUILTIN_SCENARIOS.iter().map(|(name, _)| *name).collect();
            CliError::User(format!(
                "unknown built-in scenario {name:?}; expected one of: {}",
                known.join(", ")
            ))
        })?,
        (None, None) => {
            return Err(CliError::User(
                "specify a scenario file or --builtin <NAME>".to_string(),
            ));
        }
    };
    scenario.check_limits(&config.limits)?;
    Ok(scenario)
}

type TraceSinks = Tee<Option<TextTrace<io::Stderr>>, Option<JsonlWriter>>;

fn open_trace(cli: &Cli, config: &Config, run: String) -> TraceSinks {
    let text = (cli.trace || config.trace.enabled).then(|| TextTrace::new(io::stderr()));
    let jsonl = cli
        .trace_jsonl
        .clone()
        .or_else(|| config.trace.jsonl_path.clone())
        .map(|path| {
            JsonlWriter::open(
                JsonlConfig {
                    path,
                    fallback_path: config.trace.jsonl_fallback_path.clone(),
                },
                run,
            )
        });
    Tee(text, jsonl)
}

fn run_detect(cli: &Cli, args: &ScenarioArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let scenario = load_scenario(args, &config)?;
    let available = scenario.resolve_available()?;
    let request = scenario.request()?;

    let mut trace = open_trace(cli, &config, format!("detect:{}", scenario.name));
    let report = DeadlockDetector::with_trace(&mut trace).detect(
        request,
        &scenario.allocation,
        &available,
    )?;
    drop(trace);

    match output_mode(cli, &config) {
        OutputMode::Human => {
            println!("scenario: {}", scenario.name);
            println!("available: {available}");
            if !report.completion_order.is_empty() {
                println!(
                    "completion order: {}",
                    format_sequence(&report.completion_order)
                );
            }
            if report.is_deadlock_free() {
                println!(
                    "{} all {} processes can complete",
                    "NO DEADLOCK:".green().bold(),
                    scenario.processes()
                );
            } else {
                println!(
                    "{} {} deadlocked",
                    "DEADLOCK:".red().bold(),
                    label_list(&report.deadlocked)
                );
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "detect",
                "scenario": scenario.name,
                "available": available,
                "deadlock": !report.is_deadlock_free(),
                "deadlocked": labeled(&report.deadlocked),
                "completion_order": labeled(&report.completion_order),
                "final_work": report.final_work,
            });
            write_json_line(&payload)?;
        }
    }

    if report.is_deadlock_free() {
        Ok(())
    } else {
        Err(CliError::Verdict(format!(
            "deadlock detected: {} of {} processes blocked",
            report.deadlocked.len(),
            scenario.processes()
        )))
    }
}

fn run_safety(cli: &Cli, args: &ScenarioArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let scenario = load_scenario(args, &config)?;
    let available = scenario.resolve_available()?;
    let max = scenario.max()?;
    let need = resources::need(max, &scenario.allocation)?;

    let mut trace = open_trace(cli, &config, format!("safety:{}", scenario.name));
    let verdict =
        SafetyChecker::with_trace(&mut trace).check(&available, max, &scenario.allocation)?;
    drop(trace);

    match output_mode(cli, &config) {
        OutputMode::Human => {
            println!("scenario: {}", scenario.name);
            println!("available: {available}");
            print_matrix("need", &need);
            match &verdict {
                SafetyVerdict::Safe { sequence } => {
                    println!("{} {}", "SAFE:".green().bold(), format_sequence(sequence));
                }
                SafetyVerdict::Unsafe { blocked } => {
                    println!(
                        "{} {} cannot finish",
                        "UNSAFE:".red().bold(),
                        label_list(blocked)
                    );
                }
            }
        }
        OutputMode::Json => {
            let blocked = match &verdict {
                SafetyVerdict::Safe { .. } => Value::Null,
                SafetyVerdict::Unsafe { blocked } => labeled(blocked),
            };
            let payload = json!({
                "command": "safety",
                "scenario": scenario.name,
                "available": available,
                "need": need,
                "safe": verdict.is_safe(),
                "sequence": verdict.safe_sequence().map(labeled),
                "blocked": blocked,
            });
            write_json_line(&payload)?;
        }
    }

    match verdict {
        SafetyVerdict::Safe { .. } => Ok(()),
        SafetyVerdict::Unsafe { blocked } => Err(CliError::Verdict(format!(
            "unsafe state: {} of {} processes cannot finish",
            blocked.len(),
            scenario.processes()
        ))),
    }
}

fn run_inspect(cli: &Cli, args: &ScenarioArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let scenario = load_scenario(args, &config)?;
    let total = scenario.total_resources()?;
    let available = scenario.resolve_available()?;
    let need = scenario
        .max
        .as_ref()
        .map(|max| resources::need(max, &scenario.allocation))
        .transpose()?;
    if let Some(request) = &scenario.request {
        request.ensure_shape(
            scenario.processes(),
            available.len(),
            "request vs allocation",
        )?;
    }

    match output_mode(cli, &config) {
        OutputMode::Human => {
            println!("scenario: {}", scenario.name);
            if let Some(description) = &scenario.description {
                println!("  {description}");
            }
            println!(
                "processes: {}, resource types: {}",
                scenario.processes(),
                available.len()
            );
            println!("total resources: {total}");
            println!("available: {available}");
            print_matrix("allocation", &scenario.allocation);
            if let Some(request) = &scenario.request {
                print_matrix("request", request);
            }
            if let Some(need) = &need {
                print_matrix("need", need);
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "inspect",
                "scenario": scenario.name,
                "processes": scenario.processes(),
                "resource_types": available.len(),
                "total_resources": total,
                "available": available,
                "allocation": scenario.allocation,
                "request": scenario.request,
                "need": need,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_scenarios(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    match output_mode(cli, &config) {
        OutputMode::Human => {
            for (name, description) in BUILTIN_SCENARIOS {
                println!("{:<20} {description}", name.bold());
            }
        }
        OutputMode::Json => {
            let scenarios: Vec<Value> = BUILTIN_SCENARIOS
                .iter()
                .map(|(name, description)| json!({ "name": name, "description": description }))
                .collect();
            write_json_line(&json!({ "command": "scenarios", "scenarios": scenarios }))?;
        }
    }
    Ok(())
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode_without_file(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;

            match output_mode(cli, &config) {
                OutputMode::Human => {
                    println!("{}", config.to_toml_string()?);
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                match output_mode(cli, &config) {
                    OutputMode::Human => println!("Configuration is valid."),
                    OutputMode::Json => write_json_line(&json!({
                        "command": "config validate",
                        "valid": true,
                    }))?,
                }
                Ok(())
            }
            Err(error) => {
                if output_mode_without_file(cli) == OutputMode::Json {
                    write_json_line(&json!({
                        "command": "config validate",
                        "valid": false,
                        "code": error.code(),
                        "error": error.to_string(),
                    }))?;
                }
                Err(error.into())
            }
        },
    }
}

fn emit_version(cli: &Cli) -> Result<(), CliError> {
    let version = env!("CARGO_PKG_VERSION");
    match output_mode_without_file(cli) {
        OutputMode::Human => println!("dla {version}"),
        OutputMode::Json => write_json_line(&json!({
            "binary": "dla",
            "package": env!("CARGO_PKG_NAME"),
            "version": version,
        }))?,
    }
    Ok(())
}

fn print_matrix(title: &str, matrix: &ResourceMatrix) {
    println!("{title}:");
    for (process, row) in matrix.rows().enumerate() {
        let cells: Vec<String> = row.iter().map(u64::to_string).collect();
        println!("  {:<4} [{}]", process_label(process), cells.join(", "));
    }
}

fn label_list(processes: &[usize]) -> String {
    processes
        .iter()
        .map(|&p| process_label(p))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 0-based `index` next to the 1-based display `label`.
fn labeled(processes: &[usize]) -> Value {
    processes
        .iter()
        .map(|&p| json!({ "index": p, "label": process_label(p) }))
        .collect::<Vec<_>>()
        .into()
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

/// Output mode for commands that never read the config file. Env overrides
/// still apply; a malformed env value falls back to defaults here and is
/// reported by the commands that load the full config.
fn output_mode_without_file(cli: &Cli) -> OutputMode {
    let config = Config::defaults_with_env().unwrap_or_default();
    output_mode(cli, &config)
}

fn output_mode(cli: &Cli, config: &Config) -> OutputMode {
    resolve_output_mode(cli.json, config.output.format, io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, format: OutputFormat, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    match format {
        OutputFormat::Json => OutputMode::Json,
        OutputFormat::Human => OutputMode::Human,
        OutputFormat::Auto if stdout_is_tty => OutputMode::Human,
        OutputFormat::Auto => OutputMode::Json,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn output_mode_resolution_honors_precedence() {
        assert_eq!(
            resolve_output_mode(true, OutputFormat::Human, true),
            OutputMode::Json
        );
        assert_eq!(
            resolve_output_mode(false, OutputFormat::Human, false),
            OutputMode::Human
        );
        assert_eq!(
            resolve_output_mode(false, OutputFormat::Json, true),
            OutputMode::Json
        );
        assert_eq!(
            resolve_output_mode(false, OutputFormat::Auto, true),
            OutputMode::Human
        );
        assert_eq!(
            resolve_output_mode(false, OutputFormat::Auto, false),
            OutputMode::Json
        );
    }

    #[test]
    fn exit_codes_are_distinct_per_class() {
        assert_eq!(CliError::User(String::new()).exit_code(), 1);
        assert_eq!(CliError::Runtime(String::new()).exit_code(), 2);
        assert_eq!(CliError::Verdict(String::new()).exit_code(), 4);
    }

    #[test]
    fn domain_errors_map_to_user_errors() {
        let err: CliError = DlaError::InvalidDemand {
            process: 0,
            resource: 0,
            max: 0,
            allocated: 1,
        }
        .into();
        assert_eq!(err.exit_code(), 1);

        let err: CliError = DlaError::io("/x", io::Error::other("disk")).into();
        assert_eq!(err.exit_code(), 2);

        let err: CliError = DlaError::Serialization {
            context: "config toml",
            details: String::new(),
        }
        .into();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn scenario_source_is_required() {
        let result = Cli::try_parse_from(["dla", "detect"]);
        assert!(result.is_err());
        let cli = Cli::try_parse_from(["dla", "detect", "--builtin", "graph-deadlock"]).unwrap();
        assert!(matches!(cli.command, Command::Detect(_)));
    }

    #[test]
    fn labeled_pairs_index_with_label() {
        assert_eq!(
            labeled(&[2, 3]),
            json!([{ "index": 2, "label": "P3" }, { "index": 3, "label": "P4" }])
        );
    }
}
