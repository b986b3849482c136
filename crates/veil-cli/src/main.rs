// crates/veil-cli/src/main.rs
// ============================================================================
// Module: Veil CLI Entry Point
// Description: Command dispatcher for contract analysis, codegen, and sessions.
// Purpose: Provide a localized CLI over the schema extractor and runner.
// Dependencies: clap, tokio, thiserror, veil-config, veil-contract, veil-core
// ============================================================================

//! ## Overview
//! `veil` inspects a compiled contract module and either prints its schema,
//! emits typed wrappers, verifies committed wrappers, or opens an interactive
//! session against a deployed instance through a JSON-RPC gateway. All
//! user-facing strings are routed through the i18n catalog.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use thiserror::Error;
use veil_cli::gateway::GatewayConfig;
use veil_cli::gateway::GatewayHandle;
use veil_cli::i18n::Locale;
use veil_cli::i18n::set_locale;
use veil_cli::runner::Session;
use veil_cli::runner::TerminationReason;
use veil_cli::t;
use veil_config::LogSinkKind;
use veil_config::NetworkProfile;
use veil_config::VeilConfig;
use veil_core::ContractSchema;
use veil_core::FileSessionLogSink;
use veil_core::NoopSessionLogSink;
use veil_core::SessionEvent;
use veil_core::SessionEventKind;
use veil_core::SessionLogSink;
use veil_core::StderrSessionLogSink;
use veil_wrapper_gen::WrapperGenerator;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "VEIL_LANG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "veil", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `VEIL_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Contract location settings.
    #[command(flatten)]
    contract: ContractArgs,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the schema extracted from the contract module.
    Analyze(AnalyzeCommand),
    /// Write typed wrapper source for the contract.
    Generate(GenerateCommand),
    /// Verify committed wrapper source matches the contract.
    Check(CheckCommand),
    /// Open an interactive session against a deployed contract.
    Run(RunCommand),
}

/// Contract location inputs shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct ContractArgs {
    /// Optional config file path (defaults to veil.toml or `VEIL_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Contract build directory or module path (overrides config).
    #[arg(long = "contract-dir", value_name = "PATH", global = true)]
    contract_dir: Option<PathBuf>,
    /// Contract module name when several are present (overrides config).
    #[arg(long, value_name = "NAME", global = true)]
    contract: Option<String>,
}

/// Arguments for `analyze`.
#[derive(Args, Debug)]
struct AnalyzeCommand {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Arguments for `generate`.
#[derive(Args, Debug)]
struct GenerateCommand {
    /// Wrapper output path (overrides config).
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

/// Arguments for `check`.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Wrapper path to verify (overrides config).
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Network profile (overrides config).
    #[arg(long, value_enum, value_name = "PROFILE")]
    network: Option<NetworkArg>,
    /// Gateway JSON-RPC URL (overrides config and profile preset).
    #[arg(long, value_name = "URL")]
    gateway: Option<String>,
    /// Deployed contract address (overrides config).
    #[arg(long, value_name = "ADDRESS")]
    address: Option<String>,
}

/// Output formats for `analyze`.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Pretty JSON output.
    Json,
}

/// Network profile selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum NetworkArg {
    /// Fully local stack.
    Standalone,
    /// Local services against a local testnet node.
    TestnetLocal,
    /// Public testnet services.
    TestnetRemote,
}

impl From<NetworkArg> for NetworkProfile {
    fn from(value: NetworkArg) -> Self {
        match value {
            NetworkArg::Standalone => Self::Standalone,
            NetworkArg::TestnetLocal => Self::TestnetLocal,
            NetworkArg::TestnetRemote => Self::TestnetRemote,
        }
    }
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Catalan.
    Ca,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Ca => Self::Ca,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Analyze(command) => command_analyze(&cli.contract, &command),
        Commands::Generate(command) => command_generate(&cli.contract, &command),
        Commands::Check(command) => command_check(&cli.contract, &command),
        Commands::Run(command) => command_run(&cli.contract, command).await,
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Analyze
// ============================================================================

/// Prints the extracted schema as text or JSON.
fn command_analyze(args: &ContractArgs, command: &AnalyzeCommand) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let schema = extract_schema(&config)?;
    let output = match command.format {
        OutputFormat::Json => serde_json::to_string_pretty(&schema)
            .map_err(|err| CliError::new(t!("analyze.json_failed", error = err)))?,
        OutputFormat::Text => render_schema_text(&schema),
    };
    write_stdout_line(&output).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Renders the schema as localized text.
fn render_schema_text(schema: &ContractSchema) -> String {
    let mut lines = vec![
        t!("analyze.header", name = schema.name),
        t!(
            "analyze.summary",
            operations = schema.operations.len(),
            read_only = schema.read_only_count(),
            ledger = schema.ledger_fields.len(),
            witnesses = schema.witnesses.len()
        ),
        String::new(),
        t!("analyze.section.operations"),
    ];
    if schema.operations.is_empty() {
        lines.push(t!("analyze.none"));
    }
    for operation in &schema.operations {
        let params = operation
            .parameters
            .iter()
            .map(|parameter| format!("{}: {}", parameter.name, parameter.ty.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let mutability =
            if operation.mutates() { t!("analyze.mutating") } else { t!("analyze.read_only") };
        lines.push(t!(
            "analyze.operation",
            name = operation.name,
            params = params,
            returns = operation.return_type.as_str(),
            mutability = mutability
        ));
        lines.push(t!(
            "analyze.operation.description",
            description = operation.description_or_default()
        ));
    }
    lines.push(String::new());
    lines.push(t!("analyze.section.ledger"));
    if schema.ledger_fields.is_empty() {
        lines.push(t!("analyze.none"));
    }
    for (name, ty) in &schema.ledger_fields {
        lines.push(t!(
            "analyze.ledger_field",
            name = name,
            ty = ty.as_str(),
            kind = ty.kind().label()
        ));
    }
    lines.push(String::new());
    lines.push(t!("analyze.section.witnesses"));
    if schema.witnesses.is_empty() {
        lines.push(t!("analyze.none"));
    }
    for witness in &schema.witnesses {
        lines.push(t!(
            "analyze.witness",
            name = witness.name,
            ledger = witness.ledger_type.as_str(),
            private = witness.private_type.as_str()
        ));
    }
    lines.join("\n")
}

// ============================================================================
// SECTION: Wrapper Commands
// ============================================================================

/// Writes wrapper source and logs the generation event.
fn command_generate(args: &ContractArgs, command: &GenerateCommand) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let schema = extract_schema(&config)?;
    let output = command.out.clone().unwrap_or_else(|| config.wrapper.output.clone());
    WrapperGenerator::new(&schema)
        .generate(&output)
        .map_err(|err| CliError::new(t!("generate.failed", error = err)))?;
    let sink = build_sink(&config)?;
    sink.record(&SessionEvent::new(SessionEventKind::WrapperGenerated {
        contract: schema.name.clone(),
        output: output.display().to_string(),
        operations: schema.operations.len(),
    }));
    write_stdout_line(&t!(
        "generate.written",
        count = schema.operations.len(),
        contract = schema.name,
        path = output.display()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Verifies committed wrapper source against a fresh rendering.
fn command_check(args: &ContractArgs, command: &CheckCommand) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let schema = extract_schema(&config)?;
    let output = command.out.clone().unwrap_or_else(|| config.wrapper.output.clone());
    WrapperGenerator::new(&schema)
        .check(&output)
        .map_err(|err| CliError::new(t!("check.failed", error = err)))?;
    write_stdout_line(&t!("check.ok", path = output.display()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Run
// ============================================================================

/// Opens an interactive session over stdin and stdout.
async fn command_run(args: &ContractArgs, command: RunCommand) -> CliResult<ExitCode> {
    let mut config = load_config(args)?;
    if let Some(network) = command.network {
        config.network.profile = network.into();
    }
    if let Some(gateway) = command.gateway {
        config.network.gateway_url = Some(gateway);
    }
    if let Some(address) = command.address {
        config.network.contract_address = Some(address);
    }
    validate_config(&mut config)?;
    let address = config
        .network
        .contract_address
        .clone()
        .ok_or_else(|| CliError::new(t!("run.address_missing")))?;
    let schema = extract_schema(&config)?;

    let profile = config.network.profile;
    let endpoints = profile.endpoints();
    let url = config.gateway_url();
    write_stdout_line(&t!(
        "run.network",
        profile = profile.as_str(),
        node = endpoints.node,
        indexer = endpoints.indexer,
        proof_server = endpoints.proof_server
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line(&t!("run.gateway", url = url, address = address))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;

    let handle = GatewayHandle::new(GatewayConfig {
        endpoint: url,
        contract_address: address,
        connect_timeout: config.network.connect_timeout(),
        request_timeout: config.network.request_timeout(),
    })
    .map_err(|err| CliError::new(t!("run.gateway_failed", error = err)))?;
    let sink = build_sink(&config)?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let session = Session::new(&schema, &handle, sink.as_ref(), stdin.lock(), stdout.lock());
    let summary =
        session.run().await.map_err(|err| CliError::new(t!("run.io_failed", error = err)))?;
    write_stdout_line(&t!(
        "run.summary",
        reason = summary.reason,
        attempted = summary.attempted,
        failures = summary.failures
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    if summary.reason == TerminationReason::ConnectionLost {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Helpers
// ============================================================================

/// Loads configuration and applies contract location overrides.
fn load_config(args: &ContractArgs) -> CliResult<VeilConfig> {
    let mut config = VeilConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    if let Some(dir) = &args.contract_dir {
        config.contract.build_dir.clone_from(dir);
    }
    if let Some(name) = &args.contract {
        config.contract.name = Some(name.clone());
    }
    validate_config(&mut config)?;
    Ok(config)
}

/// Re-validates configuration after command-line overrides.
fn validate_config(config: &mut VeilConfig) -> CliResult<()> {
    config.validate().map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Extracts the schema for the configured contract.
fn extract_schema(config: &VeilConfig) -> CliResult<ContractSchema> {
    veil_contract::extract(&config.contract.build_dir, config.contract.name.as_deref())
        .map_err(|err| CliError::new(t!("extract.failed", error = err)))
}

/// Builds the configured session log sink.
fn build_sink(config: &VeilConfig) -> CliResult<Box<dyn SessionLogSink>> {
    match config.logging.sink {
        LogSinkKind::Stderr => Ok(Box::new(StderrSessionLogSink)),
        LogSinkKind::None => Ok(Box::new(NoopSessionLogSink)),
        LogSinkKind::File => {
            let path = config.log_path();
            let sink = open_file_sink(&path).map_err(|err| {
                CliError::new(t!("log.open_failed", path = path.display(), error = err))
            })?;
            Ok(Box::new(sink))
        }
    }
}

/// Opens an append-only log file, creating its parent directory.
fn open_file_sink(path: &Path) -> std::io::Result<FileSessionLogSink> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    FileSessionLogSink::new(path)
}

/// Resolves the CLI locale from flags or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
