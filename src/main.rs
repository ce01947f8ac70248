// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{error, warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand, Args};
use clap_complete::{generate, Shell};

use sqlshift::app_config::{self, Config, ModelProvider, TargetKind};
use sqlshift::app_controller::Controller;
use sqlshift::dialects::SqlDialect;

/// CLI Wrapper for ModelProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliModelProvider {
    Anthropic,
    Ollama,
}

impl From<CliModelProvider> for ModelProvider {
    fn from(cli_provider: CliModelProvider) -> Self {
        match cli_provider {
            CliModelProvider::Anthropic => ModelProvider::Anthropic,
            CliModelProvider::Ollama => ModelProvider::Ollama,
        }
    }
}

/// CLI Wrapper for TargetKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTarget {
    Snowflake,
    Sqlite,
}

impl From<CliTarget> for TargetKind {
    fn from(cli_target: CliTarget) -> Self {
        match cli_target {
            CliTarget::Snowflake => TargetKind::Snowflake,
            CliTarget::Sqlite => TargetKind::Sqlite,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert scripts and create them in the target database (default command)
    Convert(ConvertArgs),

    /// Check that the model provider and the target database are reachable
    Check(SettingsArgs),

    /// Generate shell completions for sqlshift
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Settings shared by every command that talks to a provider or a database
#[derive(Args, Debug, Clone)]
struct SettingsArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Model provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliModelProvider>,

    /// Model name to use
    #[arg(short, long)]
    model: Option<String>,

    /// Dialect of the input scripts (e.g. 'sqlserver', 'oracle')
    #[arg(short, long)]
    source_dialect: Option<SqlDialect>,

    /// Dialect of the target database (e.g. 'snowflake')
    #[arg(short, long)]
    target_dialect: Option<SqlDialect>,

    /// Target database to create procedures in
    #[arg(long, value_enum)]
    target: Option<CliTarget>,

    /// SQLite database file when the target is sqlite
    #[arg(long)]
    sqlite_path: Option<String>,

    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Snowflake SQL API token
    #[arg(long, env = "SNOWFLAKE_TOKEN", hide_env_values = true)]
    snowflake_token: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Input .sql files or directories to process
    #[arg(value_name = "INPUT_PATH", required = true)]
    input_paths: Vec<PathBuf>,

    /// Directory for the archive and the run report
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    #[command(flatten)]
    settings: SettingsArgs,
}

/// sqlshift - SQL dialect conversion with AI
///
/// Converts stored procedure scripts from one SQL dialect to another with an
/// AI model, creates them in the target database, and packages the converted
/// scripts in a zip archive.
#[derive(Parser, Debug)]
#[command(name = "sqlshift")]
#[command(version)]
#[command(about = "AI-assisted SQL dialect conversion")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "sqlshift converts SQL scripts to another dialect with an AI model and creates them in the target database.

A script rejected by the database is sent back to the model once, together with
the database error, and the corrected script is submitted again.

EXAMPLES:
    sqlshift procs/                              # Convert every .sql file under procs/
    sqlshift -s oracle -t snowflake load.sql     # Choose the dialects
    sqlshift --target sqlite --sqlite-path t.db a.sql   # Try conversions locally
    sqlshift -p ollama -m llama3.1 procs/        # Use a local model
    sqlshift check                               # Test provider and database
    sqlshift completions bash > sqlshift.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. Secrets can be passed with ANTHROPIC_API_KEY
    and SNOWFLAKE_TOKEN.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input .sql files or directories to process
    #[arg(value_name = "INPUT_PATH")]
    input_paths: Vec<PathBuf>,

    /// Directory for the archive and the run report
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    #[command(flatten)]
    settings: SettingsArgs,
}

// @struct: Custom logger implementation, filtered by the global max level
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() {
    // Initialize the logger once with info level by default
    // The level is updated after loading the config
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "sqlshift", &mut std::io::stdout());
            Ok(true)
        }
        Some(Commands::Check(settings)) => run_check(settings).await.map(|_| true),
        Some(Commands::Convert(args)) => run_convert(args).await,
        None if cli.input_paths.is_empty() => {
            Err(anyhow!("INPUT_PATH is required when no subcommand is specified"))
        }
        None => {
            // Default behavior - top-level args are a convert command
            let args = ConvertArgs {
                input_paths: cli.input_paths,
                output_dir: cli.output_dir,
                settings: cli.settings,
            };
            run_convert(args).await
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

/// Convert a batch; `Ok(false)` when the batch was aborted
async fn run_convert(args: ConvertArgs) -> Result<bool> {
    let config = load_config(&args.settings)?;
    let controller = Controller::with_config(config)?;

    let (report, _outputs) = controller.run(&args.input_paths, &args.output_dir).await?;
    Ok(!report.is_aborted())
}

async fn run_check(settings: SettingsArgs) -> Result<()> {
    let config = load_config(&settings)?;
    Controller::with_config(config)?.check().await
}

/// Load or create the configuration, apply CLI overrides and validate it
fn load_config(options: &SettingsArgs) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    apply_overrides(&mut config, options);

    config.validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    Ok(config)
}

/// Override config values with CLI options, secrets included
fn apply_overrides(config: &mut Config, options: &SettingsArgs) {
    if let Some(provider) = &options.provider {
        config.model.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        config.model.active_provider_config_mut().model = model.clone();
    }

    if let Some(api_key) = &options.api_key {
        if config.model.provider == ModelProvider::Anthropic {
            config.model.active_provider_config_mut().api_key = api_key.clone();
        }
    }

    if let Some(source_dialect) = options.source_dialect {
        config.source_dialect = source_dialect;
    }

    if let Some(target_dialect) = options.target_dialect {
        config.target_dialect = target_dialect;
    }

    if let Some(target) = &options.target {
        config.target.kind = target.clone().into();
    }

    if let Some(sqlite_path) = &options.sqlite_path {
        config.target.sqlite.path = sqlite_path.clone();
    }

    if let Some(token) = &options.snowflake_token {
        config.target.snowflake.token = token.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}
