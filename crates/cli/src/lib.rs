pub mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use freightdesk_core::config::{AppConfig, ConfigOverrides, LogFormat};
use tracing_subscriber::EnvFilter;

use commands::{
    finalize::FinalizeArgs, option::OptionArgs, price::PriceArgs, recap::RecapArgs, teu::TeuArgs,
    validate::ValidateArgs,
};

#[derive(Debug, Parser)]
#[command(
    name = "freightdesk",
    about = "Freightdesk draft quote CLI",
    long_about = "Price, validate and recap freight draft quotes exported by the quote wizard.",
    after_help = "Examples:\n  freightdesk price draft.json --margin 15\n  freightdesk recap draft.json\n  freightdesk teu 20GP 40HC 45HC\n  freightdesk doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file to load instead of freightdesk.toml")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a draft and return the breakdown as JSON")]
    Price(PriceArgs),
    #[command(about = "Render the plain-text recap of a priced draft")]
    Recap(RecapArgs),
    #[command(about = "Check wizard step completeness and report violation codes")]
    Validate(ValidateArgs),
    #[command(about = "Add a named pricing option with its own margin to a draft")]
    Option(OptionArgs),
    #[command(about = "Validate every step and record final totals on the draft")]
    Finalize(FinalizeArgs),
    #[command(about = "Convert container type codes to twenty-foot equivalent units")]
    Teu(TeuArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, the recap template and a reference pricing run")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    pub fn config_path(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}

/// Installs the stderr subscriber. `RUST_LOG` wins over `logging.level`;
/// an unloadable config falls back to defaults so the command itself can
/// report the problem.
pub fn init_logging(config_path: Option<&Path>) {
    let config =
        AppConfig::load(commands::load_options(config_path, ConfigOverrides::default()))
            .unwrap_or_default();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(error) = result {
        eprintln!("logging was already initialized: {error}");
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.config_path());
    execute(&cli)
}

pub fn execute(cli: &Cli) -> ExitCode {
    let config_path = cli.config_path();

    let result = match &cli.command {
        Command::Price(args) => commands::price::run(config_path, args),
        Command::Recap(args) => commands::recap::run(config_path, args),
        Command::Validate(args) => commands::validate::run(config_path, args),
        Command::Option(args) => commands::option::run(config_path, args),
        Command::Finalize(args) => commands::finalize::run(config_path, args),
        Command::Teu(args) => commands::teu::run(args),
        Command::Config => commands::config::run(config_path),
        Command::Doctor { json } => commands::doctor::run(config_path, *json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
