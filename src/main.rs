use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use jasan::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Upsert a holding for this run, e.g. --holding BTC=0.5 (repeatable)
    #[arg(short = 'H', long = "holding", value_parser = parse_holding, global = true)]
    holdings: Vec<(String, f64)>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn parse_holding(s: &str) -> Result<(String, f64), String> {
    let (symbol, count) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected SYM=COUNT, got: {s}"))?;
    if symbol.trim().is_empty() {
        return Err(format!("Empty symbol in holding: {s}"));
    }
    let count: f64 = count
        .parse()
        .map_err(|_| format!("Invalid count in holding: {s}"))?;
    if count < 0.0 {
        return Err(format!("Count must be non-negative: {s}"));
    }
    Ok((symbol.trim().to_string(), count))
}

impl From<Commands> for jasan::AppCommand {
    fn from(cmd: Commands) -> jasan::AppCommand {
        match cmd {
            Commands::Summary => jasan::AppCommand::Summary,
            Commands::Watch => jasan::AppCommand::Watch,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Value the portfolio once and print the table
    Summary,
    /// Keep re-valuing the portfolio on a timer
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => {
            jasan::run_command(cmd.into(), cli.config_path.as_deref(), &cli.holdings).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = jasan::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
holdings:
  - symbol: "BTC"
    count: 0.5
  - symbol: "AAPL"
    count: 10.0
  - symbol: "005930"
    count: 12.0

providers:
  upbit:
    base_url: "https://api.upbit.com"
  yahoo:
    base_url: "https://query1.finance.yahoo.com"

fx:
  ttl_secs: 600
  default_rate: 1350.0

refresh_secs: 30
lookup_timeout_secs: 10
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
