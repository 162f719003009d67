//! Matrikel - student authentication against a directory or an OAuth-backed
//! code-hosting platform
//!
//! Smoke-test tool for a deployment's configuration.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::CommandContext;
use matrikel_core::config::{LogFormat, MatrikelConfig};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "matrikel")]
#[command(author = "Matrikel Team")]
#[command(version = matrikel_core::VERSION)]
#[command(about = "Authenticate students against LDAP or an OAuth platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true, env = "MATRIKEL_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "MATRIKEL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate against the directory with username and password
    Ldap {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "MATRIKEL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Print the OAuth authorization URL
    AuthUrl {
        /// Anti-forgery state (generated when omitted)
        #[arg(short, long)]
        state: Option<String>,
    },

    /// Exchange an authorization code and resolve the linked student
    Exchange {
        #[arg(long)]
        code: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = MatrikelConfig::from_file(path)?;
            config.apply_env();
            config
        }
        None => MatrikelConfig::from_env(),
    };

    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config);
    debug!("Loaded configuration from {:?}", cli.config);

    let ctx = CommandContext {
        config,
        output_format: cli.output,
    };

    let ok = match cli.command {
        Commands::Ldap { username, password } => {
            commands::ldap::execute(&ctx, &username, &password).await?
        }
        Commands::AuthUrl { state } => commands::oauth::auth_url(&ctx, state)?,
        Commands::Exchange { code } => commands::oauth::exchange(&ctx, &code).await?,
        Commands::Version => {
            println!("matrikel {}", matrikel_core::VERSION);
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(config: &MatrikelConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    // Logs go to stderr so that stdout stays machine-readable
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }
}
