use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use echec_infrastructure::ConfigService;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "echec")]
#[command(about = "EchecEtMatch CLI - conversations and player profiles", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.config/echec/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the conversations of a user, enriched with counterpart profiles
    Conversations {
        /// JSON export of the document store
        #[arg(long)]
        store: PathBuf,
        /// Signed-in user identifier
        #[arg(long)]
        user: String,
        /// Print rows as JSON
        #[arg(long)]
        json: bool,
        /// Print the list every time a profile resolves
        #[arg(long)]
        watch: bool,
    },
    /// Show or edit a user's own profile
    Profile {
        /// JSON export of the document store
        #[arg(long)]
        store: PathBuf,
        /// Signed-in user identifier
        #[arg(long)]
        user: String,
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print the profile
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Overwrite one field (email, lastName, firstName, genre, dob)
    Set { field: String, value: String },
    /// List the catalog, toggling the given games first
    Games {
        /// Games to toggle in the selection, saved afterwards
        #[arg(long = "toggle")]
        toggle: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Write the default configuration if no file exists
    Init,
    /// Print the configuration file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_service = match &cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    let config = config_service
        .get_config()
        .context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Conversations {
            store,
            user,
            json,
            watch,
        } => commands::conversations::list(&config, &store, &user, json, watch).await?,
        Commands::Profile {
            store,
            user,
            action,
        } => match action {
            ProfileAction::Show { json } => {
                commands::profile::show(&config, &store, &user, json).await?
            }
            ProfileAction::Set { field, value } => {
                commands::profile::set(&config, &store, &user, &field, &value).await?
            }
            ProfileAction::Games { toggle } => {
                commands::profile::games(&config, &store, &user, &toggle).await?
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config)?,
            ConfigAction::Init => commands::config::init(&config_service)?,
            ConfigAction::Path => commands::config::path(&config_service)?,
        },
    }

    Ok(())
}
