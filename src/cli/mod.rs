//! CLI Module
//!
//! Command-line interface for ZapGate using Clap v4.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// ZapGate - WhatsApp instance lifecycle service
#[derive(Parser, Debug)]
#[command(name = "zapgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug mode (writes log files under .zapgate/logs/)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show resolved configuration (secrets masked)
    Config,

    /// WhatsApp instance lifecycle operations
    Instance {
        #[command(subcommand)]
        operation: InstanceCommands,
    },

    /// Send a message through the connected instance
    Send {
        #[command(subcommand)]
        operation: SendCommands,
    },

    /// List contacts known to the connected account
    Contacts,

    /// Campaign queue operations
    Campaign {
        #[command(subcommand)]
        operation: CampaignCommands,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        operation: DbCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum InstanceCommands {
    /// Provision the organization's instance and print pairing codes
    Provision,
    /// Show connection status, reconciled against the gateway
    Status,
    /// Generate a fresh QR/pairing code for an existing instance
    Connect,
    /// Close the WhatsApp session
    Disconnect,
    /// Tear down the instance (remote best-effort, local always)
    Delete,
}

#[derive(Subcommand, Debug)]
pub enum SendCommands {
    /// Send a text message
    Text {
        /// Destination number (digits only, country code first)
        to: String,
        /// Message body
        message: String,
    },
    /// Send a media file
    Media {
        /// Destination number
        to: String,
        /// Path to the file to upload
        file: PathBuf,
        /// Media kind: image, video, audio or document
        #[arg(short, long, default_value = "image")]
        kind: String,
        /// Optional caption
        #[arg(long)]
        caption: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CampaignCommands {
    /// Queue an outbound message
    Queue {
        /// Destination number
        to: String,
        /// Message body
        message: String,
    },
    /// Dispatch one batch of queued messages
    Run,
    /// List campaign messages and their statuses
    List,
}

#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// Initialize the database
    Init,
    /// Show row counts
    Stats,
}

/// Main CLI entry point
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(PathBuf::from);

    // Default to a status read when invoked without a subcommand
    let command = cli.command.unwrap_or(Commands::Instance {
        operation: InstanceCommands::Status,
    });

    match command {
        Commands::Init { force } => commands::init_config(config_path.as_deref(), force),
        Commands::Config => commands::show_config(config_path.as_deref()),
        Commands::Instance { operation } => {
            let ctx = load_context(config_path.as_deref()).await?;
            commands::instance_command(&ctx, operation).await
        }
        Commands::Send { operation } => {
            let ctx = load_context(config_path.as_deref()).await?;
            commands::send_command(&ctx, operation).await
        }
        Commands::Contacts => {
            let ctx = load_context(config_path.as_deref()).await?;
            commands::contacts_command(&ctx).await
        }
        Commands::Campaign { operation } => {
            let ctx = load_context(config_path.as_deref()).await?;
            commands::campaign_command(&ctx, operation).await
        }
        Commands::Db { operation } => {
            let ctx = load_context(config_path.as_deref()).await?;
            commands::db_command(&ctx, operation).await
        }
    }
}

async fn load_context(config_path: Option<&std::path::Path>) -> Result<commands::AppContext> {
    let config = crate::config::Config::load(config_path)?;
    commands::app_context(config).await
}
