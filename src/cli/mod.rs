pub mod commands;
pub mod utils;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::router::{MemoryLocation, Navigator};
use crate::session::{Credentials, SessionService, SessionStore};

#[derive(Parser)]
#[command(name = "investidor")]
#[command(about = "Investidor CLI - session-aware client for the investment platform API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, env = "API_BASE_URL", help = "API base URL")]
    pub base_url: Option<String>,

    #[arg(long, global = true, env = "INVESTIDOR_EMAIL", help = "Log in with this email before running the command")]
    pub email: Option<String>,

    #[arg(long, global = true, env = "INVESTIDOR_PASSWORD", hide_env_values = true, help = "Password for --email")]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Navigate to a path through the guard chain")]
    Navigate {
        #[arg(help = "Path, optionally with a query string")]
        path: String,
        #[arg(long, help = "Only show the first guard decision")]
        decide: bool,
    },

    #[command(about = "List the route table")]
    Routes,

    #[command(about = "GET a path through the session-aware client")]
    Get {
        #[arg(help = "API path relative to the base URL")]
        path: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Everything a command needs, wired over the reqwest transport
pub struct Context {
    pub config: ClientConfig,
    pub service: SessionService,
    pub navigator: Navigator,
    pub location: Arc<MemoryLocation>,
}

impl Context {
    pub fn connect(config: ClientConfig) -> anyhow::Result<Self> {
        let location = Arc::new(MemoryLocation::default());
        let client = ApiClient::connect(&config, Arc::new(SessionStore::new()), location.clone())?;
        let service = SessionService::new(client, &config);
        let navigator = Navigator::standard(&config, service.clone());
        Ok(Self {
            config,
            service,
            navigator,
            location,
        })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let mut config = crate::config::config().clone();
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    let ctx = Context::connect(config)?;

    if let Some(email) = &cli.email {
        let password = cli
            .password
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--password is required with --email"))?;
        ctx.service.login(&Credentials::new(email, password)).await?;
    }

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &ctx, output_format).await,
        Commands::Navigate { path, decide } => {
            commands::navigate::handle(&path, decide, &ctx, output_format).await
        }
        Commands::Routes => commands::routes::handle(&ctx, output_format),
        Commands::Get { path } => commands::request::handle(&path, &ctx, output_format).await,
    }
}
