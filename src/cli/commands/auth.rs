use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::{Context, OutputFormat};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Check the session with the backend (log in with --email/--password)")]
    Status,

    #[command(about = "Log out")]
    Logout,

    #[command(about = "Ask the backend to refresh the session")]
    Refresh,
}

pub async fn handle(cmd: AuthCommands, ctx: &Context, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Status => {
            ctx.service.initialize().await;
            match ctx.service.session().principal().await {
                Some(principal) => output_success(
                    &output_format,
                    &format!(
                        "Authenticated as {}",
                        principal.email.as_deref().or(principal.name.as_deref()).unwrap_or("unknown")
                    ),
                    Some(json!({ "authenticated": true, "user": principal })),
                ),
                None => output_success(
                    &output_format,
                    "Not authenticated",
                    Some(json!({ "authenticated": false })),
                ),
            }
        }
        AuthCommands::Logout => {
            ctx.service.logout().await;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Refresh => {
            if ctx.service.client().refresh_session().await {
                output_success(&output_format, "Session refreshed", None)
            } else {
                output_error(&output_format, "Session refresh failed", Some("UNAUTHORIZED"))?;
                Err(anyhow::anyhow!("session refresh failed"))
            }
        }
    }
}
