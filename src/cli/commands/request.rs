use crate::api::HttpRequest;
use crate::cli::utils::output_error;
use crate::cli::{Context, OutputFormat};

pub async fn handle(path: &str, ctx: &Context, output_format: OutputFormat) -> anyhow::Result<()> {
    match ctx.service.client().send(HttpRequest::get(path)).await {
        Ok(response) => {
            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&response.body)?);
                }
                OutputFormat::Text => {
                    println!("{} {}", response.status, serde_json::to_string_pretty(&response.body)?);
                }
            }
            Ok(())
        }
        Err(err) => {
            let message = match ctx.location.hard_redirects().last() {
                Some(to) => format!("{} (session ended, redirected to {})", err.message(), to),
                None => err.message().to_string(),
            };
            output_error(&output_format, &message, Some(err.error_code()))?;
            Err(err.into())
        }
    }
}
