use serde_json::json;

use crate::cli::utils::output_table;
use crate::cli::{Context, OutputFormat};

pub fn handle(ctx: &Context, output_format: OutputFormat) -> anyhow::Result<()> {
    let rows = ctx
        .navigator
        .table()
        .routes()
        .iter()
        .map(|route| {
            let access = if route.meta.guest_only {
                "guest"
            } else if route.meta.needs_authentication() {
                "auth"
            } else {
                "public"
            };
            json!({
                "name": route.name,
                "path": route.path,
                "access": access,
                "title": route.meta.title,
            })
        })
        .collect();

    output_table(&output_format, "routes", rows, |row| {
        format!(
            "{:<20} {:<20} {}",
            row["name"].as_str().unwrap_or_default(),
            row["path"].as_str().unwrap_or_default(),
            row["access"].as_str().unwrap_or_default()
        )
    })
}
