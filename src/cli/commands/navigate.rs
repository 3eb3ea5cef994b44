use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::{Context, OutputFormat};
use crate::guard::GuardDecision;
use crate::router::NavigationOutcome;

pub async fn handle(path: &str, decide: bool, ctx: &Context, output_format: OutputFormat) -> anyhow::Result<()> {
    if decide {
        let decision = ctx.navigator.decide(path).await;
        return match decision {
            GuardDecision::Proceed => output_success(
                &output_format,
                &format!("{} proceeds", path),
                Some(json!({ "decision": "proceed" })),
            ),
            GuardDecision::Redirect(redirect) => {
                let query: serde_json::Map<String, serde_json::Value> = redirect
                    .query
                    .iter()
                    .map(|(k, v)| (k.clone(), json!(v)))
                    .collect();
                output_success(
                    &output_format,
                    &format!("{} redirects to {} ({})", path, redirect.route, redirect.reason),
                    Some(json!({
                        "decision": "redirect",
                        "route": redirect.route,
                        "query": query,
                        "reason": redirect.reason.to_string(),
                    })),
                )
            }
        };
    }

    match ctx.navigator.navigate(path).await {
        Ok(NavigationOutcome::Completed(route)) => output_success(
            &output_format,
            &format!(
                "{} -> {} ({})",
                path,
                route.full_path,
                route.title.as_deref().unwrap_or(&route.name)
            ),
            Some(json!({ "route": route })),
        ),
        Ok(NavigationOutcome::Superseded) => output_success(&output_format, "Navigation superseded", None),
        Err(err) => {
            output_error(&output_format, &err.to_string(), Some("REDIRECT_LOOP"))?;
            Err(err.into())
        }
    }
}
