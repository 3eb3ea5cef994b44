mod common;

use anyhow::Result;
use common::{hits, EMAIL, PASSWORD};
use investidor_client::guard::{GuardDecision, Redirect, RedirectReason};
use investidor_client::router::{Location, NavigationOutcome, Navigator};
use investidor_client::session::Credentials;

fn landed_on(outcome: NavigationOutcome) -> String {
    match outcome {
        NavigationOutcome::Completed(route) => route.full_path,
        NavigationOutcome::Superseded => panic!("navigation was superseded"),
    }
}

#[tokio::test]
async fn anonymous_user_is_sent_to_login() -> Result<()> {
    let server = common::start_server().await?;
    let (service, location) = server.service("/")?;
    let navigator = Navigator::standard(&server.config(), service);

    let decision = navigator.decide("/dashboard").await;
    assert_eq!(
        decision,
        GuardDecision::Redirect(
            Redirect::new("Login", RedirectReason::Unauthenticated).with_query("redirect", "/dashboard")
        )
    );

    let landed = landed_on(navigator.navigate("/dashboard").await?);
    assert_eq!(landed, "/login?redirect=%2Fdashboard");
    assert_eq!(location.current_path(), landed);
    // Session checked once, on the first guard that needed it
    assert_eq!(hits(&server.backend.me_calls), 1);
    Ok(())
}

#[tokio::test]
async fn logged_in_user_skips_login_page() -> Result<()> {
    let server = common::start_server().await?;
    let (service, _location) = server.service("/login")?;
    service.login(&Credentials::new(EMAIL, PASSWORD)).await?;
    let navigator = Navigator::standard(&server.config(), service);

    assert_eq!(landed_on(navigator.navigate("/login").await?), "/dashboard");
    assert_eq!(landed_on(navigator.navigate("/portfolio").await?), "/portfolio");
    // Login already initialized the session
    assert_eq!(hits(&server.backend.me_calls), 0);
    Ok(())
}

#[tokio::test]
async fn maintenance_mode_needs_no_backend() -> Result<()> {
    let server = common::start_server().await?;
    let mut config = server.config();
    config.navigation.maintenance_mode = true;
    let (service, _location) = server.service("/")?;
    let navigator = Navigator::standard(&config, service);

    assert_eq!(landed_on(navigator.navigate("/dashboard").await?), "/manutencao");
    assert_eq!(hits(&server.backend.me_calls), 0);
    assert_eq!(hits(&server.backend.refresh_calls), 0);
    Ok(())
}
