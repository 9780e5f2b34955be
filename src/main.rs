use std::sync::Arc;

use anyhow::Context;

use freelance_hub::api::session_routes;
use freelance_hub::cli::run_shell;
use freelance_hub::config::HubConfig;
use freelance_hub::{logging, open_session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HubConfig::from_env().context("reading FREELANCE_HUB_* configuration")?;
    logging::init(config.log_dir.as_deref()).context("initializing logging")?;

    eprintln!("Freelance Hub v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Storage: {:?}", config.storage);
    eprintln!("   Auth: {:?}", config.auth_mode);

    let store = open_session(&config).await.context("opening session storage")?;

    if let Some(port) = config.http_port {
        let app = session_routes(Arc::clone(&store));
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("binding HTTP port {port}"))?;
        eprintln!("   HTTP API: http://0.0.0.0:{port}/api/session");
        tokio::spawn(async move {
            tracing::info!(port, "HTTP API started");
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "HTTP API stopped");
            }
        });
    }
    eprintln!("   Type 'help' for commands.\n");

    run_shell(store, config.strict_onboarding).await;
    Ok(())
}
