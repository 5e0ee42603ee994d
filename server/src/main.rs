//! Process entry point: builds the application exactly once and serves it.

use cryptoscore::{
    create_app, ensure_database_exists, ensure_tables, init_tracing, process_env, profile_name,
    ConfigRegistry,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let name = profile_name(None, process_env);
    let settings = ConfigRegistry::standard().select(&name, process_env)?;
    init_tracing(&settings);

    let app = create_app(Some(&name))?;
    ensure_database_exists(&app.settings().database_url).await?;
    if let Some(pool) = app.pool() {
        ensure_tables(pool).await?;
    }

    let listener = TcpListener::bind(&app.settings().bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app.into_router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
