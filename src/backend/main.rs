/**
 * chatpulse Server Entry Point
 *
 * Binds the HTTP/WebSocket server, then starts connecting to the persistent
 * store. Exits with status 1 if the store cannot be reached within the
 * initial retry ceiling.
 */

use std::future::IntoFuture;

use chatpulse::backend::server::create_app;
use chatpulse::shared::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = AppConfig::from_env()?;
    let app = create_app(&config)?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running on {}", addr);

    let store = app.store.clone();
    tokio::spawn({
        let store = store.clone();
        async move {
            if let Err(e) = store.connect().await {
                tracing::error!(error = %e, "[Store] Initial connection failed");
            }
        }
    });

    tokio::select! {
        result = axum::serve(listener, app.router).into_future() => {
            result?;
        }
        fatal = store.fatal() => {
            tracing::error!(error = %fatal, "[Store] Giving up, shutting down");
            store.shutdown();
            std::process::exit(1);
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    store.shutdown();
    Ok(())
}
