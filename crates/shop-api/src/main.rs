//! # Corner Shop
//!
//! Checkout engine server.
//!
//! ## Usage
//!
//! ```bash
//! # Optional settings
//! export PORT=8080
//! export SHOP_CURRENCY=usd
//! export CATALOG_PATH=config/products.toml
//!
//! # Run the server
//! shop-server
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Currency: {}", state.config.currency);
    info!(
        "Products available: {}",
        state.shop.catalog().list_active().map(|p| p.len()).unwrap_or(0)
    );

    let app = routes::create_router(state);

    info!("Corner Shop starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Catalog: GET http://{}/api/v1/products", addr);
        info!("Checkout: POST http://{}/api/v1/checkout", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  Corner Shop
  ━━━━━━━━━━━━━━━━━━━━━━━
  Checkout engine
  Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
