use std::sync::Arc;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &therapy_center::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database = %cfg.database_name,
        loglevel = %cfg.loglevel,
        mail_configured = cfg.smtp().is_some()
    );

    let store = therapy_center::store::mongo::MongoStore::connect(
        &cfg.database_url,
        &cfg.database_name,
    )
    .await?;
    let mailer = therapy_center::notify::ReportMailer::new(cfg.smtp().as_ref())?;

    let state = therapy_center::router::AppState::new(Arc::new(store), mailer);
    let app = therapy_center::router::app_router(state);

    let addr = format!("0.0.0.0:{}", cfg.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
