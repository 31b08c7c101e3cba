//! Campus extractor service: binary entrypoint.
//! Boots the Axum HTTP server with the taxonomy handle, stores and metrics.

use campus_extractor::{
    api::{self, AppState},
    metrics::Metrics,
    replies::HotReloadReplies,
    taxonomy::{config_path_from_env, start_hot_reload_thread, TaxonomyHandle},
    text::dev_logging_enabled,
};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs, only when EXTRACT_DEV_LOG=1 in a dev environment.
fn enable_dev_tracing() {
    if !dev_logging_enabled() {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("extract=info,taxonomy=info,api=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init()
        .ok();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // .env is optional; missing file is fine.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let taxonomy = TaxonomyHandle::from_env()?;
    start_hot_reload_thread(taxonomy.clone(), config_path_from_env());

    let metrics = Metrics::init(&taxonomy.current())?;

    let state = AppState::new(taxonomy, HotReloadReplies::from_env());
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
