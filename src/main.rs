use std::sync::Arc;

use reelist_api::config::Config;
use reelist_api::db::{create_pool, PgStore};
use reelist_api::routes::create_router;
use reelist_api::services::providers::tmdb::TmdbProvider;
use reelist_api::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reelist_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;

    let store = Arc::new(PgStore::new(pool));
    let provider = Arc::new(TmdbProvider::new(config.tmdb_api_key, config.tmdb_api_url));

    let state = AppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        provider,
    );
    let app = create_router(state);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
