use backend::config::Config;
use backend::service::GroupService;
use backend::store::MemoryStore;
use backend::{app, AppState};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = match &config.persist_path {
        Some(path) => MemoryStore::with_persistence(path.clone()).await?,
        None => {
            tracing::warn!("SANTA_PERSIST_PATH not set, groups are kept in memory only");
            MemoryStore::default()
        }
    };
    if config.draw_seed.is_some() {
        tracing::warn!("SANTA_DRAW_SEED is set, draws are predictable");
    }

    let state = AppState::new(GroupService::new(store).with_draw_seed(config.draw_seed));
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Starting server on {}", config.bind_addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
