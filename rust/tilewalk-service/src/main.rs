use tilewalk_service::{build_router, AppState, Config, Sources, WorldSnapshot};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cfg = Config::from_env()?;
    let sources = Sources {
        world_path: cfg.world_path.clone(),
        transports_path: cfg.transports_path.clone(),
        search: cfg.search.clone(),
    };
    let snapshot = WorldSnapshot::load(&sources)?;
    if snapshot.paths.is_none() {
        tracing::warn!("TILEWALK_WORLD not set, serving without a world until /admin/reload");
    }
    let app = build_router(AppState::new(sources, snapshot));

    let addr = cfg.addr()?;
    tracing::info!(core_version = %tilewalk_core::version(), addr = %addr, "starting tilewalk-service");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
