use author_service::config::{Config, DEFAULT_LOG_FILTER};
use author_service::database::{DefaultAuthorRepository, establish_pool};
use author_service::http::{AppState, HttpServer, HttpServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::from_env()?;

    let pool = establish_pool(config.database_url(), config.database_max_connections()).await?;
    let author_repo = DefaultAuthorRepository::new(pool);

    let state = AppState::new(author_repo);
    let server_config = HttpServerConfig::new(config.server_port());
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}
