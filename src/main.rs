use movie_recommender_api::{
    api::{create_router, AppState},
    config::Config,
    corpus::{Corpus, SimilarityMode},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movie_recommender_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // A missing or misaligned corpus aborts startup
    let load_config = config.clone();
    let corpus = tokio::task::spawn_blocking(move || -> anyhow::Result<Corpus> {
        let corpus = Corpus::load(
            &load_config.corpus_paths(),
            load_config.corpus_load_strategy,
        )?;
        Ok(match load_config.similarity_mode {
            SimilarityMode::OnDemand => corpus,
            SimilarityMode::Precomputed => {
                corpus.with_neighbor_table(load_config.precompute_depth())
            }
        })
    })
    .await??;

    let state = AppState::from_config(&config, corpus)?;
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
