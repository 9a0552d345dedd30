use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tiernotes_core::{Config, Pipeline, build_classifier, config_file};
use tiernotes_pdf_mupdf::MupdfBackend;
use tiernotes_web::{AppState, ServerSettings, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let lookup = |key: &str| std::env::var(key).ok();
    let file = config_file::load_config();
    let mut config = Config::from_file(&file)?;
    config.apply_env(lookup)?;
    let settings = ServerSettings::resolve(&file, lookup)?;

    let classifier = build_classifier(&config)?;
    let pipeline = Pipeline::new(Arc::new(MupdfBackend::new()), classifier, &config);
    tracing::info!(
        classifier = pipeline.classifier_name(),
        output_dir = %config.output.dir.display(),
        max_pages = config.max_pages,
        "pipeline ready"
    );

    let app = router(Arc::new(AppState { pipeline }), &settings)?;

    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    tracing::info!(cors_origin = %settings.cors_origin, "listening on http://{}", settings.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
