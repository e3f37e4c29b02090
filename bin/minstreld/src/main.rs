//! `minstreld` — the Minstrel server binary.
//!
//! Usage:
//!   minstreld --data-dir <dir> [--listen <addr>] [--jwt-secret <secret>]

mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use minstrel_core::Module;
use tracing::info;

/// Minstrel server.
#[derive(Parser, Debug)]
#[command(name = "minstreld", about = "Minstrel social-blogging server")]
struct Cli {
    /// Directory for all on-disk state (SQLite database, blobs).
    #[arg(long = "data-dir", required = true)]
    data_dir: PathBuf,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,

    /// JWT signing secret. Falls back to MINSTREL_JWT_SECRET.
    #[arg(long = "jwt-secret", env = "MINSTREL_JWT_SECRET")]
    jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.data_dir)?;

    let core_config = minstrel_core::ServiceConfig {
        data_dir: Some(cli.data_dir.clone()),
        listen: cli.listen.clone(),
        ..Default::default()
    };

    // Initialize embedded stores.
    let sql: Arc<dyn minstrel_sql::SQLStore> = Arc::new(
        minstrel_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );
    let blob: Arc<dyn minstrel_blob::BlobStore> = Arc::new(
        minstrel_blob::FileStore::open(&core_config.resolve_blob_dir())
            .map_err(|e| anyhow::anyhow!("failed to open blob store: {}", e))?,
    );

    let mut blog_config = blog::service::BlogConfig::default();
    if let Some(secret) = cli.jwt_secret {
        blog_config.jwt_secret = secret;
    } else {
        tracing::warn!("no --jwt-secret given, using the development default");
    }

    let blog_module = blog::BlogModule::new(Arc::clone(&sql), Arc::clone(&blob), blog_config)?;
    info!("Blog module initialized");

    let module_routes = vec![(blog_module.name().to_string(), blog_module.routes())];

    let app = routes::build_router(module_routes);

    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("Minstrel server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
