use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;
use sqlx::postgres::PgPoolOptions;

use docchat_core::{Data, SupabaseIdentity};
use docchat_database::{CacheService, Database, MIGRATOR, cache::DEFAULT_HISTORY_CACHE_TTL};
use docchat_llm::ResponseGenerator;
use docchat_pdf::PdfExtractBackend;
use docchat_server::app::{DEFAULT_MAX_PDF_BYTES, router};
use docchat_utils::env::{env_bool, env_string_or, env_u64};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Load the .env file
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let max_connections = u32::try_from(env_u64("DATABASE_MAX_CONNECTIONS", 5)).unwrap_or(5);

    let db_pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await?;
    info!("PostgreSQL connection established.");

    if env_bool("AUTO_RUN_MIGRATIONS", true) {
        MIGRATOR.run(&db_pool).await?;
        info!("Database migrations applied.");
    } else {
        info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
    }

    let cache = build_cache().await;
    let db = Database::with_cache(db_pool, cache);

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .context("failed to build HTTP client")?;

    let data = Data {
        identity: Arc::new(SupabaseIdentity::from_env(http.clone())?),
        turns: Arc::new(db),
        generator: ResponseGenerator::from_env(http)?,
        extractor: Arc::new(PdfExtractBackend::new()),
    };

    let max_pdf_bytes =
        usize::try_from(env_u64("MAX_PDF_BYTES", DEFAULT_MAX_PDF_BYTES as u64)).unwrap_or(DEFAULT_MAX_PDF_BYTES);
    let app = router(data, max_pdf_bytes);

    let addr: SocketAddr = env_string_or("BIND_ADDR", "0.0.0.0:3000")
        .parse()
        .context("BIND_ADDR is not a socket address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "docchat server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("docchat server stopped");
    Ok(())
}

async fn build_cache() -> CacheService {
    let redis_key_prefix = env_string_or("REDIS_KEY_PREFIX", "docchat:prod");

    let mut cache = if env_bool("REDIS_ENABLED", false) {
        match env::var("REDIS_URL") {
            Ok(redis_url) => match CacheService::redis(&redis_url, redis_key_prefix.clone()) {
                Ok(cache) => {
                    info!(key_prefix = %redis_key_prefix, "Redis cache enabled.");
                    cache
                }
                Err(err) => {
                    warn!(?err, key_prefix = %redis_key_prefix, "Failed to initialize Redis cache; continuing with DB-only mode.");
                    CacheService::disabled(redis_key_prefix.clone())
                }
            },
            Err(_) => {
                warn!(key_prefix = %redis_key_prefix, "REDIS_ENABLED=true but REDIS_URL is missing; continuing with DB-only mode.");
                CacheService::disabled(redis_key_prefix.clone())
            }
        }
    } else {
        info!("Redis cache disabled (set REDIS_ENABLED=true to enable).");
        CacheService::disabled(redis_key_prefix.clone())
    };

    cache.configure_history_ttl(Duration::from_secs(env_u64(
        "HISTORY_CACHE_TTL_SECONDS",
        DEFAULT_HISTORY_CACHE_TTL.as_secs(),
    )));

    if cache.is_redis_enabled() {
        info!(
            history_ttl_seconds = cache.history_ttl().as_secs(),
            "History cache TTL configured."
        );
        if let Err(err) = cache.ping().await {
            warn!(
                ?err,
                "Redis cache ping failed; cache operations will continue with fallback behavior."
            );
        } else {
            info!("Redis cache health check passed.");
        }
    }

    cache
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
