use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crypto_core::TokenIssuer;
use db_pool::create_pool;
use resilience::document_store_config;
use social_service::config::{Config, StoreBackend, SERVICE_NAME};
use social_service::handlers::register_routes;
use social_service::repository::{
    MemoryRefreshTokenStore, MemoryStore, PgAccountRepository, PgNotificationRepository,
    PgPostRepository, RedisRefreshTokenStore, RefreshTokenStore,
};
use social_service::services::{media::image_store_from_config, Stores};
use social_service::AppState;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,actix_web=info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

/// Build the document stores and the refresh-token store for the configured backend
async fn build_stores(config: &Config) -> Result<(Stores, Arc<dyn RefreshTokenStore>)> {
    let policy = document_store_config().with_limits(config.store.timeout, config.store.max_retries);

    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory stores; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            Ok((
                Stores::new(store.clone(), store.clone(), store, policy),
                Arc::new(MemoryRefreshTokenStore::new()),
            ))
        }
        StoreBackend::Postgres => {
            config.database.log_config();
            let pool = create_pool(config.database.clone())
                .await
                .context("Failed to connect to database")?;
            info!("Database pool created and verified");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Database migrations completed");

            let redis_client = redis::Client::open(config.redis.url.as_str())
                .context("Failed to create Redis client")?;
            let redis_conn = redis::aio::ConnectionManager::new(redis_client)
                .await
                .context("Failed to connect to Redis")?;
            info!("Redis connection established");

            Ok((
                Stores::new(
                    Arc::new(PgAccountRepository::new(pool.clone())),
                    Arc::new(PgPostRepository::new(pool.clone())),
                    Arc::new(PgNotificationRepository::new(pool)),
                    policy,
                ),
                Arc::new(RedisRefreshTokenStore::new(redis_conn)),
            ))
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("WARN: failed to load .env file: {}", e);
        }
    }
    init_tracing();

    info!("Starting {}", SERVICE_NAME);

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        env = %config.app.env,
        http_port = config.app.http_port,
        backend = ?config.store.backend,
        "Configuration loaded"
    );

    let (stores, refresh_tokens) = build_stores(&config).await?;
    let images = image_store_from_config(&config.media);
    let issuer = Arc::new(TokenIssuer::new(
        &config.auth.access_token_secret,
        &config.auth.refresh_token_secret,
        config.auth.access_token_ttl_secs,
        config.auth.refresh_token_ttl_secs,
    ));

    let state = web::Data::new(AppState::new(
        stores,
        images,
        issuer,
        refresh_tokens,
        config.app.secure_cookies(),
        config.media.max_upload_bytes,
    ));

    let http_addr = format!("{}:{}", config.app.host, config.app.http_port);
    let cors_origins = config.app.cors_origins.clone();
    info!("HTTP API listening on http://{}", http_addr);

    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(actix_middleware::Logging)
            .configure(|cfg| register_routes(cfg, &state))
    })
    .bind(&http_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    info!("{} shut down", SERVICE_NAME);
    Ok(())
}
