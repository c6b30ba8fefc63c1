use actix_cors::Cors;
use actix_web::{App, HttpServer};
use anyhow::Context;
use crypto_core::JwtKeys;
use post_service::config::{CorsConfig, MediaBackend, StoreBackend};
use post_service::db::{InMemoryStore, PgPostStore, PgUserStore, PostStore, UserStore};
use post_service::handlers::{self, UploadLimits};
use post_service::openapi::ApiDoc;
use post_service::services::{AppServices, InMemoryMediaStore, MediaStore, S3MediaStore};
use post_service::Config;
use s3_utils::S3Operations;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_cors(config: &CorsConfig) -> Cors {
    let mut cors = Cors::default();
    for origin in config.origins() {
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method().allow_any_header().max_age(3600)
}

async fn build_stores(config: &Config) -> anyhow::Result<(Arc<dyn PostStore>, Arc<dyn UserStore>)> {
    match config.store {
        StoreBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(10))
                .connect(&config.database.url)
                .await
                .context("Failed to connect to PostgreSQL")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            let posts: Arc<dyn PostStore> = Arc::new(PgPostStore::new(pool.clone()));
            let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool));
            Ok((posts, users))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            let posts: Arc<dyn PostStore> = store.clone();
            let users: Arc<dyn UserStore> = store;
            Ok((posts, users))
        }
    }
}

async fn build_media(config: &Config) -> Arc<dyn MediaStore> {
    match config.media.backend {
        MediaBackend::S3 => {
            let ops = S3Operations::connect(config.media.s3.clone()).await;
            if let Err(e) = ops.health_check().await {
                // Uploads fail with 502 until the bucket is reachable
                tracing::warn!(bucket = %config.media.s3.bucket, error = %e, "Media bucket not reachable at startup");
            }
            Arc::new(S3MediaStore::new(ops))
        }
        MediaBackend::Memory => {
            tracing::warn!("Using the in-memory media store; uploads are lost on restart");
            Arc::new(InMemoryMediaStore::new())
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting post-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(env = %config.app.env, store = ?config.store, media = ?config.media.backend, "Configuration loaded");

    let jwt_keys = JwtKeys::from_rsa_pem(&config.jwt.private_key_pem, &config.jwt.public_key_pem)
        .context("Failed to load JWT keys")?
        .with_access_ttl(chrono::Duration::seconds(config.jwt.access_token_ttl_secs));

    let (post_store, user_store) = build_stores(&config).await?;
    let media = build_media(&config).await;

    let services = AppServices::new(
        post_store,
        user_store,
        media,
        Arc::new(jwt_keys),
        config.reactions.max_attempts,
    );
    let limits = UploadLimits {
        max_file_bytes: config.media.max_upload_bytes,
    };

    let bind_address = config.bind_address();
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cors_config = config.cors.clone();
    HttpServer::new(move || {
        let openapi_doc = ApiDoc::openapi();

        App::new()
            .wrap(build_cors(&cors_config))
            .wrap(TracingLogger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url(ApiDoc::openapi_json_path(), openapi_doc),
            )
            .configure(|cfg| handlers::configure(cfg, &services, limits))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("HTTP server error")?;

    tracing::info!("post-service shut down");
    Ok(())
}
