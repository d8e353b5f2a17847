use actix_cors::Cors;
use actix_web::{middleware::Compress, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use forum_api::auth::JwtVerifier;
use forum_api::openapi::ApiDoc;
use forum_api::repo::Repo;
use forum_api::{config, AppState, Settings};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    let settings = Settings::from_env().context("invalid configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Bootstrapping forum API");
    info!("Frontend URL: {}", settings.frontend_url.as_deref().unwrap_or("http://localhost:5173"));

    let repo = build_repo(&settings).await?;
    let state = web::Data::new(AppState::new(repo, Arc::new(JwtVerifier::new(settings.jwt_secret.clone()))));

    let openapi = ApiDoc::openapi();
    info!("OpenAPI document generated");

    let frontend_url = settings.frontend_url.clone();
    let server = HttpServer::new(move || {
        let cors = {
            let mut c = Cors::default()
                // local dev frontends
                .allowed_origin("http://localhost:5173")
                .allowed_origin("http://127.0.0.1:5173")
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allow_any_header()
                .allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .max_age(3600);
            if let Some(front) = frontend_url.as_deref() {
                c = c.allowed_origin(front);
            }
            c
        };

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(config)
            .service(SwaggerUi::new("/docs").url("/docs/openapi.json", openapi.clone()))
    })
    .bind((settings.bind_addr.as_str(), settings.port))?;

    info!("Listening on http://{}:{}", settings.bind_addr, settings.port);

    server.run().await?;
    Ok(())
}

/// Postgres when DATABASE_URL is set, in-memory otherwise.
async fn build_repo(settings: &Settings) -> anyhow::Result<Arc<dyn Repo>> {
    match settings.database_url.as_deref() {
        Some(db_url) => postgres_repo(db_url, settings.db_max_connections).await,
        None => fallback_repo(),
    }
}

#[cfg(feature = "postgres-store")]
async fn postgres_repo(db_url: &str, max_connections: u32) -> anyhow::Result<Arc<dyn Repo>> {
    use sqlx::postgres::PgPoolOptions;
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await
        .context("failed to connect to Postgres")?;
    let repo = forum_api::repo::pg::PgRepo::new(pool);
    repo.migrate().await?;
    info!("Using Postgres repository backend");
    Ok(Arc::new(repo))
}

#[cfg(not(feature = "postgres-store"))]
async fn postgres_repo(_db_url: &str, _max_connections: u32) -> anyhow::Result<Arc<dyn Repo>> {
    tracing::warn!("DATABASE_URL is set but the postgres-store feature is disabled; ignoring it");
    fallback_repo()
}

#[cfg(feature = "inmem-store")]
fn fallback_repo() -> anyhow::Result<Arc<dyn Repo>> {
    info!("Using in-memory repository backend");
    Ok(Arc::new(forum_api::repo::inmem::InMemRepo::new()))
}

#[cfg(not(feature = "inmem-store"))]
fn fallback_repo() -> anyhow::Result<Arc<dyn Repo>> {
    anyhow::bail!("DATABASE_URL must be set when the inmem-store feature is disabled")
}
