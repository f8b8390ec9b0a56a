//! CodeMentor server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{App, HttpRequest, HttpServer, Result as ActixResult, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use codementor_lib::api::{self, ApiDoc};
use codementor_lib::auth::TokenIssuer;
use codementor_lib::config::Config;
use codementor_lib::db::DbPool;
use codementor_lib::middleware;
use codementor_lib::services::{CodeExecutor, CompletionProvider, GeminiClient, Judge0Client};

/// SPA fallback handler - serves index.html for client-side routing.
async fn spa_fallback(req: HttpRequest) -> ActixResult<NamedFile> {
    let static_dir = req
        .app_data::<web::Data<PathBuf>>()
        .ok_or_else(|| actix_web::error::ErrorNotFound("Static dir not configured"))?;
    Ok(NamedFile::open(static_dir.join("index.html"))?)
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::other(format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and JWT_SECRET must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  CodeMentor Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL and JWT_SECRET");
    }

    let pool = DbPool::new(&config)
        .await
        .map_err(|e| startup_error("Failed to initialize database", e))?;
    info!("Database connection established");

    pool.run_migrations()
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;
    info!("Database migrations complete");

    // Collaborators are immutable and shared read-only by every worker
    let executor: Arc<dyn CodeExecutor> = Arc::new(
        Judge0Client::new(&config.judge0)
            .map_err(|e| startup_error("Failed to build execution client", e))?,
    );
    let llm: Arc<dyn CompletionProvider> = Arc::new(
        GeminiClient::new(&config.llm)
            .map_err(|e| startup_error("Failed to build LLM client", e))?,
    );
    if config.llm.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; assistant, titles and problem generation are disabled");
    }
    if config.judge0.api_key.is_none() {
        warn!("RAPIDAPI_KEY is not set; code execution requests may be rejected");
    }
    if config.google_oauth.enabled {
        info!("Google OAuth enabled");
    }

    // Prepare shared state
    let bind_address = config.bind_address();
    let issuer = web::Data::new(TokenIssuer::new(&config.auth));
    let executor = web::Data::from(executor);
    let llm = web::Data::from(llm);
    let client_url = config.client_url.clone();
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();
    let config = web::Data::new(config);

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&client_url)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        let mut app = App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            .wrap(middleware::RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(config.clone())
            .app_data(issuer.clone())
            .app_data(executor.clone())
            .app_data(llm.clone())
            .app_data(api::json_config())
            .configure(api::configure_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            );

        // Serve static files in production (when STATIC_DIR is set)
        if let Some(ref dir) = static_dir {
            app = app
                .app_data(web::Data::new(dir.clone()))
                .service(Files::new("/assets", dir.join("assets")).prefer_utf8(true))
                // SPA fallback - serve index.html for all other routes
                .default_service(web::route().to(spa_fallback));
        }

        app
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
