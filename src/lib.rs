use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod db;
pub mod document;
pub mod email;
pub mod error;
pub mod export;
pub mod invoice;
pub mod store;

pub use crate::config::AppConfig;
pub use crate::db::AppState;
pub use crate::error::AppError;

/// JSON body of every failed request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            ok: false,
            error: error.to_string(),
            details: None,
            path: None,
        }
    }

    pub fn with_details(error: &str, details: &str) -> Self {
        Self {
            details: Some(details.to_string()),
            ..Self::new(error)
        }
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Record store user token. Sent bare or with a Bearer prefix.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::invoice::handlers::preview_invoice,
        crate::email::handlers::send_invoice_email,
        crate::email::handlers::send_recommendation_email,
        crate::export::handlers::export_orders_xlsx
    ),
    components(
        schemas(
            ErrorResponse,
            email::handlers::SendEmailResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Invoice", description = "Invoice preview endpoints."),
        (name = "Email", description = "Customer email endpoints."),
        (name = "Export", description = "Order export endpoints.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Localhost server")
    )
)]
pub struct ApiDoc;

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Frontend build served from `public_dir`; unknown paths fall back to
/// `index.html` so client-side routes resolve.
fn spa_service(public_dir: PathBuf) -> Files {
    let index = public_dir.join("index.html");
    Files::new("/", public_dir)
        .index_file("index.html")
        .default_handler(fn_service(move |req: ServiceRequest| {
            let index = index.clone();
            async move {
                let (req, _) = req.into_parts();
                let file = NamedFile::open_async(&index).await?;
                let res = file.into_response(&req);
                Ok::<_, actix_web::Error>(ServiceResponse::new(req, res))
            }
        }))
}

/// Register the `/api` routes on a scope or app.
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.configure(invoice::config)
        .configure(email::config)
        .configure(export::config);
}

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let app_state = match AppState::new_with_config(&config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to initialise application state. Check the SMTP and record store settings in .env. Error: {}", e);
            return Err(e);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("frame_orders_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create Prometheus metrics middleware: {}", e))?;

    log::info!("Record store at {}", config.store.url);
    log::info!("Invoice template at {}", config.invoice_template_path().display());
    if !config.public_dir.is_dir() {
        log::warn!(
            "Public dir {} not found, frontend will not be served",
            config.public_dir.display()
        );
    }
    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let server_config = config.clone();
    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .supports_credentials()
            .max_age(3600);
        for origin in &server_config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        let mut app = App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .route("/health", web::get().to(health))
            .service(web::scope("/api").configure(api_config))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            );
        if server_config.public_dir.is_dir() {
            app = app.service(spa_service(server_config.public_dir.clone()));
        }
        app
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
