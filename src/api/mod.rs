//! API endpoint modules.

pub mod assistant;
pub mod auth;
pub mod chats;
pub mod contest;
pub mod execute;
pub mod health;
pub mod openapi;

use actix_web::{HttpRequest, ResponseError, error, web};

use crate::error::AppError;

pub use assistant::configure_routes as configure_assistant_routes;
pub use auth::configure_routes as configure_auth_routes;
pub use chats::configure_routes as configure_chat_routes;
pub use contest::configure_routes as configure_contest_routes;
pub use execute::configure_routes as configure_execute_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;

/// JSON body config whose errors use the standard error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(1024 * 1024)
        .error_handler(|err: error::JsonPayloadError, _req: &HttpRequest| {
            let app_err = AppError::InvalidInput(format!("Invalid JSON body: {}", err));
            error::InternalError::from_response(err, app_err.error_response()).into()
        })
}

/// Mount the `/api` scope and the top-level `/execute` route.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(configure_health_routes)
            .configure(configure_auth_routes)
            .configure(crate::services::configure_oauth_routes)
            .configure(configure_chat_routes)
            .configure(configure_contest_routes)
            .configure(configure_assistant_routes),
    )
    .configure(configure_execute_routes);
}
