use actix_web::{error::InternalError, web, HttpResponse};

use super::handlers;

/// Configures the API routes
///
/// Bodies that fail to deserialize are answered with 422, keeping 400 for
/// well-formed input the ledger rejects.
///
/// # Arguments
///
/// * `cfg` - The service configuration
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::UnprocessableEntity().json(serde_json::json!({
            "error": err.to_string()
        }));
        InternalError::from_response(err, response).into()
    });

    cfg.app_data(json_config).service(
        web::scope("/api/v1")
            .route("/status", web::get().to(handlers::get_status))
            .route("/blocks/next", web::get().to(handlers::get_next_block))
            .route("/blocks/{index_or_hash}", web::get().to(handlers::get_block))
            .route("/blocks", web::post().to(handlers::add_block))
            .route("/transactions", web::get().to(handlers::get_mempool))
            .route("/transactions/{hash}", web::get().to(handlers::get_transaction))
            .route("/transactions", web::post().to(handlers::add_transaction))
    );
}
