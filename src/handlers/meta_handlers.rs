use actix_web::{get, web, HttpResponse};
use serde_json::json;

use crate::error_handler::ServiceError;
use crate::state::AppState;

#[get("/ping")]
pub async fn ping_handler() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "pong" }))
}

#[get("/health")]
pub async fn health_check_handler(
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    // Test de connexion au pool
    match state.pool.get().await {
        Ok(_conn) => Ok(HttpResponse::Ok().json(json!({
            "status": "healthy",
            "message": "Backend is running and DB pool accessible"
        }))),
        Err(e) => {
            log::error!("Failed to get connection from pool: {:?}", e);
            Err(ServiceError::InternalServerError(
                "Failed to check DB pool".to_string(),
            ))
        }
    }
}
