pub mod analytics_handlers;
pub mod auth_handlers;
pub mod meta_handlers;
pub mod project_handlers;
pub mod time_entry_handlers;

use actix_web::{web, Error as ActixWebError, HttpRequest};

use crate::error_handler::ServiceError;

fn json_error(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> ActixWebError {
    log::warn!("Rejected JSON body: {}", err);
    ServiceError::BadRequest(format!("Invalid JSON body: {}", err)).into()
}

fn path_error(err: actix_web::error::PathError, _req: &HttpRequest) -> ActixWebError {
    ServiceError::BadRequest(format!("Invalid path parameter: {}", err)).into()
}

fn query_error(err: actix_web::error::QueryPayloadError, _req: &HttpRequest) -> ActixWebError {
    ServiceError::BadRequest(format!("Invalid query string: {}", err)).into()
}

/// Mounts the whole API under `/api`. Shared by `main` and the handler tests.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(
            web::scope("/api")
                .service(meta_handlers::ping_handler)
                .service(meta_handlers::health_check_handler)
                .service(auth_handlers::register_handler)
                .service(auth_handlers::login_handler)
                .service(auth_handlers::logout_handler)
                .service(auth_handlers::csrf_token_handler)
                .service(
                    web::scope("/projects")
                        .service(project_handlers::create_project_handler)
                        .service(project_handlers::list_projects_handler)
                        .service(project_handlers::get_project_handler)
                        .service(project_handlers::update_project_handler)
                        .service(project_handlers::delete_project_handler),
                )
                .service(
                    web::scope("/time-entries")
                        .service(time_entry_handlers::create_time_entry_handler)
                        .service(time_entry_handlers::list_time_entries_handler)
                        .service(time_entry_handlers::get_time_entry_handler)
                        .service(time_entry_handlers::update_time_entry_handler)
                        .service(time_entry_handlers::delete_time_entry_handler),
                )
                .service(
                    web::scope("/analytics")
                        .service(analytics_handlers::get_time_by_project_handler),
                ),
        );
}
