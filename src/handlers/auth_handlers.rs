// timetrack/backend-api/src/handlers/auth_handlers.rs
use crate::auth_utils::AuthenticatedUser;
use crate::credentials::{hash_password, mint_csrf_token, verify_password};
use crate::error_handler::ServiceError;
use crate::models::{CredentialsPayload, NewUser, User};
use crate::schema::users;
use crate::state::AppState;
use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::json;

const MAX_USERNAME_LEN: usize = 80;

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// === POST /register ===
#[post("/register")]
pub async fn register_handler(
    state: web::Data<AppState>,
    payload: web::Json<CredentialsPayload>,
) -> Result<HttpResponse, ServiceError> {
    let CredentialsPayload { username, password } = payload.into_inner();
    let (new_username, password) = match (non_blank(username), non_blank(password)) {
        (Some(u), Some(p)) => (u, p),
        _ => {
            return Err(ServiceError::BadRequest(
                "Missing username or password".to_string(),
            ))
        }
    };
    if new_username.chars().count() > MAX_USERNAME_LEN {
        return Err(ServiceError::BadRequest(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }

    let mut conn = state.pool.get().await?;

    let existing = users::table
        .filter(users::username.eq(&new_username))
        .select(users::id)
        .first::<i32>(&mut conn)
        .await
        .optional()?;
    if existing.is_some() {
        log::info!("Registration refused, username {} is taken", new_username);
        return Err(ServiceError::Conflict("User already exists".to_string()));
    }

    let password_hash = web::block(move || hash_password(&password)).await??;

    let new_user = NewUser {
        username: new_username.clone(),
        password_hash,
        created_at: Utc::now().naive_utc(),
    };

    // The unique index catches a concurrent registration that slipped past the check above.
    diesel::insert_into(users::table)
        .values(&new_user)
        .execute(&mut conn)
        .await
        .map_err(|db_err| match ServiceError::from(db_err) {
            ServiceError::Conflict(_) => ServiceError::Conflict("User already exists".to_string()),
            other => other,
        })?;

    log::info!("User {} registered", new_username);
    Ok(HttpResponse::Ok().json(json!({ "message": "User registered successfully" })))
}

// === POST /login ===
#[post("/login")]
pub async fn login_handler(
    state: web::Data<AppState>,
    payload: web::Json<CredentialsPayload>,
) -> Result<HttpResponse, ServiceError> {
    let invalid = || ServiceError::Unauthorized("Invalid credentials".to_string());

    let CredentialsPayload { username, password } = payload.into_inner();
    let (login_username, password) = match (non_blank(username), password) {
        (Some(u), Some(p)) => (u, p),
        _ => return Err(invalid()),
    };

    let mut conn = state.pool.get().await?;

    let user = users::table
        .filter(users::username.eq(&login_username))
        .select(User::as_select())
        .first::<User>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| {
            log::info!("Login failed, unknown user {}", login_username);
            invalid()
        })?;

    let stored_hash = user.password_hash.clone();
    let matches = web::block(move || verify_password(&password, &stored_hash)).await?;
    if !matches {
        log::info!("Login failed, bad password for {}", user.username);
        return Err(invalid());
    }

    let token = state.tokens.issue(user.id, &user.username)?;
    log::info!("User {} logged in", user.username);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Login successful",
        "token": token
    })))
}

// === POST /logout ===
// Tokens are stateless: the client discards its copy.
#[post("/logout")]
pub async fn logout_handler(authenticated_user: AuthenticatedUser) -> HttpResponse {
    log::info!("User {} logged out", authenticated_user.username);
    HttpResponse::Ok().json(json!({ "message": "Logout successful" }))
}

// === GET /csrf-token ===
#[get("/csrf-token")]
pub async fn csrf_token_handler() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "csrf_token": mint_csrf_token() }))
}

#[cfg(test)]
mod tests {
    use crate::handlers::configure_api;
    use crate::test_support::{db_state, lazy_state, unique_name};
    use actix_web::{http::header, http::StatusCode, test, web, App};
    use serde_json::json;

    #[actix_web::test]
    async fn csrf_token_is_issued_without_auth() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_state()))
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/csrf-token").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["csrf_token"].as_str().unwrap().len(), 64);
    }

    #[actix_web::test]
    async fn logout_requires_a_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_state()))
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/logout").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn logout_acknowledges_valid_token() {
        let state = lazy_state();
        let token = state.tokens.issue(1, "frank").unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/logout")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Logout successful");
    }

    #[actix_web::test]
    async fn register_rejects_missing_fields_before_touching_the_db() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_state()))
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/register")
            .set_json(json!({ "username": "grace" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Missing username or password");
    }

    #[actix_web::test]
    async fn malformed_json_is_a_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_state()))
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/register")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn register_twice_then_login() {
        let Some(state) = db_state().await else {
            return;
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;
        let username = unique_name("heidi");
        let creds = json!({ "username": username, "password": "pw-heidi" });

        let first = test::TestRequest::post()
            .uri("/api/register")
            .set_json(&creds)
            .to_request();
        assert_eq!(test::call_service(&app, first).await.status(), StatusCode::OK);

        let second = test::TestRequest::post()
            .uri("/api/register")
            .set_json(&creds)
            .to_request();
        let resp = test::call_service(&app, second).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "User already exists");

        let login = test::TestRequest::post()
            .uri("/api/login")
            .set_json(&creds)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, login).await;
        assert_eq!(body["message"], "Login successful");
        assert!(body["token"].as_str().is_some());
    }

    #[actix_web::test]
    async fn bad_credentials_are_always_401() {
        let Some(state) = db_state().await else {
            return;
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;
        let username = unique_name("ivan");

        let register = test::TestRequest::post()
            .uri("/api/register")
            .set_json(json!({ "username": username, "password": "right" }))
            .to_request();
        assert_eq!(test::call_service(&app, register).await.status(), StatusCode::OK);

        for creds in [
            json!({ "username": username, "password": "wrong" }),
            json!({ "username": unique_name("nobody"), "password": "right" }),
            json!({ "username": username }),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/login")
                .set_json(&creds)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
    }
}
