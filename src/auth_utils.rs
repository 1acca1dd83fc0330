// timetrack/backend-api/src/auth_utils.rs
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use futures_util::future::{ready, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error_handler::ServiceError;
use crate::state::AppState;

/// JWT payload. `sub` carries the username, `uid` the numeric user id used for ownership filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: i32,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, user_id: i32, username: &str) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_owned(),
            uid: user_id,
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            log::error!("Failed to sign token for user {}: {}", username, e);
            ServiceError::InternalServerError("Could not issue token.".to_string())
        })?;
        log::debug!("Token issued for user {}", username);
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ServiceError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        log::error!("AppState is missing from app data; cannot verify tokens");
        ServiceError::InternalServerError("Authentication is not configured.".to_string())
    })?;

    let header_value = req.headers().get(header::AUTHORIZATION).ok_or_else(|| {
        log::warn!("Authorization header was NOT found in request headers.");
        ServiceError::Unauthorized("Missing Authorization header".to_string())
    })?;

    let raw = header_value.to_str().map_err(|_| {
        log::warn!("Authorization header is not valid UTF-8.");
        ServiceError::Unauthorized("Invalid Authorization header".to_string())
    })?;

    let token = raw
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = state.tokens.verify(token)?;
    log::debug!("Authenticated user {} ({})", claims.sub, claims.uid);

    Ok(AuthenticatedUser {
        id: claims.uid,
        username: claims.sub,
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
