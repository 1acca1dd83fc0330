// timetrack/backend-api/src/config.rs
use std::env;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub pool_max_size: u32,
    pub host: String,
    pub port: u16,
    pub frontend_url_prod: String,
    pub frontend_url_dev: String,
    pub jwt: JwtConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment variables or .env file")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            ttl_minutes: parsed_or("JWT_TTL_MINUTES", 60)?,
        };
        if jwt.ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_TTL_MINUTES",
                value: jwt.ttl_minutes.to_string(),
            });
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            pool_max_size: parsed_or("DB_POOL_MAX_SIZE", 10)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed_or("PORT", 8080)?,
            frontend_url_prod: env::var("FRONTEND_URL_PROD")
                .unwrap_or_else(|_| "https://timetrack.example.com".to_string()),
            frontend_url_dev: env::var("FRONTEND_URL_DEV")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            jwt,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
