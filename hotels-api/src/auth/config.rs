use crate::auth::{AuthError, AuthResult};

/// Authentication configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub refresh_cookie_name: String,
    pub cookie_secure: bool,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        let issuer =
            std::env::var("HOTELS_JWT_ISSUER").unwrap_or_else(|_| "http://localhost".into());
        let audience = std::env::var("HOTELS_JWT_AUDIENCE").unwrap_or_else(|_| "hotels-api".into());
        let access_token_secret = required_secret("HOTELS_JWT_SECRET")?;
        let refresh_token_secret = required_secret("HOTELS_JWT_REFRESH_SECRET")?;
        let access_token_ttl_secs = std::env::var("HOTELS_ACCESS_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60 * 60);
        let refresh_token_ttl_secs = std::env::var("HOTELS_REFRESH_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(7 * 24 * 60 * 60);
        let refresh_cookie_name = std::env::var("HOTELS_REFRESH_COOKIE_NAME")
            .unwrap_or_else(|_| "refresh_token".into());
        let cookie_secure = std::env::var("HOTELS_COOKIE_SECURE")
            .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "on"))
            .unwrap_or(true);

        if access_token_secret == refresh_token_secret {
            return Err(AuthError::Config(
                "HOTELS_JWT_SECRET and HOTELS_JWT_REFRESH_SECRET must differ".into(),
            ));
        }

        Ok(Self {
            issuer,
            audience,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
            refresh_cookie_name,
            cookie_secure,
        })
    }
}

fn required_secret(name: &str) -> AuthResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AuthError::Config(format!("{name} is required"))),
    }
}
