use rocket::http::Status;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("No access token provided")]
    MissingAccessToken,
    #[error("Access token expired")]
    AccessTokenExpired,
    #[error("Invalid access token")]
    InvalidAccessToken,
    #[error("No refresh token provided")]
    MissingRefreshToken,
    #[error("Refresh token expired")]
    RefreshTokenExpired,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Sqlx(#[from] rocket_db_pools::sqlx::Error),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("argon2 parameter error: {0}")]
    Argon2(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl AuthError {
    pub fn status(&self) -> Status {
        match self {
            AuthError::InvalidCredentials
            | AuthError::MissingAccessToken
            | AuthError::AccessTokenExpired
            | AuthError::InvalidAccessToken
            | AuthError::MissingRefreshToken
            | AuthError::RefreshTokenExpired
            | AuthError::InvalidRefreshToken => Status::Unauthorized,
            AuthError::UserNotFound => Status::NotFound,
            AuthError::Config(_)
            | AuthError::Sqlx(_)
            | AuthError::Jwt(_)
            | AuthError::Argon2(_)
            | AuthError::PasswordHash(_) => Status::InternalServerError,
        }
    }
}

impl From<argon2::Error> for AuthError {
    fn from(err: argon2::Error) -> Self {
        AuthError::Argon2(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}
