use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthConfig, AuthError, AuthResult};
use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub kind: TokenKind,
}

impl TokenClaims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl KeyPair {
    fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }
}

/// Mints and checks HS256 tokens. Access and refresh tokens are signed with
/// different secrets, so one can never stand in for the other.
pub struct JwtService {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
    issuer: String,
    audience: String,
}

impl JwtService {
    pub fn from_config(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.clone()]);
        validation.set_issuer(&[config.issuer.clone()]);
        validation.leeway = 30;

        Self {
            access: KeyPair::new(&config.access_token_secret, config.access_token_ttl_secs),
            refresh: KeyPair::new(&config.refresh_token_secret, config.refresh_token_ttl_secs),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    pub fn issue_access_token(&self, user: &User) -> AuthResult<SignedToken> {
        self.issue(user, TokenKind::Access)
    }

    pub fn issue_refresh_token(&self, user: &User) -> AuthResult<SignedToken> {
        self.issue(user, TokenKind::Refresh)
    }

    pub fn decode_access_token(&self, token: &str) -> AuthResult<TokenClaims> {
        self.decode(token, TokenKind::Access).map_err(|err| match err {
            TokenError::Expired => AuthError::AccessTokenExpired,
            TokenError::Invalid => AuthError::InvalidAccessToken,
        })
    }

    pub fn decode_refresh_token(&self, token: &str) -> AuthResult<TokenClaims> {
        self.decode(token, TokenKind::Refresh).map_err(|err| match err {
            TokenError::Expired => AuthError::RefreshTokenExpired,
            TokenError::Invalid => AuthError::InvalidRefreshToken,
        })
    }

    /// Exchange a valid refresh token for a fresh access token carrying the
    /// same identity. The refresh token itself is not rotated.
    pub fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<SignedToken> {
        let claims = self.decode_refresh_token(refresh_token)?;
        let id = claims.user_id().ok_or(AuthError::InvalidRefreshToken)?;
        self.sign(
            Identity {
                id,
                email: &claims.email,
                first_name: &claims.first_name,
                last_name: &claims.last_name,
            },
            TokenKind::Access,
        )
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn issue(&self, user: &User, kind: TokenKind) -> AuthResult<SignedToken> {
        self.sign(
            Identity {
                id: user.id,
                email: &user.email,
                first_name: &user.first_name,
                last_name: &user.last_name,
            },
            kind,
        )
    }

    fn sign(&self, identity: Identity<'_>, kind: TokenKind) -> AuthResult<SignedToken> {
        let keys = self.keys(kind);
        let now = Utc::now();
        let expires_at = now + keys.ttl;

        let claims = TokenClaims {
            sub: identity.id.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            email: identity.email.to_string(),
            first_name: identity.first_name.to_string(),
            last_name: identity.last_name.to_string(),
            kind,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)?;
        Ok(SignedToken { token, expires_at })
    }

    fn decode(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, TokenError> {
        let claims = decode::<TokenClaims>(token, &self.keys(kind).decoding, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?
            .claims;

        if claims.kind != kind || claims.user_id().is_none() {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}

struct Identity<'a> {
    id: i32,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
}

enum TokenError {
    Expired,
    Invalid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            issuer: "https://hotels.test".into(),
            audience: "hotels-api".into(),
            access_token_secret: "access-secret".into(),
            refresh_token_secret: "refresh-secret".into(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 604800,
            refresh_cookie_name: "refresh_token".into(),
            cookie_secure: false,
        }
    }

    fn user() -> User {
        User {
            id: 42,
            first_name: "Mei".into(),
            last_name: "Lin".into(),
            email: "mei@example.com".into(),
            password_hash: None,
        }
    }

    #[test]
    fn issues_and_decodes_access_tokens() {
        let service = JwtService::from_config(&config());
        let token = service.issue_access_token(&user()).expect("issue");

        let claims = service.decode_access_token(&token.token).expect("decode");
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.email, "mei@example.com");
        assert_eq!(claims.first_name, "Mei");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let service = JwtService::from_config(&config());
        let access = service.issue_access_token(&user()).expect("access");
        let refresh = service.issue_refresh_token(&user()).expect("refresh");

        assert!(matches!(
            service.decode_refresh_token(&access.token),
            Err(AuthError::InvalidRefreshToken)
        ));
        assert!(matches!(
            service.decode_access_token(&refresh.token),
            Err(AuthError::InvalidAccessToken)
        ));
    }

    #[test]
    fn expired_tokens_are_reported_as_expired() {
        let expired = JwtService::from_config(&AuthConfig {
            refresh_token_ttl_secs: -120,
            ..config()
        });
        let token = expired.issue_refresh_token(&user()).expect("issue");

        assert!(matches!(
            expired.decode_refresh_token(&token.token),
            Err(AuthError::RefreshTokenExpired)
        ));
    }

    #[test]
    fn refresh_tokens_mint_access_tokens() {
        let service = JwtService::from_config(&config());
        let refresh = service.issue_refresh_token(&user()).expect("refresh");

        let access = service
            .refresh_access_token(&refresh.token)
            .expect("exchange");
        let claims = service.decode_access_token(&access.token).expect("decode");
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.last_name, "Lin");
    }

    #[test]
    fn garbage_is_invalid() {
        let service = JwtService::from_config(&config());
        assert!(matches!(
            service.decode_access_token("not.a.jwt"),
            Err(AuthError::InvalidAccessToken)
        ));
    }
}
