use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{State, post};
use rocket_okapi::openapi;
use time::Duration as TimeDuration;

use crate::auth::jwt::SignedToken;
use crate::auth::responses::{LoginRequest, TokenResponse};
use crate::auth::{AuthError, AuthState};
use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::users::UserService;

/// Exchange credentials for an access token. The refresh token is only
/// delivered as an HttpOnly cookie.
#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    users: &State<UserService>,
    cookies: &CookieJar<'_>,
    payload: Json<LoginRequest>,
) -> Result<status::Custom<Json<ApiResponse<TokenResponse>>>, ApiError> {
    let user = users.authenticate(&payload.email, &payload.password).await?;

    let access = state.jwt_service.issue_access_token(&user)?;
    let refresh = state.jwt_service.issue_refresh_token(&user)?;
    set_refresh_cookie(cookies, state, &refresh);

    log::info!("user {} logged in", user.id);
    Ok(status::Custom(
        Status::Created,
        Json(ApiResponse::created(
            "Logged in successfully",
            TokenResponse {
                access_token: access.token,
            },
        )),
    ))
}

#[openapi(tag = "Auth")]
#[post("/auth/refresh")]
pub async fn refresh(
    state: &State<AuthState>,
    cookies: &CookieJar<'_>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let refresh_cookie = cookies
        .get(&state.config.refresh_cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingRefreshToken)?;

    let access = state.jwt_service.refresh_access_token(&refresh_cookie)?;

    Ok(Json(ApiResponse::ok(
        "Access token refreshed successfully",
        TokenResponse {
            access_token: access.token,
        },
    )))
}

fn set_refresh_cookie(cookies: &CookieJar<'_>, state: &State<AuthState>, token: &SignedToken) {
    let cookie = Cookie::build((state.config.refresh_cookie_name.clone(), token.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config.cookie_secure)
        .max_age(TimeDuration::seconds(state.config.refresh_token_ttl_secs))
        .build();

    cookies.add(cookie);
}
