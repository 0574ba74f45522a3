use rocket::State;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{ApiResponse, CreateUserRequest, UpdateUserRequest, UserPublic};
use crate::users::UserService;

#[openapi(tag = "Users")]
#[post("/users", data = "<payload>")]
pub async fn create_user(
    users: &State<UserService>,
    payload: Json<CreateUserRequest>,
) -> Result<status::Custom<Json<ApiResponse<UserPublic>>>, ApiError> {
    let user = users.create(payload.into_inner()).await?;
    Ok(status::Custom(
        Status::Created,
        Json(ApiResponse::created("User created successfully", user)),
    ))
}

#[openapi(tag = "Users")]
#[get("/users/<id>")]
pub async fn get_user(
    users: &State<UserService>,
    id: i32,
) -> Result<Json<ApiResponse<UserPublic>>, ApiError> {
    let user = users.get(id).await?;
    Ok(Json(ApiResponse::ok("User found successfully", user)))
}

/// Requires a bearer access token belonging to the user being updated.
#[openapi(tag = "Users")]
#[patch("/users/<id>", data = "<payload>")]
pub async fn update_user(
    users: &State<UserService>,
    caller: AuthUser,
    id: i32,
    payload: Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserPublic>>, ApiError> {
    let user = users.update(caller.id, id, payload.into_inner()).await?;
    Ok(Json(ApiResponse::ok("User updated successfully", user)))
}
