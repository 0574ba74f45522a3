//! Readiness probe.

use rocket::serde::json::Json;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::models::ApiResponse;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthStatus {
    pub status: String,
}

#[openapi(tag = "Health")]
#[get("/health")]
pub fn health_check() -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::ok(
        "ok",
        HealthStatus {
            status: "ok".to_string(),
        },
    ))
}
