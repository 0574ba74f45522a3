//! HTTP route handlers grouped by resource.
//!
//! Handlers are annotated with `#[openapi]` so `rocket_okapi` can derive the
//! OpenAPI document, and `catchers` renders framework errors in the same
//! envelope as handler errors.

pub mod catchers;
pub mod health;
pub mod hotels;
pub mod params;
pub mod users;
