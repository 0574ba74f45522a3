use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::{Catcher, Request};

use crate::auth::guards::AuthFailure;
use crate::error::{ErrorBody, json_error_response};

/// Error envelope produced for requests no handler answered.
pub struct CaughtError(ErrorBody);

impl<'r> Responder<'r, 'static> for CaughtError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        json_error_response(&self.0)
    }
}

#[catch(400)]
pub fn bad_request(_: &Request<'_>) -> CaughtError {
    CaughtError(ErrorBody::new(Status::BadRequest, "Malformed request body"))
}

#[catch(401)]
pub fn unauthorized(request: &Request<'_>) -> CaughtError {
    let AuthFailure(reason) = request.local_cache(AuthFailure::default);
    let message = reason.clone().unwrap_or_else(|| "Unauthorized".to_string());
    CaughtError(ErrorBody::new(Status::Unauthorized, message))
}

#[catch(404)]
pub fn not_found(request: &Request<'_>) -> CaughtError {
    CaughtError(ErrorBody::new(
        Status::NotFound,
        format!("Cannot {} {}", request.method(), request.uri().path()),
    ))
}

#[catch(422)]
pub fn unprocessable_entity(_: &Request<'_>) -> CaughtError {
    CaughtError(ErrorBody::new(
        Status::UnprocessableEntity,
        "Request body could not be processed",
    ))
}

#[catch(500)]
pub fn internal_error(_: &Request<'_>) -> CaughtError {
    CaughtError(ErrorBody::new(
        Status::InternalServerError,
        "Internal server error",
    ))
}

#[catch(default)]
pub fn fallback(status: Status, _: &Request<'_>) -> CaughtError {
    CaughtError(ErrorBody::new(status, status.reason_lossy()))
}

pub fn all() -> Vec<Catcher> {
    catchers![
        bad_request,
        unauthorized,
        not_found,
        unprocessable_entity,
        internal_error,
        fallback
    ]
}
