use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::util::add_schema_response;
use schemars::JsonSchema;
use serde::Serialize;
use std::io::Cursor;

use crate::auth::AuthError;
use crate::hotels::import::ImportError;
use crate::hotels::service::{HotelServiceError, join_violations};
use crate::users::UserServiceError;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
const IMPORT_FAILED_MESSAGE: &str = "Failed to import hotels";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// 400 that still carries a payload, e.g. an import where every row failed.
    Rejected {
        message: String,
        data: serde_json::Value,
    },
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    UnprocessableEntity(String),
    DatabaseError(sqlx::Error),
    /// The message is returned to the client as-is; log details before
    /// constructing this.
    InternalError(String),
}

/// Error envelope: `error` is the HTTP reason phrase.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status_code: status.code,
            message: message.into(),
            error: status.reason_lossy().to_string(),
            data: None,
        }
    }
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::BadRequest(_) | ApiError::Rejected { .. } => Status::BadRequest,
            ApiError::Unauthorized(_) => Status::Unauthorized,
            ApiError::Forbidden(_) => Status::Forbidden,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Conflict(_) => Status::Conflict,
            ApiError::UnprocessableEntity(_) => Status::UnprocessableEntity,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                Status::InternalServerError
            }
        }
    }

    fn into_body(self) -> ErrorBody {
        let status = self.status();
        match self {
            ApiError::DatabaseError(e) => {
                log::error!("database error: {}", e);
                ErrorBody::new(status, INTERNAL_ERROR_MESSAGE)
            }
            ApiError::InternalError(msg) => {
                log::error!("internal error: {}", msg);
                ErrorBody::new(status, msg)
            }
            ApiError::Rejected { message, data } => {
                log::debug!("rejected: {}", message);
                ErrorBody {
                    data: Some(data),
                    ..ErrorBody::new(status, message)
                }
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::UnprocessableEntity(msg) => {
                log::debug!("{}: {}", status, msg);
                ErrorBody::new(status, msg)
            }
        }
    }
}

/// Serialize an error envelope into a JSON response.
pub fn json_error_response(body: &ErrorBody) -> response::Result<'static> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| {
        r#"{"statusCode":500,"message":"Failed to serialize error","error":"Internal Server Error"}"#
            .to_string()
    });

    let status = Status::from_code(body.status_code).unwrap_or(Status::InternalServerError);
    Response::build()
        .status(status)
        .header(ContentType::JSON)
        .sized_body(json.len(), Cursor::new(json))
        .ok()
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        json_error_response(&self.into_body())
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let schema = generator.json_schema::<ErrorBody>();
        let mut responses = Responses::default();
        for code in [400, 401, 403, 404, 409, 422, 500] {
            add_schema_response(&mut responses, code, "application/json", schema.clone())?;
        }
        Ok(responses)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err.status().code {
            401 => ApiError::Unauthorized(err.to_string()),
            404 => ApiError::NotFound(err.to_string()),
            _ => {
                log::error!("auth failure: {}", err);
                ApiError::InternalError(INTERNAL_ERROR_MESSAGE.to_string())
            }
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Malformed(decode) => ApiError::BadRequest(decode.to_string()),
            ImportError::DuplicateName(detail) => {
                log::warn!("hotel import rejected: {}", detail);
                ApiError::Conflict("Duplicate hotel name".to_string())
            }
            ImportError::Storage(detail) => {
                log::error!("hotel import failed: {}", detail);
                ApiError::InternalError(IMPORT_FAILED_MESSAGE.to_string())
            }
        }
    }
}

impl From<HotelServiceError> for ApiError {
    fn from(err: HotelServiceError) -> Self {
        match err {
            HotelServiceError::NotFound(id) => {
                ApiError::NotFound(format!("Hotel with ID {} not found", id))
            }
            HotelServiceError::Invalid(violations) => {
                ApiError::BadRequest(join_violations(&violations))
            }
            HotelServiceError::DuplicateName => {
                ApiError::Conflict("Hotel name already exists".to_string())
            }
            HotelServiceError::Storage(detail) => {
                log::error!("hotel storage failure: {}", detail);
                ApiError::InternalError(INTERNAL_ERROR_MESSAGE.to_string())
            }
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::NotFound => ApiError::NotFound("User not found".to_string()),
            UserServiceError::Invalid(violations) => {
                ApiError::BadRequest(join_violations(&violations))
            }
            UserServiceError::DuplicateEmail => {
                ApiError::Conflict("Email already exists".to_string())
            }
            UserServiceError::Forbidden => {
                ApiError::Forbidden("You are not allowed to update this user".to_string())
            }
            UserServiceError::Auth(err) => ApiError::from(err),
            UserServiceError::Storage(detail) => {
                log::error!("user storage failure: {}", detail);
                ApiError::InternalError(INTERNAL_ERROR_MESSAGE.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotels::csv::DecodeError;

    #[test]
    fn import_errors_map_to_fixed_messages() {
        let conflict = ApiError::from(ImportError::DuplicateName("hotels_name_key".into()));
        assert_eq!(conflict.status(), Status::Conflict);

        let storage = ApiError::from(ImportError::Storage("connection reset by peer".into()));
        let body = storage.into_body();
        assert_eq!(body.status_code, 500);
        assert_eq!(body.message, "Failed to import hotels");
        assert_eq!(body.error, "Internal Server Error");
    }

    #[test]
    fn malformed_csv_uses_decoder_text() {
        let err = ApiError::from(ImportError::Malformed(DecodeError::InconsistentColumns {
            line: 3,
            expected: 9,
            found: 2,
        }));
        let body = err.into_body();
        assert_eq!(body.status_code, 400);
        assert_eq!(
            body.message,
            "Invalid Record Length: columns length is 9, got 2 on line 3"
        );
        assert!(body.data.is_none());
    }

    #[test]
    fn auth_errors_keep_client_facing_reasons() {
        let body = ApiError::from(AuthError::InvalidRefreshToken).into_body();
        assert_eq!(body.status_code, 401);
        assert_eq!(body.message, "Invalid refresh token");

        let body = ApiError::from(AuthError::UserNotFound).into_body();
        assert_eq!(body.status_code, 404);
        assert_eq!(body.message, "User not found");

        let body = ApiError::from(AuthError::Config("missing secret".into())).into_body();
        assert_eq!(body.status_code, 500);
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn rejected_errors_keep_their_payload() {
        let body = ApiError::Rejected {
            message: "No records successfully imported".into(),
            data: serde_json::json!({ "successRecords": [] }),
        }
        .into_body();

        assert_eq!(body.error, "Bad Request");
        assert_eq!(body.data, Some(serde_json::json!({ "successRecords": [] })));
    }
}
