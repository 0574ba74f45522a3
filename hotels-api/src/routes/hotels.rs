//! Hotel catalog endpoints, including the CSV bulk import.

use rocket::State;
use rocket::form::error::ErrorKind;
use rocket::form::{self, Form};
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket_okapi::openapi;
use tokio::io::AsyncReadExt;

use crate::error::ApiError;
use crate::hotels::{HotelService, ImportOutcome, ImportReport};
use crate::models::{ApiResponse, CreateHotelRequest, Hotel, HotelPage, UpdateHotelRequest};
use crate::routes::params::parse_page;

const CSV_TYPE_MESSAGE: &str = "Validation failed (expected type is text/csv)";
const FILE_REQUIRED_MESSAGE: &str = "File is required";
const UPLOAD_READ_MESSAGE: &str = "Failed to read uploaded file";

type Created<T> = status::Custom<Json<ApiResponse<T>>>;

#[openapi(tag = "Hotels")]
#[get("/hotels/<id>")]
pub async fn get_hotel(
    service: &State<HotelService>,
    id: i32,
) -> Result<Json<ApiResponse<Hotel>>, ApiError> {
    let hotel = service.get(id).await?;
    Ok(Json(ApiResponse::ok("Hotel found successfully", hotel)))
}

/// Ten hotels per page, ordered by id.
#[openapi(tag = "Hotels")]
#[get("/hotels?<page>")]
pub async fn list_hotels(
    service: &State<HotelService>,
    page: Option<String>,
) -> Result<Json<ApiResponse<HotelPage>>, ApiError> {
    let page = parse_page(page.as_deref())?;
    let hotels = service.list(page).await?;
    Ok(Json(ApiResponse::ok("Hotels found successfully", hotels)))
}

#[openapi(tag = "Hotels")]
#[post("/hotels", data = "<payload>")]
pub async fn create_hotel(
    service: &State<HotelService>,
    payload: Json<CreateHotelRequest>,
) -> Result<Created<Hotel>, ApiError> {
    let hotel = service.create(payload.into_inner()).await?;
    Ok(status::Custom(
        Status::Created,
        Json(ApiResponse::created("Hotel created successfully", hotel)),
    ))
}

#[openapi(tag = "Hotels")]
#[patch("/hotels/<id>", data = "<payload>")]
pub async fn update_hotel(
    service: &State<HotelService>,
    id: i32,
    payload: Json<UpdateHotelRequest>,
) -> Result<Json<ApiResponse<Hotel>>, ApiError> {
    let hotel = service.update(id, payload.into_inner()).await?;
    Ok(Json(ApiResponse::ok("Hotel updated successfully", hotel)))
}

/// Multipart body of the import endpoint.
#[derive(FromForm)]
pub struct CsvUpload<'r> {
    pub file: TempFile<'r>,
}

/// Import hotels from a CSV upload (multipart field `file`).
///
/// Responds 201 when at least one row was stored, and 400 when the file has
/// no rows, every row was rejected, or the CSV itself is malformed.
#[openapi(skip)]
#[post("/hotels/import/csv", data = "<upload>")]
pub async fn import_csv(
    service: &State<HotelService>,
    upload: Result<Form<CsvUpload<'_>>, form::Errors<'_>>,
) -> Result<Created<ImportOutcome>, ApiError> {
    let max_bytes = service.config().max_upload_bytes;
    let upload = upload.map_err(|errors| upload_error(&errors, max_bytes))?;
    let file = &upload.file;

    let is_csv = file
        .content_type()
        .is_some_and(|ct| ct.top() == "text" && ct.sub() == "csv");
    if !is_csv {
        return Err(ApiError::UnprocessableEntity(CSV_TYPE_MESSAGE.to_string()));
    }
    if file.len() >= max_bytes {
        return Err(ApiError::UnprocessableEntity(size_message(max_bytes)));
    }

    let buffer = read_upload(file).await?;
    log::info!(
        "importing hotels from {} ({} bytes)",
        file.name().unwrap_or("upload"),
        buffer.len()
    );

    let outcome = service.import_csv(buffer).await?;
    let report = ImportReport::classify(outcome);
    let status = report.status();
    let message = report.message();

    match report {
        ImportReport::Empty => Err(ApiError::BadRequest(message.to_string())),
        ImportReport::AllRejected(outcome) => Err(ApiError::Rejected {
            message: message.to_string(),
            data: serde_json::to_value(&outcome)
                .map_err(|err| ApiError::InternalError(err.to_string()))?,
        }),
        ImportReport::Partial(outcome) | ImportReport::Complete(outcome) => Ok(status::Custom(
            status,
            Json(ApiResponse::new(status, message, outcome)),
        )),
    }
}

fn size_message(max_bytes: u64) -> String {
    format!("Validation failed (expected size is less than {max_bytes} bytes)")
}

fn upload_error(errors: &form::Errors<'_>, max_bytes: u64) -> ApiError {
    let oversize = errors
        .iter()
        .any(|err| matches!(err.kind, ErrorKind::InvalidLength { .. }));

    if oversize {
        ApiError::UnprocessableEntity(size_message(max_bytes))
    } else {
        log::debug!("rejected upload: {}", errors);
        ApiError::UnprocessableEntity(FILE_REQUIRED_MESSAGE.to_string())
    }
}

fn read_failed(err: std::io::Error) -> ApiError {
    log::error!("failed to read uploaded file: {}", err);
    ApiError::InternalError(UPLOAD_READ_MESSAGE.to_string())
}

async fn read_upload(file: &TempFile<'_>) -> Result<Vec<u8>, ApiError> {
    let mut reader = Box::pin(file.open().await.map_err(read_failed)?);
    let mut buffer = Vec::with_capacity(usize::try_from(file.len()).unwrap_or_default());
    reader.read_to_end(&mut buffer).await.map_err(read_failed)?;
    Ok(buffer)
}
