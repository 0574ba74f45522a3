//! Query parameter helpers shared by list endpoints.

use crate::error::ApiError;

const PAGE_MESSAGE: &str = "Page must be an integer greater than or equal to 1";

/// Resolve the `page` query parameter.
///
/// Missing or non-numeric input falls back to the first page; numbers that
/// are fractional or below one are rejected.
pub fn parse_page(raw: Option<&str>) -> Result<i64, ApiError> {
    let number = match raw.map(str::trim).map(str::parse::<f64>) {
        Some(Ok(number)) if !number.is_nan() => number,
        _ => return Ok(1),
    };

    if number.fract() != 0.0 || number < 1.0 || number > i64::MAX as f64 {
        return Err(ApiError::BadRequest(PAGE_MESSAGE.to_string()));
    }
    Ok(number as i64)
}
