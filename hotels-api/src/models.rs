use rocket::http::Status;
use rocket_db_pools::sqlx::FromRow;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ===== Response Envelope =====

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(status: Status, message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: status.code,
            message: message.into(),
            data,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(Status::Ok, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(Status::Created, message, data)
    }
}

// ===== Hotel Models =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_link: Option<String>,
    pub country: String,
    pub city: String,
    pub address: String,
    pub email: String,
    pub is_open: bool,
    /// Decimal degrees as text, within -180 to 180.
    pub longitude: String,
    /// Decimal degrees as text, within -90 to 90.
    pub latitude: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HotelPage {
    pub hotels: Vec<Hotel>,
    pub page: i64,
}

// ===== User Models =====

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: Option<String>,
}

/// User fields that are safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        }
    }
}

// ===== Hotel Requests =====

/// Coordinate as sent in JSON: either a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CoordinateInput {
    Number(f64),
    Text(String),
}

impl CoordinateInput {
    pub fn as_text(&self) -> String {
        match self {
            CoordinateInput::Number(number) => number.to_string(),
            CoordinateInput::Text(text) => text.clone(),
        }
    }
}

/// Body of `POST /hotels`. Missing fields are reported as validation errors
/// rather than parse failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateHotelRequest {
    pub name: Option<String>,
    pub web_link: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub is_open: Option<bool>,
    pub longitude: Option<CoordinateInput>,
    pub latitude: Option<CoordinateInput>,
}

/// Body of `PATCH /hotels/<id>`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateHotelRequest {
    pub name: Option<String>,
    pub web_link: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub is_open: Option<bool>,
    pub longitude: Option<CoordinateInput>,
    pub latitude: Option<CoordinateInput>,
}

impl UpdateHotelRequest {
    /// Overlay this patch on a stored hotel.
    pub fn merged_with(self, hotel: Hotel) -> CreateHotelRequest {
        CreateHotelRequest {
            name: Some(self.name.unwrap_or(hotel.name)),
            web_link: self.web_link.or(hotel.web_link),
            country: Some(self.country.unwrap_or(hotel.country)),
            city: Some(self.city.unwrap_or(hotel.city)),
            address: Some(self.address.unwrap_or(hotel.address)),
            email: Some(self.email.unwrap_or(hotel.email)),
            is_open: Some(self.is_open.unwrap_or(hotel.is_open)),
            longitude: Some(
                self.longitude
                    .unwrap_or(CoordinateInput::Text(hotel.longitude)),
            ),
            latitude: Some(
                self.latitude
                    .unwrap_or(CoordinateInput::Text(hotel.latitude)),
            ),
        }
    }
}

// ===== User Requests =====

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}
