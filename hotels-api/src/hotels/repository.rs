//! Hotel persistence boundary.
//!
//! [`HotelRepository`] is what the import pipeline and hotel routes talk to.
//! [`PgHotelRepository`] is the Postgres implementation; tests swap in the
//! in-memory repository from `test_support`.

use rocket_db_pools::sqlx::{self, PgPool};
use thiserror::Error;

use crate::hotels::validation::HotelCandidate;
use crate::models::Hotel;

const UNIQUE_VIOLATION: &str = "23505";

const HOTEL_COLUMNS: &str = "id, name, web_link, country, city, address, email, is_open, \
     longitude::text AS longitude, latitude::text AS latitude";

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("duplicate key violates unique constraint {}", .constraint.as_deref().unwrap_or("unknown"))]
    DuplicateKey { constraint: Option<String> },
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                RepositoryError::DuplicateKey {
                    constraint: db_err.constraint().map(str::to_string),
                }
            }
            _ => RepositoryError::Storage(err.to_string()),
        }
    }
}

#[rocket::async_trait]
pub trait HotelRepository: Send + Sync {
    /// Insert every candidate in a single statement. Either all rows are
    /// stored or none are.
    async fn bulk_insert(&self, hotels: &[HotelCandidate]) -> RepositoryResult<u64>;

    async fn insert(&self, hotel: &HotelCandidate) -> RepositoryResult<Hotel>;

    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<Hotel>>;

    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Hotel>>;

    /// Hotels ordered by id.
    async fn list(&self, offset: i64, limit: i64) -> RepositoryResult<Vec<Hotel>>;

    /// Overwrite every column of hotel `id`; `None` when it does not exist.
    async fn update(&self, id: i32, hotel: &HotelCandidate) -> RepositoryResult<Option<Hotel>>;
}

#[derive(Debug, Clone)]
pub struct PgHotelRepository {
    pool: PgPool,
}

impl PgHotelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl HotelRepository for PgHotelRepository {
    async fn bulk_insert(&self, hotels: &[HotelCandidate]) -> RepositoryResult<u64> {
        if hotels.is_empty() {
            return Ok(0);
        }

        let mut names = Vec::with_capacity(hotels.len());
        let mut web_links = Vec::with_capacity(hotels.len());
        let mut countries = Vec::with_capacity(hotels.len());
        let mut cities = Vec::with_capacity(hotels.len());
        let mut addresses = Vec::with_capacity(hotels.len());
        let mut emails = Vec::with_capacity(hotels.len());
        let mut open_flags = Vec::with_capacity(hotels.len());
        let mut longitudes = Vec::with_capacity(hotels.len());
        let mut latitudes = Vec::with_capacity(hotels.len());

        for hotel in hotels {
            names.push(hotel.name.clone());
            web_links.push(hotel.web_link.clone());
            countries.push(hotel.country.clone());
            cities.push(hotel.city.clone());
            addresses.push(hotel.address.clone());
            emails.push(hotel.email.clone());
            open_flags.push(hotel.is_open);
            longitudes.push(hotel.longitude.clone());
            latitudes.push(hotel.latitude.clone());
        }

        let result = sqlx::query(
            r#"INSERT INTO hotels (name, web_link, country, city, address, email, is_open, longitude, latitude)
               SELECT name, web_link, country, city, address, email, is_open, longitude::numeric, latitude::numeric
               FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], $5::text[], $6::text[],
                           $7::bool[], $8::text[], $9::text[])
                    AS t(name, web_link, country, city, address, email, is_open, longitude, latitude)"#,
        )
        .bind(&names)
        .bind(&web_links)
        .bind(&countries)
        .bind(&cities)
        .bind(&addresses)
        .bind(&emails)
        .bind(&open_flags)
        .bind(&longitudes)
        .bind(&latitudes)
        .execute(&self.pool)
        .await?;

        log::debug!("bulk inserted {} hotels", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn insert(&self, hotel: &HotelCandidate) -> RepositoryResult<Hotel> {
        let sql = format!(
            "INSERT INTO hotels (name, web_link, country, city, address, email, is_open, longitude, latitude) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8::numeric, $9::numeric) \
             RETURNING {HOTEL_COLUMNS}"
        );

        let created = sqlx::query_as::<_, Hotel>(&sql)
            .bind(&hotel.name)
            .bind(&hotel.web_link)
            .bind(&hotel.country)
            .bind(&hotel.city)
            .bind(&hotel.address)
            .bind(&hotel.email)
            .bind(hotel.is_open)
            .bind(&hotel.longitude)
            .bind(&hotel.latitude)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<Hotel>> {
        let sql = format!("SELECT {HOTEL_COLUMNS} FROM hotels WHERE id = $1");
        let hotel = sqlx::query_as::<_, Hotel>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(hotel)
    }

    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Hotel>> {
        let sql = format!("SELECT {HOTEL_COLUMNS} FROM hotels WHERE name = $1");
        let hotel = sqlx::query_as::<_, Hotel>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(hotel)
    }

    async fn list(&self, offset: i64, limit: i64) -> RepositoryResult<Vec<Hotel>> {
        let sql = format!("SELECT {HOTEL_COLUMNS} FROM hotels ORDER BY id ASC OFFSET $1 LIMIT $2");
        let hotels = sqlx::query_as::<_, Hotel>(&sql)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(hotels)
    }

    async fn update(&self, id: i32, hotel: &HotelCandidate) -> RepositoryResult<Option<Hotel>> {
        let sql = format!(
            "UPDATE hotels SET name = $2, web_link = $3, country = $4, city = $5, address = $6, \
             email = $7, is_open = $8, longitude = $9::numeric, latitude = $10::numeric, updated_at = NOW() \
             WHERE id = $1 RETURNING {HOTEL_COLUMNS}"
        );

        let updated = sqlx::query_as::<_, Hotel>(&sql)
            .bind(id)
            .bind(&hotel.name)
            .bind(&hotel.web_link)
            .bind(&hotel.country)
            .bind(&hotel.city)
            .bind(&hotel.address)
            .bind(&hotel.email)
            .bind(hotel.is_open)
            .bind(&hotel.longitude)
            .bind(&hotel.latitude)
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated)
    }
}
