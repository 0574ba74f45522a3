//! Hotel use cases shared by the HTTP routes.

use std::sync::Arc;

use thiserror::Error;

use crate::hotels::config::ImportConfig;
use crate::hotels::import::{HotelImporter, ImportError};
use crate::hotels::report::ImportOutcome;
use crate::hotels::repository::{HotelRepository, RepositoryError};
use crate::hotels::validation::{
    self, HotelCandidate, LATITUDE_RANGE, LONGITUDE_RANGE, Violation, Violations,
};
use crate::models::{CreateHotelRequest, Hotel, HotelPage, UpdateHotelRequest};

pub const HOTEL_PAGE_SIZE: i64 = 10;

#[derive(Debug, Error)]
pub enum HotelServiceError {
    #[error("hotel {0} not found")]
    NotFound(i32),
    #[error("invalid hotel: {}", join_violations(.0))]
    Invalid(Vec<Violation>),
    #[error("hotel name already exists")]
    DuplicateName,
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<RepositoryError> for HotelServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateKey { .. } => HotelServiceError::DuplicateName,
            RepositoryError::Storage(message) => HotelServiceError::Storage(message),
        }
    }
}

pub fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type HotelServiceResult<T> = Result<T, HotelServiceError>;

/// Managed Rocket state for every hotel endpoint.
pub struct HotelService {
    repository: Arc<dyn HotelRepository>,
    importer: HotelImporter,
    config: ImportConfig,
}

impl HotelService {
    pub fn new(
        repository: Arc<dyn HotelRepository>,
        config: ImportConfig,
    ) -> Result<Self, rayon::ThreadPoolBuildError> {
        let importer = HotelImporter::new(Arc::clone(&repository), config.validation_workers)?;
        Ok(Self {
            repository,
            importer,
            config,
        })
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub async fn import_csv(&self, buffer: Vec<u8>) -> Result<ImportOutcome, ImportError> {
        self.importer.import_batch(buffer).await
    }

    pub async fn get(&self, id: i32) -> HotelServiceResult<Hotel> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(HotelServiceError::NotFound(id))
    }

    pub async fn list(&self, page: i64) -> HotelServiceResult<HotelPage> {
        let offset = (page - 1).saturating_mul(HOTEL_PAGE_SIZE);
        let hotels = self.repository.list(offset, HOTEL_PAGE_SIZE).await?;
        Ok(HotelPage { hotels, page })
    }

    pub async fn create(&self, request: CreateHotelRequest) -> HotelServiceResult<Hotel> {
        let candidate = validate_request(&request).map_err(HotelServiceError::Invalid)?;

        if self.repository.find_by_name(&candidate.name).await?.is_some() {
            return Err(HotelServiceError::DuplicateName);
        }

        let hotel = self.repository.insert(&candidate).await?;
        log::info!("created hotel {} ({})", hotel.id, hotel.name);
        Ok(hotel)
    }

    pub async fn update(&self, id: i32, patch: UpdateHotelRequest) -> HotelServiceResult<Hotel> {
        let existing = self.get(id).await?;
        let renamed = patch
            .name
            .as_deref()
            .map(str::trim)
            .is_some_and(|name| name != existing.name);

        let candidate =
            validate_request(&patch.merged_with(existing)).map_err(HotelServiceError::Invalid)?;

        if renamed {
            if let Some(other) = self.repository.find_by_name(&candidate.name).await? {
                if other.id != id {
                    return Err(HotelServiceError::DuplicateName);
                }
            }
        }

        self.repository
            .update(id, &candidate)
            .await?
            .ok_or(HotelServiceError::NotFound(id))
    }
}

/// Apply the hotel field rules to a JSON body. `isOpen` is a real boolean
/// here, unlike the `0`/`1` flag of the CSV import.
pub fn validate_request(request: &CreateHotelRequest) -> Result<HotelCandidate, Vec<Violation>> {
    let mut violations = Violations::new();
    let longitude = request.longitude.as_ref().map(|c| c.as_text());
    let latitude = request.latitude.as_ref().map(|c| c.as_text());

    let name = violations.check(validation::required_text("name", request.name.as_deref()));
    let web_link = violations.check(validation::web_link("webLink", request.web_link.as_deref()));
    let country = violations.check(validation::required_text("country", request.country.as_deref()));
    let city = violations.check(validation::required_text("city", request.city.as_deref()));
    let address = violations.check(validation::required_text("address", request.address.as_deref()));
    let email = violations.check(validation::email("email", request.email.as_deref()));
    let is_open = violations.check(validation::required_flag("isOpen", request.is_open));
    let longitude = violations.check(validation::coordinate(
        "longitude",
        longitude.as_deref(),
        LONGITUDE_RANGE,
    ));
    let latitude = violations.check(validation::coordinate(
        "latitude",
        latitude.as_deref(),
        LATITUDE_RANGE,
    ));

    match (
        name, web_link, country, city, address, email, is_open, longitude, latitude,
    ) {
        (
            Some(name),
            Some(web_link),
            Some(country),
            Some(city),
            Some(address),
            Some(email),
            Some(is_open),
            Some(longitude),
            Some(latitude),
        ) => Ok(HotelCandidate {
            name,
            web_link,
            country,
            city,
            address,
            email,
            is_open,
            longitude,
            latitude,
        }),
        _ => Err(violations.into_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CoordinateInput;
    use crate::test_support::InMemoryHotelRepository;

    fn request(name: &str) -> CreateHotelRequest {
        CreateHotelRequest {
            name: Some(name.to_string()),
            web_link: None,
            country: Some("Taiwan".into()),
            city: Some("Yilan".into()),
            address: Some("Wufeng Rd 69".into()),
            email: Some("royal@example.com".into()),
            is_open: Some(true),
            longitude: Some(CoordinateInput::Number(121.776)),
            latitude: Some(CoordinateInput::Text("24.671".into())),
        }
    }

    fn service() -> (Arc<InMemoryHotelRepository>, HotelService) {
        let repository = Arc::new(InMemoryHotelRepository::new());
        let config = ImportConfig {
            validation_workers: 1,
            ..ImportConfig::default()
        };
        let service = HotelService::new(repository.clone(), config).expect("service");
        (repository, service)
    }

    #[test]
    fn numeric_and_string_coordinates_are_accepted() {
        let candidate = validate_request(&request("Royal")).expect("valid");
        assert_eq!(candidate.longitude, "121.776");
        assert_eq!(candidate.latitude, "24.671");
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let violations = validate_request(&CreateHotelRequest::default()).expect_err("invalid");
        assert_eq!(
            join_violations(&violations),
            "name should not be empty; country should not be empty; city should not be empty; \
             address should not be empty; email must be an email; isOpen must be a boolean value; \
             longitude should not be empty; latitude should not be empty"
        );
    }

    #[tokio::test]
    async fn create_rejects_duplicate_names() {
        let (_, service) = service();
        service.create(request("Royal")).await.expect("first");

        let err = service.create(request("Royal")).await.expect_err("duplicate");
        assert!(matches!(err, HotelServiceError::DuplicateName));
    }

    #[tokio::test]
    async fn list_pages_by_ten() {
        let (_, service) = service();
        for i in 0..12 {
            service.create(request(&format!("Hotel {i}"))).await.expect("create");
        }

        let first = service.list(1).await.expect("page 1");
        let second = service.list(2).await.expect("page 2");
        assert_eq!(first.hotels.len(), 10);
        assert_eq!(second.hotels.len(), 2);
        assert_eq!(second.page, 2);
        assert_eq!(second.hotels[0].name, "Hotel 10");
    }

    #[tokio::test]
    async fn update_merges_present_fields() {
        let (_, service) = service();
        let hotel = service.create(request("Royal")).await.expect("create");

        let updated = service
            .update(
                hotel.id,
                UpdateHotelRequest {
                    city: Some("Taipei".into()),
                    is_open: Some(false),
                    ..UpdateHotelRequest::default()
                },
            )
            .await
            .expect("update");

        assert_eq!(updated.name, "Royal");
        assert_eq!(updated.city, "Taipei");
        assert!(!updated.is_open);
    }

    #[tokio::test]
    async fn update_rejects_taken_names_and_unknown_ids() {
        let (_, service) = service();
        service.create(request("Royal")).await.expect("first");
        let other = service.create(request("Ambassador")).await.expect("second");

        let rename = UpdateHotelRequest {
            name: Some("Royal".into()),
            ..UpdateHotelRequest::default()
        };
        assert!(matches!(
            service.update(other.id, rename.clone()).await,
            Err(HotelServiceError::DuplicateName)
        ));
        assert!(matches!(
            service.update(999, rename).await,
            Err(HotelServiceError::NotFound(999))
        ));
    }
}
