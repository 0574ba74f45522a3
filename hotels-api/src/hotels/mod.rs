//! Hotel catalog: CSV import pipeline, field rules, persistence, and the
//! service used by the HTTP routes.

pub mod config;
pub mod csv;
pub mod import;
pub mod report;
pub mod repository;
pub mod service;
pub mod validation;

pub use config::ImportConfig;
pub use import::{HotelImporter, ImportError};
pub use report::{ImportOutcome, ImportReport};
pub use repository::{HotelRepository, PgHotelRepository, RepositoryError};
pub use service::{HotelService, HotelServiceError};
