//! User accounts.

pub mod service;
pub mod store;

pub use service::{UserService, UserServiceError};
pub use store::{PgUserStore, UserStore, UserStoreError};
