//! Account use cases: registration, lookup, self-service updates and
//! credential checks for login.

use std::sync::Arc;

use thiserror::Error;

use crate::auth::passwords::is_strong_password;
use crate::auth::{AuthError, PasswordService};
use crate::hotels::validation::{self, Violation, Violations};
use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserPublic};
use crate::users::store::{UserRecord, UserStore, UserStoreError};

const WEAK_PASSWORD_MESSAGE: &str = "password is not strong enough";

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("user not found")]
    NotFound,
    #[error("invalid user: {0:?}")]
    Invalid(Vec<Violation>),
    #[error("email already exists")]
    DuplicateEmail,
    #[error("user may only update their own account")]
    Forbidden,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<UserStoreError> for UserServiceError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::DuplicateEmail => UserServiceError::DuplicateEmail,
            UserStoreError::Storage(message) => UserServiceError::Storage(message),
        }
    }
}

pub type UserServiceResult<T> = Result<T, UserServiceError>;

pub struct UserService {
    store: Arc<dyn UserStore>,
    passwords: Arc<PasswordService>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, passwords: Arc<PasswordService>) -> Self {
        Self { store, passwords }
    }

    pub async fn create(&self, request: CreateUserRequest) -> UserServiceResult<UserPublic> {
        let mut violations = Violations::new();
        let first_name = violations.check(validation::required_text(
            "firstName",
            request.first_name.as_deref(),
        ));
        let last_name = violations.check(validation::required_text(
            "lastName",
            request.last_name.as_deref(),
        ));
        let email = violations.check(validation::email("email", request.email.as_deref()));
        let password = violations.check(password_rule(request.password.as_deref()));

        let (Some(first_name), Some(last_name), Some(email), Some(password)) =
            (first_name, last_name, email, password)
        else {
            return Err(UserServiceError::Invalid(violations.into_vec()));
        };

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(UserServiceError::DuplicateEmail);
        }

        let password_hash = password
            .map(|plain| self.passwords.hash_password(plain))
            .transpose()?;

        let user = self
            .store
            .insert(&UserRecord {
                first_name,
                last_name,
                email,
                password_hash,
            })
            .await?;

        log::info!("created user {}", user.id);
        Ok(user.into())
    }

    pub async fn get(&self, id: i32) -> UserServiceResult<UserPublic> {
        self.find(id).await.map(UserPublic::from)
    }

    pub async fn find(&self, id: i32) -> UserServiceResult<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(UserServiceError::NotFound)
    }

    /// Update account `id` on behalf of `actor_id`. Only account owners may
    /// update themselves.
    pub async fn update(
        &self,
        actor_id: i32,
        id: i32,
        request: UpdateUserRequest,
    ) -> UserServiceResult<UserPublic> {
        if actor_id != id {
            return Err(UserServiceError::Forbidden);
        }

        let existing = self.find(id).await?;

        let mut violations = Violations::new();
        let first_name = request
            .first_name
            .as_deref()
            .and_then(|name| violations.check(validation::required_text("firstName", Some(name))));
        let last_name = request
            .last_name
            .as_deref()
            .and_then(|name| violations.check(validation::required_text("lastName", Some(name))));
        let email = request
            .email
            .as_deref()
            .and_then(|email| violations.check(validation::email("email", Some(email))));
        let password = violations.check(password_rule(request.password.as_deref())).flatten();

        if !violations.is_empty() {
            return Err(UserServiceError::Invalid(violations.into_vec()));
        }

        if let Some(email) = email.as_deref() {
            if let Some(owner) = self.store.find_by_email(email).await? {
                if owner.id != id {
                    return Err(UserServiceError::DuplicateEmail);
                }
            }
        }

        let mut record = UserRecord::from(existing);
        if let Some(first_name) = first_name {
            record.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            record.last_name = last_name;
        }
        if let Some(email) = email {
            record.email = email;
        }
        if let Some(password) = password {
            record.password_hash = Some(self.passwords.hash_password(password)?);
        }

        let updated = self
            .store
            .update(id, &record)
            .await?
            .ok_or(UserServiceError::NotFound)?;
        Ok(updated.into())
    }

    /// Check a login attempt. Unknown emails and wrong passwords are
    /// reported separately.
    pub async fn authenticate(&self, email: &str, password: &str) -> UserServiceResult<User> {
        let user = self
            .store
            .find_by_email(email.trim())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.passwords
            .verify_password(password, user.password_hash.as_deref())?;
        Ok(user)
    }
}

/// Optional password; when present it must be strong.
fn password_rule(value: Option<&str>) -> Result<Option<&str>, Violation> {
    match value {
        None => Ok(None),
        Some(password) if is_strong_password(password) => Ok(Some(password)),
        Some(_) => Err(Violation::new(
            "password",
            "isStrongPassword",
            WEAK_PASSWORD_MESSAGE,
        )),
    }
}
