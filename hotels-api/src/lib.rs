#[macro_use]
extern crate rocket;

pub mod auth;
pub mod db;
pub mod error;
pub mod hotels;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod users;

use crate::auth::{AuthConfig, AuthState, PasswordService};
use crate::db::HotelsDb;
use crate::hotels::{HotelService, ImportConfig, PgHotelRepository};
use crate::request_logger::RequestLogger;
use crate::users::{PgUserStore, UserService};
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket, Route};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::{Arc, Once};

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

/// Every API route, plus the generated `openapi.json`, for mounting under
/// `/api/v1`.
pub fn api_routes() -> Vec<Route> {
    openapi_get_routes![
        // Health
        routes::health::health_check,
        // Hotels
        routes::hotels::get_hotel,
        routes::hotels::list_hotels,
        routes::hotels::create_hotel,
        routes::hotels::update_hotel,
        routes::hotels::import_csv,
        // Users
        routes::users::create_user,
        routes::users::get_user,
        routes::users::update_user,
        // Auth
        auth::routes::login,
        auth::routes::refresh,
    ]
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    let import_config = ImportConfig::from_env();
    log::info!(
        "hotel imports: max upload {} bytes, {} validation workers",
        import_config.max_upload_bytes,
        import_config.validation_workers
    );

    let figment = rocket::Config::figment().merge(("limits", import_config.limits()));

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Patch]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    rocket::custom(figment)
        .attach(RequestLogger)
        .attach(HotelsDb::init())
        .attach(cors)
        .attach(AdHoc::try_on_ignite(
            "Run Migrations",
            |rocket| async move {
                let pool = match HotelsDb::fetch(&rocket) {
                    Some(db) => (**db).clone(),
                    None => {
                        log::error!("database pool not available for migrations");
                        return Err(rocket);
                    }
                };

                match db::run_migrations(&pool).await {
                    Ok(_) => {
                        log::info!("database migrations successful");
                        Ok(rocket)
                    }
                    Err(e) => {
                        log::error!("database migrations failed: {}", e);
                        Err(rocket)
                    }
                }
            },
        ))
        .attach(AdHoc::try_on_ignite(
            "Hotel Services",
            move |rocket| async move {
                let pool = match HotelsDb::fetch(&rocket) {
                    Some(db) => (**db).clone(),
                    None => return Err(rocket),
                };
                let repository = Arc::new(PgHotelRepository::new(pool));

                match HotelService::new(repository, import_config) {
                    Ok(service) => Ok(rocket.manage(service)),
                    Err(e) => {
                        log::error!("failed to start hotel import workers: {}", e);
                        Err(rocket)
                    }
                }
            },
        ))
        .attach(AdHoc::try_on_ignite(
            "Auth Configuration",
            |rocket| async move {
                let pool = match HotelsDb::fetch(&rocket) {
                    Some(db) => (**db).clone(),
                    None => return Err(rocket),
                };

                let config = match AuthConfig::from_env() {
                    Ok(config) => config,
                    Err(e) => {
                        log::error!("invalid auth configuration: {}", e);
                        return Err(rocket);
                    }
                };
                let passwords = match PasswordService::new() {
                    Ok(passwords) => passwords,
                    Err(e) => {
                        log::error!("failed to initialise password hashing: {}", e);
                        return Err(rocket);
                    }
                };

                let users = UserService::new(Arc::new(PgUserStore::new(pool)), Arc::new(passwords));
                Ok(rocket.manage(AuthState::new(config)).manage(users))
            },
        ))
        .register("/", routes::catchers::all())
        .mount("/api/v1", api_routes())
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../v1/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Hotels API", "../../v1/openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use std::sync::{Arc, Mutex, MutexGuard};

    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};

    use crate::auth::{AuthConfig, AuthState, PasswordService};
    use crate::hotels::repository::{HotelRepository, RepositoryError, RepositoryResult};
    use crate::hotels::validation::HotelCandidate;
    use crate::hotels::{HotelService, ImportConfig};
    use crate::models::{Hotel, User};
    use crate::users::UserService;
    use crate::users::store::{UserRecord, UserStore, UserStoreError, UserStoreResult};

    pub use database::{TestDatabase, TestDatabaseError};

    /// Auth settings with fixed secrets and insecure cookies, for local clients.
    pub fn test_auth_config() -> AuthConfig {
        AuthConfig {
            issuer: "http://hotels.test".into(),
            audience: "hotels-api".into(),
            access_token_secret: "test-access-secret".into(),
            refresh_token_secret: "test-refresh-secret".into(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 7 * 24 * 60 * 60,
            refresh_cookie_name: "refresh_token".into(),
            cookie_secure: false,
        }
    }

    fn to_hotel(id: i32, candidate: &HotelCandidate) -> Hotel {
        Hotel {
            id,
            name: candidate.name.clone(),
            web_link: candidate.web_link.clone(),
            country: candidate.country.clone(),
            city: candidate.city.clone(),
            address: candidate.address.clone(),
            email: candidate.email.clone(),
            is_open: candidate.is_open,
            longitude: candidate.longitude.clone(),
            latitude: candidate.latitude.clone(),
        }
    }

    #[derive(Default)]
    struct HotelTable {
        rows: Vec<Hotel>,
        next_id: i32,
        fail_next: Option<String>,
        bulk_insert_calls: usize,
    }

    impl HotelTable {
        fn take_failure(&mut self) -> RepositoryResult<()> {
            match self.fail_next.take() {
                Some(message) => Err(RepositoryError::Storage(message)),
                None => Ok(()),
            }
        }

        fn name_taken(&self, name: &str, except: Option<i32>) -> bool {
            self.rows
                .iter()
                .any(|hotel| hotel.name == name && Some(hotel.id) != except)
        }

        fn push(&mut self, candidate: &HotelCandidate) -> Hotel {
            self.next_id += 1;
            let hotel = to_hotel(self.next_id, candidate);
            self.rows.push(hotel.clone());
            hotel
        }
    }

    fn duplicate_name() -> RepositoryError {
        RepositoryError::DuplicateKey {
            constraint: Some("hotels_name_key".into()),
        }
    }

    /// Hotel storage backed by a vector, with the same unique-name and
    /// all-or-nothing bulk insert behaviour as the Postgres table.
    #[derive(Default)]
    pub struct InMemoryHotelRepository {
        table: Mutex<HotelTable>,
    }

    impl InMemoryHotelRepository {
        pub fn new() -> Self {
            Self::default()
        }

        fn table(&self) -> MutexGuard<'_, HotelTable> {
            self.table.lock().expect("hotel table lock")
        }

        /// Snapshot of stored hotels in id order.
        pub fn hotels(&self) -> Vec<Hotel> {
            self.table().rows.clone()
        }

        pub fn bulk_insert_calls(&self) -> usize {
            self.table().bulk_insert_calls
        }

        /// Make the next write fail with a storage error.
        pub fn fail_next_insert(&self, message: &str) {
            self.table().fail_next = Some(message.to_string());
        }
    }

    #[rocket::async_trait]
    impl HotelRepository for InMemoryHotelRepository {
        async fn bulk_insert(&self, hotels: &[HotelCandidate]) -> RepositoryResult<u64> {
            let mut table = self.table();
            table.bulk_insert_calls += 1;
            table.take_failure()?;

            for (index, candidate) in hotels.iter().enumerate() {
                let repeated = hotels[..index].iter().any(|h| h.name == candidate.name);
                if repeated || table.name_taken(&candidate.name, None) {
                    return Err(duplicate_name());
                }
            }

            for candidate in hotels {
                table.push(candidate);
            }
            Ok(hotels.len() as u64)
        }

        async fn insert(&self, hotel: &HotelCandidate) -> RepositoryResult<Hotel> {
            let mut table = self.table();
            table.take_failure()?;
            if table.name_taken(&hotel.name, None) {
                return Err(duplicate_name());
            }
            Ok(table.push(hotel))
        }

        async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<Hotel>> {
            Ok(self.table().rows.iter().find(|h| h.id == id).cloned())
        }

        async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Hotel>> {
            Ok(self.table().rows.iter().find(|h| h.name == name).cloned())
        }

        async fn list(&self, offset: i64, limit: i64) -> RepositoryResult<Vec<Hotel>> {
            let offset = usize::try_from(offset).unwrap_or_default();
            let limit = usize::try_from(limit).unwrap_or_default();
            Ok(self
                .table()
                .rows
                .iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect())
        }

        async fn update(&self, id: i32, hotel: &HotelCandidate) -> RepositoryResult<Option<Hotel>> {
            let mut table = self.table();
            table.take_failure()?;
            if table.name_taken(&hotel.name, Some(id)) {
                return Err(duplicate_name());
            }
            let Some(slot) = table.rows.iter_mut().find(|h| h.id == id) else {
                return Ok(None);
            };
            *slot = to_hotel(id, hotel);
            Ok(Some(slot.clone()))
        }
    }

    /// User storage backed by a vector with a unique email constraint.
    #[derive(Default)]
    pub struct InMemoryUserStore {
        users: Mutex<Vec<User>>,
    }

    impl InMemoryUserStore {
        pub fn new() -> Self {
            Self::default()
        }

        fn users(&self) -> MutexGuard<'_, Vec<User>> {
            self.users.lock().expect("user table lock")
        }
    }

    fn to_user(id: i32, record: &UserRecord) -> User {
        User {
            id,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            password_hash: record.password_hash.clone(),
        }
    }

    #[rocket::async_trait]
    impl UserStore for InMemoryUserStore {
        async fn insert(&self, user: &UserRecord) -> UserStoreResult<User> {
            let mut users = self.users();
            if users.iter().any(|u| u.email == user.email) {
                return Err(UserStoreError::DuplicateEmail);
            }
            let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
            let created = to_user(id, user);
            users.push(created.clone());
            Ok(created)
        }

        async fn find_by_id(&self, id: i32) -> UserStoreResult<Option<User>> {
            Ok(self.users().iter().find(|u| u.id == id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> UserStoreResult<Option<User>> {
            Ok(self.users().iter().find(|u| u.email == email).cloned())
        }

        async fn update(&self, id: i32, user: &UserRecord) -> UserStoreResult<Option<User>> {
            let mut users = self.users();
            if users.iter().any(|u| u.email == user.email && u.id != id) {
                return Err(UserStoreError::DuplicateEmail);
            }
            let Some(slot) = users.iter_mut().find(|u| u.id == id) else {
                return Ok(None);
            };
            *slot = to_user(id, user);
            Ok(Some(slot.clone()))
        }
    }

    pub mod database {
        //! Throwaway Postgres databases for integration tests.

        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, Connection, PgPool};
        use testcontainers::ImageExt;
        use testcontainers_modules::postgres::Postgres;
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;
        use uuid::Uuid;

        use crate::db::MIGRATOR;

        const CONTAINER_OPT_IN: &str = "HOTELS_TEST_CONTAINERS";
        const POSTGRES_TAG: &str = "16-alpine";

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("no test database configured (TEST_DATABASE_URL or HOTELS_TEST_CONTAINERS)")]
            MissingUrl,
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// A migrated database with a random name. [`TestDatabase::close`]
        /// drops it again.
        pub struct TestDatabase {
            pool: PgPool,
            server: PgConnectOptions,
            name: String,
            _container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Use the server named by `TEST_DATABASE_URL`, or a disposable
            /// container when `HOTELS_TEST_CONTAINERS` is set. Returns
            /// [`TestDatabaseError::MissingUrl`] when neither is available so
            /// callers can skip.
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
                    return Self::create_on(&url, None).await;
                }
                if std::env::var_os(CONTAINER_OPT_IN).is_some() {
                    return Self::new().await;
                }
                Err(TestDatabaseError::MissingUrl)
            }

            /// Start a Postgres container and create the database inside it.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().with_tag(POSTGRES_TAG).start().await?;
                let url = format!(
                    "postgres://postgres:postgres@{}:{}/postgres",
                    container.get_host().await?,
                    container.get_host_port_ipv4(5432).await?
                );
                Self::create_on(&url, Some(container)).await
            }

            async fn create_on(
                url: &str,
                container: Option<ContainerAsync<Postgres>>,
            ) -> Result<Self, TestDatabaseError> {
                let options = url
                    .parse::<PgConnectOptions>()?
                    .log_statements(LevelFilter::Off);
                let server = options.clone().database("postgres");
                let name = format!("hotels_test_{}", Uuid::new_v4().simple());

                execute_on(
                    &server,
                    &format!("CREATE DATABASE \"{name}\" TEMPLATE template0"),
                )
                .await?;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(options.database(&name))
                    .await?;
                MIGRATOR.run(&pool).await?;
                log::debug!("provisioned test database {name}");

                Ok(Self {
                    pool,
                    server,
                    name,
                    _container: container,
                })
            }

            pub fn pool(&self) -> &PgPool {
                &self.pool
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool.clone()
            }

            /// Close the pool and drop the database.
            pub async fn close(self) -> Result<(), TestDatabaseError> {
                self.pool.close().await;
                execute_on(
                    &self.server,
                    &format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.name),
                )
                .await?;
                Ok(())
            }
        }

        async fn execute_on(server: &PgConnectOptions, sql: &str) -> Result<(), sqlx::Error> {
            let mut conn = server.connect().await?;
            sqlx::query(sql).execute(&mut conn).await?;
            conn.close().await
        }
    }

    /// Builder for Rocket instances used by integration tests: random port,
    /// logging off, the API catchers registered, and in-memory state.
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        hotel_service: Option<HotelService>,
        user_service: Option<UserService>,
        auth_state: Option<AuthState>,
    }

    impl Default for TestRocketBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestRocketBuilder {
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                mounts: Vec::new(),
                hotel_service: None,
                user_service: None,
                auth_state: None,
            }
        }

        /// Mount routes under `/api/v1`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/api/v1".to_string(), routes));
            self
        }

        /// Manage a [`HotelService`] over `repository`, applying the upload
        /// limits from `config`.
        pub fn with_hotel_repository(
            mut self,
            repository: Arc<dyn HotelRepository>,
            config: ImportConfig,
        ) -> Self {
            self.figment = self.figment.merge(("limits", config.limits()));
            self.hotel_service =
                Some(HotelService::new(repository, config).expect("hotel service"));
            self
        }

        /// Manage a [`UserService`] over `store` and the auth state built
        /// from [`test_auth_config`].
        pub fn with_user_store(mut self, store: Arc<dyn UserStore>) -> Self {
            let passwords = PasswordService::new().expect("password service");
            self.user_service = Some(UserService::new(store, Arc::new(passwords)));
            self.auth_state = Some(AuthState::new(test_auth_config()));
            self
        }

        pub fn build(self) -> Rocket<Build> {
            let mut rocket =
                rocket::custom(self.figment).register("/", crate::routes::catchers::all());

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }
            if let Some(service) = self.hotel_service {
                rocket = rocket.manage(service);
            }
            if let Some(service) = self.user_service {
                rocket = rocket.manage(service);
            }
            if let Some(state) = self.auth_state {
                rocket = rocket.manage(state);
            }

            rocket
        }

        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }
    }
}
