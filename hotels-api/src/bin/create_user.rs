use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use hotels_api::auth::PasswordService;
use hotels_api::models::CreateUserRequest;
use hotels_api::users::{PgUserStore, UserService, UserServiceError};

#[derive(Parser, Debug)]
#[command(name = "create_user", about = "Provision a hotels API user account")]
struct Args {
    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    #[arg(long)]
    email: String,

    /// Plaintext password; must contain lower and upper case letters and a digit.
    #[arg(long)]
    password: String,

    /// Defaults to `DATABASE_URL`.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&args.database_url)
        .await?;
    hotels_api::db::run_migrations(&pool).await?;

    let passwords = PasswordService::new()
        .map_err(|err| io::Error::other(format!("argon2 init failed: {err}")))?;
    let service = UserService::new(Arc::new(PgUserStore::new(pool)), Arc::new(passwords));

    let request = CreateUserRequest {
        first_name: Some(args.first_name),
        last_name: Some(args.last_name),
        email: Some(args.email.trim().to_string()),
        password: Some(args.password),
    };

    match service.create(request).await {
        Ok(user) => {
            println!("Created user '{}' with id {}", user.email, user.id);
            Ok(())
        }
        Err(UserServiceError::Invalid(violations)) => {
            for violation in violations {
                writeln!(io::stderr(), "error: {violation}")?;
            }
            std::process::exit(1);
        }
        Err(UserServiceError::DuplicateEmail) => {
            writeln!(io::stderr(), "error: a user with that email already exists")?;
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
