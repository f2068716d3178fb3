use std::future::Future;

use models::ErrorType;
use sqlx::{pool::PoolOptions, Pool};
use tokio_util::sync::CancellationToken;

use crate::prelude::*;

/// Creates the tables the API needs, if they don't exist yet
mod initializer;
/// The chirps table and the [`ChirpStore`] capability
mod chirp;
/// [`crate::auth::RefreshTokenStore`], backed by the refresh_tokens table
mod refresh_token;
/// The users table and the [`UserStore`] capability
mod user;

pub use self::{chirp::*, initializer::initialize, user::*};

/// The type of the database. A type alias is used here so that it can be
/// referenced everywhere easily
pub type DatabaseType = sqlx::Postgres;

/// The type of the database connection. A mutable reference to this should be
/// used as the parameter for database functions, since it accepts both a
/// connection and a transaction.
pub type DatabaseConnection = <DatabaseType as sqlx::Database>::Connection;

/// Everything that can go wrong talking to a store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(sqlx::Error),
	#[error("unique constraint violated")]
	UniqueViolation,
	#[error("operation cancelled before it completed")]
	Cancelled,
}

impl From<sqlx::Error> for StoreError {
	fn from(error: sqlx::Error) -> Self {
		match &error {
			sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
				Self::UniqueViolation
			}
			_ => Self::Database(error),
		}
	}
}

impl From<StoreError> for ErrorType {
	fn from(error: StoreError) -> Self {
		match error {
			StoreError::Cancelled => ErrorType::RequestTimedOut,
			err => {
				error!("Store failure: {}", err);
				ErrorType::server_error(err)
			}
		}
	}
}

/// The PostgreSQL implementation of every store the API uses
#[derive(Debug, Clone)]
pub struct PgStore {
	pool: Pool<DatabaseType>,
}

impl PgStore {
	pub fn new(pool: Pool<DatabaseType>) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &Pool<DatabaseType> {
		&self.pool
	}
}

/// Connects to the database based on a config. Not much to say here.
#[instrument(skip(config))]
pub async fn connect(config: &DatabaseConfig) -> Result<Pool<DatabaseType>, sqlx::Error> {
	info!(
		"Connecting to database `{}` at {}:{}",
		config.database, config.host, config.port
	);
	PoolOptions::<DatabaseType>::new()
		.max_connections(config.connection_limit)
		.connect_with(
			<DatabaseConnection as sqlx::Connection>::Options::new()
				.username(config.user.as_str())
				.password(config.password.as_str())
				.host(config.host.as_str())
				.port(config.port)
				.database(config.database.as_str()),
		)
		.await
}

/// Runs a single database statement, giving up with [`StoreError::Cancelled`]
/// as soon as `cancel` fires. A statement that was already sent may still
/// complete on the server.
pub(crate) async fn cancellable<F, T>(
	cancel: &CancellationToken,
	operation: F,
) -> Result<T, StoreError>
where
	F: Future<Output = Result<T, sqlx::Error>>,
{
	if cancel.is_cancelled() {
		return Err(StoreError::Cancelled);
	}

	tokio::select! {
		biased;
		_ = cancel.cancelled() => {
			debug!("Store operation cancelled");
			Err(StoreError::Cancelled)
		}
		result = operation => result.map_err(StoreError::from),
	}
}
