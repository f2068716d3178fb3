use async_trait::async_trait;
use models::api::user::User;
use sqlx::{query, query_as};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use super::{cancellable, DatabaseConnection, PgStore, StoreError};
use crate::prelude::*;

/// A user as it is stored, including the password hash that must never leave
/// the server
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
	pub id: Uuid,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub email: String,
	pub hashed_password: String,
	pub is_chirpy_red: bool,
}

impl From<UserRecord> for User {
	fn from(record: UserRecord) -> Self {
		Self {
			id: record.id,
			created_at: record.created_at,
			updated_at: record.updated_at,
			email: record.email,
			is_chirpy_red: record.is_chirpy_red,
		}
	}
}

/// The user-lookup capability. Emails are unique; writes that would
/// duplicate one fail with [`StoreError::UniqueViolation`].
#[async_trait]
pub trait UserStore: Send + Sync {
	async fn create_user(
		&self,
		email: &str,
		hashed_password: &str,
		cancel: &CancellationToken,
	) -> Result<UserRecord, StoreError>;

	async fn get_user_by_email(
		&self,
		email: &str,
		cancel: &CancellationToken,
	) -> Result<Option<UserRecord>, StoreError>;

	/// Replaces a user's email and password hash. Returns `None` if the user
	/// doesn't exist.
	async fn update_user_credentials(
		&self,
		user_id: Uuid,
		email: &str,
		hashed_password: &str,
		cancel: &CancellationToken,
	) -> Result<Option<UserRecord>, StoreError>;

	/// Returns `false` if the user doesn't exist
	async fn upgrade_user_to_chirpy_red(
		&self,
		user_id: Uuid,
		cancel: &CancellationToken,
	) -> Result<bool, StoreError>;
}

pub(super) async fn initialize_user_tables(
	connection: &mut DatabaseConnection,
) -> Result<(), sqlx::Error> {
	info!("Initializing user tables");
	query(
		r#"
		CREATE TABLE IF NOT EXISTS users(
			id UUID CONSTRAINT users_pk PRIMARY KEY,
			created_at TIMESTAMPTZ NOT NULL,
			updated_at TIMESTAMPTZ NOT NULL,
			email TEXT NOT NULL CONSTRAINT users_uq_email UNIQUE,
			hashed_password TEXT NOT NULL,
			is_chirpy_red BOOLEAN NOT NULL DEFAULT FALSE
		);
		"#,
	)
	.execute(&mut *connection)
	.await?;

	Ok(())
}

#[async_trait]
impl UserStore for PgStore {
	#[instrument(skip(self, hashed_password, cancel))]
	async fn create_user(
		&self,
		email: &str,
		hashed_password: &str,
		cancel: &CancellationToken,
	) -> Result<UserRecord, StoreError> {
		cancellable(
			cancel,
			query_as::<_, UserRecord>(
				r#"
				INSERT INTO
					users(
						id,
						created_at,
						updated_at,
						email,
						hashed_password
					)
				VALUES
					($1, NOW(), NOW(), $2, $3)
				RETURNING
					*;
				"#,
			)
			.bind(Uuid::new_v4())
			.bind(email)
			.bind(hashed_password)
			.fetch_one(self.pool()),
		)
		.await
	}

	#[instrument(skip(self, cancel))]
	async fn get_user_by_email(
		&self,
		email: &str,
		cancel: &CancellationToken,
	) -> Result<Option<UserRecord>, StoreError> {
		cancellable(
			cancel,
			query_as::<_, UserRecord>(
				r#"
				SELECT
					*
				FROM
					users
				WHERE
					email = $1;
				"#,
			)
			.bind(email)
			.fetch_optional(self.pool()),
		)
		.await
	}

	#[instrument(skip(self, hashed_password, cancel))]
	async fn update_user_credentials(
		&self,
		user_id: Uuid,
		email: &str,
		hashed_password: &str,
		cancel: &CancellationToken,
	) -> Result<Option<UserRecord>, StoreError> {
		cancellable(
			cancel,
			query_as::<_, UserRecord>(
				r#"
				UPDATE
					users
				SET
					email = $2,
					hashed_password = $3,
					updated_at = NOW()
				WHERE
					id = $1
				RETURNING
					*;
				"#,
			)
			.bind(user_id)
			.bind(email)
			.bind(hashed_password)
			.fetch_optional(self.pool()),
		)
		.await
	}

	#[instrument(skip(self, cancel))]
	async fn upgrade_user_to_chirpy_red(
		&self,
		user_id: Uuid,
		cancel: &CancellationToken,
	) -> Result<bool, StoreError> {
		let result = cancellable(
			cancel,
			query(
				r#"
				UPDATE
					users
				SET
					is_chirpy_red = TRUE,
					updated_at = NOW()
				WHERE
					id = $1;
				"#,
			)
			.bind(user_id)
			.execute(self.pool()),
		)
		.await?;

		Ok(result.rows_affected() > 0)
	}
}
