use async_trait::async_trait;
use models::api::chirp::{Chirp, SortOrder};
use sqlx::{query, query_as};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use super::{cancellable, DatabaseConnection, PgStore, StoreError};
use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ChirpRecord {
	pub id: Uuid,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub body: String,
	pub user_id: Uuid,
}

impl From<ChirpRecord> for Chirp {
	fn from(record: ChirpRecord) -> Self {
		Self {
			id: record.id,
			created_at: record.created_at,
			updated_at: record.updated_at,
			body: record.body,
			user_id: record.user_id,
		}
	}
}

#[async_trait]
pub trait ChirpStore: Send + Sync {
	async fn create_chirp(
		&self,
		user_id: Uuid,
		body: &str,
		cancel: &CancellationToken,
	) -> Result<ChirpRecord, StoreError>;

	/// Lists chirps by the time they were posted, optionally only those
	/// written by `author_id`
	async fn list_chirps(
		&self,
		author_id: Option<Uuid>,
		sort: SortOrder,
		cancel: &CancellationToken,
	) -> Result<Vec<ChirpRecord>, StoreError>;

	async fn get_chirp(
		&self,
		chirp_id: Uuid,
		cancel: &CancellationToken,
	) -> Result<Option<ChirpRecord>, StoreError>;

	/// Returns `false` if there was no such chirp
	async fn delete_chirp(
		&self,
		chirp_id: Uuid,
		cancel: &CancellationToken,
	) -> Result<bool, StoreError>;
}

pub(super) async fn initialize_chirp_tables(
	connection: &mut DatabaseConnection,
) -> Result<(), sqlx::Error> {
	info!("Initializing chirp tables");
	query(
		r#"
		CREATE TABLE IF NOT EXISTS chirps(
			id UUID CONSTRAINT chirps_pk PRIMARY KEY,
			created_at TIMESTAMPTZ NOT NULL,
			updated_at TIMESTAMPTZ NOT NULL,
			body TEXT NOT NULL,
			user_id UUID NOT NULL
				CONSTRAINT chirps_fk_user_id REFERENCES users(id) ON DELETE CASCADE
		);
		"#,
	)
	.execute(&mut *connection)
	.await?;

	query(
		r#"
		CREATE INDEX IF NOT EXISTS
			chirps_idx_user_id_created_at
		ON
			chirps(user_id, created_at);
		"#,
	)
	.execute(&mut *connection)
	.await?;

	Ok(())
}

#[async_trait]
impl ChirpStore for PgStore {
	#[instrument(skip(self, body, cancel))]
	async fn create_chirp(
		&self,
		user_id: Uuid,
		body: &str,
		cancel: &CancellationToken,
	) -> Result<ChirpRecord, StoreError> {
		cancellable(
			cancel,
			query_as::<_, ChirpRecord>(
				r#"
				INSERT INTO
					chirps(
						id,
						created_at,
						updated_at,
						body,
						user_id
					)
				VALUES
					($1, NOW(), NOW(), $2, $3)
				RETURNING
					*;
				"#,
			)
			.bind(Uuid::new_v4())
			.bind(body)
			.bind(user_id)
			.fetch_one(self.pool()),
		)
		.await
	}

	#[instrument(skip(self, cancel))]
	async fn list_chirps(
		&self,
		author_id: Option<Uuid>,
		sort: SortOrder,
		cancel: &CancellationToken,
	) -> Result<Vec<ChirpRecord>, StoreError> {
		// The sort direction can't be a bind parameter
		let statement = match sort {
			SortOrder::Asc => {
				r#"
				SELECT
					*
				FROM
					chirps
				WHERE
					$1::UUID IS NULL OR
					user_id = $1
				ORDER BY
					created_at ASC;
				"#
			}
			SortOrder::Desc => {
				r#"
				SELECT
					*
				FROM
					chirps
				WHERE
					$1::UUID IS NULL OR
					user_id = $1
				ORDER BY
					created_at DESC;
				"#
			}
		};

		cancellable(
			cancel,
			query_as::<_, ChirpRecord>(statement)
				.bind(author_id)
				.fetch_all(self.pool()),
		)
		.await
	}

	#[instrument(skip(self, cancel))]
	async fn get_chirp(
		&self,
		chirp_id: Uuid,
		cancel: &CancellationToken,
	) -> Result<Option<ChirpRecord>, StoreError> {
		cancellable(
			cancel,
			query_as::<_, ChirpRecord>(
				r#"
				SELECT
					*
				FROM
					chirps
				WHERE
					id = $1;
				"#,
			)
			.bind(chirp_id)
			.fetch_optional(self.pool()),
		)
		.await
	}

	#[instrument(skip(self, cancel))]
	async fn delete_chirp(
		&self,
		chirp_id: Uuid,
		cancel: &CancellationToken,
	) -> Result<bool, StoreError> {
		let result = cancellable(
			cancel,
			query(
				r#"
				DELETE FROM
					chirps
				WHERE
					id = $1;
				"#,
			)
			.bind(chirp_id)
			.execute(self.pool()),
		)
		.await?;

		Ok(result.rows_affected() > 0)
	}
}
