use async_trait::async_trait;
use sqlx::{query, query_as};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use super::{cancellable, DatabaseConnection, PgStore, StoreError};
use crate::{
	auth::{RefreshTokenRecord, RefreshTokenStore},
	prelude::*,
};

pub(super) async fn initialize_refresh_token_tables(
	connection: &mut DatabaseConnection,
) -> Result<(), sqlx::Error> {
	info!("Initializing refresh token tables");
	query(
		r#"
		CREATE TABLE IF NOT EXISTS refresh_tokens(
			token TEXT CONSTRAINT refresh_tokens_pk PRIMARY KEY,
			created_at TIMESTAMPTZ NOT NULL,
			updated_at TIMESTAMPTZ NOT NULL,
			user_id UUID NOT NULL
				CONSTRAINT refresh_tokens_fk_user_id REFERENCES users(id) ON DELETE CASCADE,
			expires_at TIMESTAMPTZ NOT NULL,
			revoked_at TIMESTAMPTZ
		);
		"#,
	)
	.execute(&mut *connection)
	.await?;

	Ok(())
}

#[async_trait]
impl RefreshTokenStore for PgStore {
	#[instrument(skip(self, token, cancel))]
	async fn save(
		&self,
		token: &str,
		user_id: Uuid,
		expires_at: OffsetDateTime,
		cancel: &CancellationToken,
	) -> Result<(), StoreError> {
		cancellable(
			cancel,
			query(
				r#"
				INSERT INTO
					refresh_tokens(
						token,
						created_at,
						updated_at,
						user_id,
						expires_at,
						revoked_at
					)
				VALUES
					($1, NOW(), NOW(), $2, $3, NULL);
				"#,
			)
			.bind(token)
			.bind(user_id)
			.bind(expires_at)
			.execute(self.pool()),
		)
		.await?;

		Ok(())
	}

	#[instrument(skip_all)]
	async fn lookup_active(
		&self,
		token: &str,
		cancel: &CancellationToken,
	) -> Result<Option<Uuid>, StoreError> {
		let record = cancellable(
			cancel,
			query_as::<_, RefreshTokenRecord>(
				r#"
				SELECT
					*
				FROM
					refresh_tokens
				WHERE
					token = $1;
				"#,
			)
			.bind(token)
			.fetch_optional(self.pool()),
		)
		.await?;

		Ok(record.and_then(|record| record.active_user_at(OffsetDateTime::now_utc())))
	}

	#[instrument(skip_all)]
	async fn revoke(&self, token: &str, cancel: &CancellationToken) -> Result<bool, StoreError> {
		let result = cancellable(
			cancel,
			query(
				r#"
				UPDATE
					refresh_tokens
				SET
					revoked_at = NOW(),
					updated_at = NOW()
				WHERE
					token = $1 AND
					revoked_at IS NULL;
				"#,
			)
			.bind(token)
			.execute(self.pool()),
		)
		.await?;

		Ok(result.rows_affected() > 0)
	}
}
