use sqlx::query;

use super::{chirp, refresh_token, user, DatabaseType};
use crate::prelude::*;

/// Creates every table the API uses. Tables that already exist are left
/// alone, so this is safe to run on every startup.
#[instrument(skip(pool))]
pub async fn initialize(pool: &sqlx::Pool<DatabaseType>) -> Result<(), sqlx::Error> {
	info!("Initializing database");

	let mut transaction = pool.begin().await?;

	// Serialize concurrent startups so they don't race on CREATE TABLE
	query("SELECT pg_advisory_xact_lock(1);")
		.execute(&mut *transaction)
		.await?;

	user::initialize_user_tables(&mut transaction).await?;
	chirp::initialize_chirp_tables(&mut transaction).await?;
	refresh_token::initialize_refresh_token_tables(&mut transaction).await?;

	transaction.commit().await?;

	info!("Database initialized");
	Ok(())
}
