use async_trait::async_trait;
use rand::RngCore;
use time::{Duration, OffsetDateTime};
use tokio_util::sync::CancellationToken;

use super::AuthError;
use crate::{db::StoreError, prelude::*};

/// Generates a new refresh token: 32 bytes from the OS random source, hex
/// encoded into 64 lowercase characters. Uniqueness is left to the store.
pub fn generate() -> String {
	let mut bytes = [0u8; constants::REFRESH_TOKEN_BYTES];
	rand::rngs::OsRng.fill_bytes(&mut bytes);
	hex::encode(bytes)
}

/// A refresh token as it is stored. Rows are never deleted, only marked as
/// revoked.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshTokenRecord {
	pub token: String,
	pub user_id: Uuid,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub expires_at: OffsetDateTime,
	pub revoked_at: Option<OffsetDateTime>,
}

/// Where a refresh token is in its lifecycle at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
	/// Can be exchanged for access tokens
	Active,
	/// Explicitly revoked. Takes precedence over expiry
	Revoked,
	/// Past its expiry and never revoked
	Expired,
}

impl RefreshTokenRecord {
	pub fn new(token: String, user_id: Uuid, expires_at: OffsetDateTime) -> Self {
		let now = OffsetDateTime::now_utc();
		Self {
			token,
			user_id,
			created_at: now,
			updated_at: now,
			expires_at,
			revoked_at: None,
		}
	}

	pub fn state_at(&self, now: OffsetDateTime) -> RefreshTokenState {
		if self.revoked_at.is_some() {
			RefreshTokenState::Revoked
		} else if now >= self.expires_at {
			RefreshTokenState::Expired
		} else {
			RefreshTokenState::Active
		}
	}

	/// The user this token was issued to, if it can still be used
	pub fn active_user_at(&self, now: OffsetDateTime) -> Option<Uuid> {
		(self.state_at(now) == RefreshTokenState::Active).then_some(self.user_id)
	}
}

/// What the auth core needs from whatever persists refresh tokens. Every call
/// takes the request's [`CancellationToken`] and should give up with
/// [`StoreError::Cancelled`] once it fires. Each operation must be atomic on
/// its own, so that a revocation that has completed is never followed by a
/// successful lookup.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
	/// Persists a newly generated token for `user_id`
	async fn save(
		&self,
		token: &str,
		user_id: Uuid,
		expires_at: OffsetDateTime,
		cancel: &CancellationToken,
	) -> Result<(), StoreError>;

	/// Returns the owner of `token`, or `None` if the token doesn't exist, has
	/// been revoked or has expired
	async fn lookup_active(
		&self,
		token: &str,
		cancel: &CancellationToken,
	) -> Result<Option<Uuid>, StoreError>;

	/// Marks `token` as revoked. Returns `false` if there was no token to
	/// revoke, including when it had already been revoked. Revocation is
	/// scoped to the token alone: whoever holds it may revoke it.
	async fn revoke(&self, token: &str, cancel: &CancellationToken) -> Result<bool, StoreError>;
}

/// Generates a refresh token for `user_id` and stores it with the given
/// validity
#[instrument(skip(store, cancel))]
pub async fn issue(
	store: &dyn RefreshTokenStore,
	user_id: Uuid,
	validity: Duration,
	cancel: &CancellationToken,
) -> Result<String, AuthError> {
	let expires_at = OffsetDateTime::now_utc()
		.checked_add(validity)
		.ok_or_else(|| AuthError::Internal("refresh token expiry is out of range".into()))?;
	let token = generate();
	store.save(&token, user_id, expires_at, cancel).await?;
	trace!("Refresh token stored");

	Ok(token)
}

/// Looks up the user an active refresh token belongs to
#[instrument(skip_all)]
pub async fn redeem(
	store: &dyn RefreshTokenStore,
	token: &str,
	cancel: &CancellationToken,
) -> Result<Uuid, AuthError> {
	store
		.lookup_active(token, cancel)
		.await?
		.ok_or_else(|| {
			debug!("Refresh token is unknown, revoked or expired");
			AuthError::RefreshTokenNotFound
		})
}

/// Revokes a refresh token so it can't be redeemed again
#[instrument(skip_all)]
pub async fn revoke(
	store: &dyn RefreshTokenStore,
	token: &str,
	cancel: &CancellationToken,
) -> Result<(), AuthError> {
	if store.revoke(token, cancel).await? {
		Ok(())
	} else {
		debug!("No active refresh token to revoke");
		Err(AuthError::RefreshTokenNotFound)
	}
}
