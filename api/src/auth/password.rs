use std::sync::Arc;

use argon2::{
	password_hash::{PasswordHasher, PasswordVerifier, SaltString},
	Algorithm,
	Argon2,
	PasswordHash,
	Version,
};
use tokio::{sync::Semaphore, task};

use super::AuthError;
use crate::prelude::*;

/// Hashes and verifies passwords with Argon2id. The output is a PHC string,
/// which embeds the algorithm, parameters and a random salt, so a hash can be
/// verified without knowing how it was made.
///
/// The hasher is cheap to clone. All clones share the same worker budget:
/// hashing is deliberately slow, so at most `max_concurrent` hashes run at
/// any one time, each on the blocking thread pool.
#[derive(Clone)]
pub struct CredentialHasher {
	inner: Arc<HasherInner>,
}

struct HasherInner {
	pepper: Vec<u8>,
	dummy_hash: String,
	permits: Semaphore,
}

impl std::fmt::Debug for CredentialHasher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CredentialHasher")
			.field("available_permits", &self.inner.permits.available_permits())
			.finish_non_exhaustive()
	}
}

impl CredentialHasher {
	/// Creates a hasher that mixes `pepper` into every hash as the Argon2
	/// secret. This hashes a throwaway value once, so it takes a moment.
	pub fn new(pepper: impl Into<Vec<u8>>, max_concurrent: usize) -> Result<Self, AuthError> {
		let pepper = pepper.into();
		let dummy_hash = hash_with_pepper(&pepper, "chirpy-dummy-password")?;

		Ok(Self {
			inner: Arc::new(HasherInner {
				pepper,
				dummy_hash,
				permits: Semaphore::new(max_concurrent.max(1)),
			}),
		})
	}

	/// Hashes `secret` on the calling thread. Two calls with the same secret
	/// never return the same hash.
	pub fn hash(&self, secret: &str) -> Result<String, AuthError> {
		hash_with_pepper(&self.inner.pepper, secret)
	}

	/// Checks `secret` against a hash produced by [`Self::hash`]. A hash that
	/// can't even be parsed is reported as a mismatch, same as a wrong
	/// password.
	pub fn verify(&self, secret: &str, hash: &str) -> Result<(), AuthError> {
		let hash = PasswordHash::new(hash).map_err(|err| {
			warn!("Stored password hash could not be parsed: `{}`", err);
			AuthError::CredentialMismatch
		})?;

		argon2(&self.inner.pepper)?
			.verify_password(secret.as_bytes(), &hash)
			.map_err(|_| AuthError::CredentialMismatch)
	}

	/// Spends the same effort as [`Self::verify`] and always fails. Used when
	/// the user doesn't exist, so the response time doesn't tell an attacker
	/// whether an email is registered.
	pub fn verify_unknown_user(&self, secret: &str) -> AuthError {
		match self.verify(secret, &self.inner.dummy_hash) {
			Ok(()) | Err(AuthError::CredentialMismatch) => AuthError::CredentialMismatch,
			Err(err) => err,
		}
	}

	/// [`Self::hash`], run on the blocking pool within the worker budget
	pub async fn hash_async(&self, secret: String) -> Result<String, AuthError> {
		let _permit = self.acquire().await?;
		let hasher = self.clone();
		task::spawn_blocking(move || hasher.hash(&secret))
			.await
			.map_err(|err| AuthError::Internal(format!("hashing task failed: {err}")))?
	}

	/// [`Self::verify`], run on the blocking pool within the worker budget.
	/// Passing `None` as the hash runs [`Self::verify_unknown_user`].
	pub async fn verify_async(
		&self,
		secret: String,
		hash: Option<String>,
	) -> Result<(), AuthError> {
		let _permit = self.acquire().await?;
		let hasher = self.clone();
		task::spawn_blocking(move || match hash {
			Some(hash) => hasher.verify(&secret, &hash),
			None => Err(hasher.verify_unknown_user(&secret)),
		})
		.await
		.map_err(|err| AuthError::Internal(format!("verification task failed: {err}")))?
	}

	async fn acquire(&self) -> Result<tokio::sync::SemaphorePermit<'_>, AuthError> {
		self.inner
			.permits
			.acquire()
			.await
			.map_err(|err| AuthError::Internal(format!("hashing budget closed: {err}")))
	}
}

fn argon2(pepper: &[u8]) -> Result<Argon2<'_>, AuthError> {
	Argon2::new_with_secret(
		pepper,
		Algorithm::Argon2id,
		Version::V0x13,
		constants::HASHING_PARAMS,
	)
	.map_err(|err| {
		error!("Error creating Argon2: `{}`", err);
		AuthError::Internal(err.to_string())
	})
}

fn hash_with_pepper(pepper: &[u8], secret: &str) -> Result<String, AuthError> {
	argon2(pepper)?
		.hash_password(
			secret.as_bytes(),
			SaltString::generate(&mut rand::thread_rng()).as_salt(),
		)
		.map(|hash| hash.to_string())
		.map_err(|err| {
			error!("Error hashing password: `{}`", err);
			AuthError::Internal(err.to_string())
		})
}
