//! The authentication and session core: password hashing, access tokens,
//! refresh tokens and extracting credentials from request headers. Nothing in
//! here knows about HTTP routes, and nothing in here talks to the database
//! directly. Persistence goes through [`RefreshTokenStore`].

/// Issuing and verifying signed, short-lived access tokens (JWTs)
pub mod access_token;
/// Parsing the `Authorization` header into typed credentials
pub mod header;
/// Hashing and verifying user passwords
pub mod password;
/// Generating refresh tokens and the lifecycle the store has to follow
pub mod refresh_token;

mod error;

pub use self::{
	error::AuthError,
	header::{ApiKey, AuthenticatedUser, BearerToken},
	password::CredentialHasher,
	refresh_token::{RefreshTokenRecord, RefreshTokenState, RefreshTokenStore},
};
