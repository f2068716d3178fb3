use std::fmt::{Display, Formatter};

use jsonwebtoken::{
	errors::ErrorKind,
	Algorithm,
	DecodingKey,
	EncodingKey,
	Header,
	TokenData,
	Validation,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Duration, OffsetDateTime};

use super::AuthError;
use crate::prelude::*;

/// Who minted a token. Only [`TokenIssuer::Access`] tokens are accepted as
/// access tokens; anything else that happens to be signed with the same key
/// is carried as [`TokenIssuer::Other`] so it can be rejected explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenIssuer {
	Access,
	Other(String),
}

impl TokenIssuer {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Access => constants::ACCESS_TOKEN_ISSUER,
			Self::Other(issuer) => issuer,
		}
	}
}

impl Display for TokenIssuer {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for TokenIssuer {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for TokenIssuer {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let issuer = String::deserialize(deserializer)?;
		Ok(if issuer == constants::ACCESS_TOKEN_ISSUER {
			Self::Access
		} else {
			Self::Other(issuer)
		})
	}
}

/// The claims encoded in every access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenData {
	pub iss: TokenIssuer,
	/// The user ID, as a hyphenated UUID string
	pub sub: String,
	#[serde(with = "time::serde::timestamp")]
	pub iat: OffsetDateTime,
	#[serde(with = "time::serde::timestamp")]
	pub exp: OffsetDateTime,
}

/// Issues an access token for `user_id`, valid for `validity` from now
pub fn issue(user_id: Uuid, secret: &str, validity: Duration) -> Result<String, AuthError> {
	issue_at(user_id, secret, validity, OffsetDateTime::now_utc())
}

/// Issues an access token as if the current time was `now`
pub fn issue_at(
	user_id: Uuid,
	secret: &str,
	validity: Duration,
	now: OffsetDateTime,
) -> Result<String, AuthError> {
	let exp = now
		.checked_add(validity)
		.ok_or_else(|| AuthError::Internal("access token expiry is out of range".into()))?;
	let claims = AccessTokenData {
		iss: TokenIssuer::Access,
		sub: user_id.to_string(),
		iat: now,
		exp,
	};

	jsonwebtoken::encode(
		&Header::new(Algorithm::HS256),
		&claims,
		&EncodingKey::from_secret(secret.as_bytes()),
	)
	.map_err(|err| {
		error!("Error encoding JWT: `{}`", err);
		AuthError::Internal(err.to_string())
	})
}

/// Verifies an access token and returns the user it was issued to
pub fn verify(token: &str, secret: &str) -> Result<Uuid, AuthError> {
	verify_at(token, secret, OffsetDateTime::now_utc())
}

/// Verifies an access token as if the current time was `now`. The token is
/// valid from its `iat` up to, but not including, its `exp`.
pub fn verify_at(token: &str, secret: &str, now: OffsetDateTime) -> Result<Uuid, AuthError> {
	let TokenData { header: _, claims } = jsonwebtoken::decode::<AccessTokenData>(
		token,
		&DecodingKey::from_secret(secret.as_bytes()),
		&{
			let mut validation = Validation::new(Algorithm::HS256);

			// Expiry is checked below, without any leeway
			validation.validate_exp = false;
			validation.validate_nbf = false;

			validation
		},
	)
	.map_err(|err| match err.kind() {
		ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
			debug!("JWT signature rejected: {}", err);
			AuthError::SignatureInvalid
		}
		_ => {
			debug!("Invalid JWT provided: {}", err);
			AuthError::TokenMalformed
		}
	})?;
	trace!("JWT signature valid");

	if claims.iss != TokenIssuer::Access {
		debug!("Invalid JWT issuer: {}", claims.iss);
		return Err(AuthError::IssuerMismatch);
	}

	if now >= claims.exp {
		debug!("JWT expired at {}", claims.exp);
		return Err(AuthError::TokenExpired);
	}

	Uuid::parse_str(&claims.sub).map_err(|err| {
		debug!("JWT subject `{}` is not a valid UUID: {}", claims.sub, err);
		AuthError::SubjectUnparsable
	})
}
