use models::ErrorType;

use crate::db::StoreError;

/// Everything that can go wrong while authenticating a request. Each variant
/// is distinguishable here so it can be logged, but the HTTP layer collapses
/// them into a handful of deliberately vague [`ErrorType`]s.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("no authorization header included in request")]
	AuthHeaderMissing,
	#[error("malformed authorization header")]
	AuthHeaderMalformed,
	#[error("token is not a well-formed JWT")]
	TokenMalformed,
	#[error("token signature is invalid")]
	SignatureInvalid,
	#[error("token has expired")]
	TokenExpired,
	#[error("token was not issued for access")]
	IssuerMismatch,
	#[error("token subject is not a valid user ID")]
	SubjectUnparsable,
	#[error("credentials do not match")]
	CredentialMismatch,
	#[error("refresh token not found, revoked or expired")]
	RefreshTokenNotFound,
	#[error("persistence failure: {0}")]
	PersistenceFailure(#[from] StoreError),
	#[error("internal authentication error: {0}")]
	Internal(String),
}

impl AuthError {
	/// Whether this error came from checking an access token, as opposed to
	/// the header it was carried in or the store behind it
	pub fn is_access_token_rejection(&self) -> bool {
		matches!(
			self,
			Self::TokenMalformed |
				Self::SignatureInvalid |
				Self::TokenExpired |
				Self::IssuerMismatch |
				Self::SubjectUnparsable
		)
	}
}

impl From<AuthError> for ErrorType {
	fn from(error: AuthError) -> Self {
		match error {
			AuthError::AuthHeaderMissing => ErrorType::MissingAuthorizationHeader,
			AuthError::AuthHeaderMalformed => ErrorType::MalformedAuthorizationHeader,
			AuthError::TokenMalformed |
			AuthError::SignatureInvalid |
			AuthError::TokenExpired |
			AuthError::IssuerMismatch |
			AuthError::SubjectUnparsable => ErrorType::InvalidAccessToken,
			AuthError::CredentialMismatch => ErrorType::IncorrectCredentials,
			AuthError::RefreshTokenNotFound => ErrorType::InvalidRefreshToken,
			AuthError::PersistenceFailure(err) => err.into(),
			AuthError::Internal(message) => ErrorType::server_error(message),
		}
	}
}
