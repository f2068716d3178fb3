use axum::{
	extract::FromRequestParts,
	http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use models::ErrorType;

use super::{access_token, AuthError};
use crate::{app::AppState, prelude::*};

/// The schemes we accept in the `Authorization` header. They are distinct so
/// that an API key can never be presented as a bearer token, or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
	/// `Authorization: Bearer <token>`, carrying an access or refresh token
	Bearer,
	/// `Authorization: ApiKey <key>`, used only by the payment webhook
	ApiKey,
}

impl AuthScheme {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Bearer => "Bearer",
			Self::ApiKey => "ApiKey",
		}
	}
}

/// A token sent as `Authorization: Bearer <token>`. Whether it is an access
/// token or a refresh token depends on the endpoint that receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

/// A key sent as `Authorization: ApiKey <key>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey(pub String);

/// Extracts a bearer token from the `Authorization` header
pub fn extract_bearer(headers: &HeaderMap) -> Result<BearerToken, AuthError> {
	extract_credential(headers, AuthScheme::Bearer).map(BearerToken)
}

/// Extracts an API key from the `Authorization` header
pub fn extract_api_key(headers: &HeaderMap) -> Result<ApiKey, AuthError> {
	extract_credential(headers, AuthScheme::ApiKey).map(ApiKey)
}

/// The header must be exactly `<scheme> <credential>`: two segments separated
/// by a single space, the first of which is the scheme literal. Credentials
/// can't contain spaces.
fn extract_credential(headers: &HeaderMap, scheme: AuthScheme) -> Result<String, AuthError> {
	let value = headers
		.get(AUTHORIZATION)
		.filter(|value| !value.is_empty())
		.ok_or(AuthError::AuthHeaderMissing)?
		.to_str()
		.map_err(|_| AuthError::AuthHeaderMalformed)?;

	match value.split(' ').collect::<Vec<_>>().as_slice() {
		[found, credential] if *found == scheme.as_str() && !credential.is_empty() => {
			Ok((*credential).to_string())
		}
		_ => Err(AuthError::AuthHeaderMalformed),
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
	S: Send + Sync,
{
	type Rejection = ErrorType;

	async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
		extract_bearer(&parts.headers).map_err(|err| {
			debug!("Rejecting bearer credential: {}", err);
			err.into()
		})
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ApiKey
where
	S: Send + Sync,
{
	type Rejection = ErrorType;

	async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
		extract_api_key(&parts.headers).map_err(|err| {
			debug!("Rejecting API key credential: {}", err);
			err.into()
		})
	}
}

/// The user a request is made on behalf of, taken from a valid access token
/// in the `Authorization: Bearer` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
	type Rejection = ErrorType;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

		access_token::verify(&token, &state.config.jwt_secret)
			.map(Self)
			.map_err(|err| {
				if err.is_access_token_rejection() {
					info!("Access token rejected: {}", err);
				} else {
					error!("Unable to verify access token: {}", err);
				}
				err.into()
			})
	}
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderValue;

	use super::*;

	fn headers(value: Option<&'static str>) -> HeaderMap {
		let mut headers = HeaderMap::new();
		if let Some(value) = value {
			headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
		}
		headers
	}

	#[test]
	fn extracts_bearer_tokens() {
		assert_eq!(
			extract_bearer(&headers(Some("Bearer abc123"))).unwrap(),
			BearerToken("abc123".to_string())
		);
	}

	#[test]
	fn missing_or_empty_header_is_missing() {
		for value in [None, Some("")] {
			assert!(matches!(
				extract_bearer(&headers(value)),
				Err(AuthError::AuthHeaderMissing)
			));
			assert!(matches!(
				extract_api_key(&headers(value)),
				Err(AuthError::AuthHeaderMissing)
			));
		}
	}

	#[test]
	fn malformed_bearer_headers() {
		for value in [
			"Basic abc123",
			"Bearerabc123",
			"Bearer",
			"Bearer ",
			"bearer abc123",
			"Bearer abc 123",
			"Bearer  abc123",
		] {
			assert!(
				matches!(
					extract_bearer(&headers(Some(value))),
					Err(AuthError::AuthHeaderMalformed)
				),
				"`{value}` should be malformed"
			);
		}
	}

	#[test]
	fn extracts_api_keys() {
		assert_eq!(
			extract_api_key(&headers(Some("ApiKey f271c81ff7084ee5b99a5091b42d486e"))).unwrap(),
			ApiKey("f271c81ff7084ee5b99a5091b42d486e".to_string())
		);
		assert!(matches!(
			extract_api_key(&headers(Some("ApiKey"))),
			Err(AuthError::AuthHeaderMalformed)
		));
	}

	#[test]
	fn schemes_do_not_cross() {
		assert!(matches!(
			extract_api_key(&headers(Some("Bearer abc123"))),
			Err(AuthError::AuthHeaderMalformed)
		));
		assert!(matches!(
			extract_bearer(&headers(Some("ApiKey abc123"))),
			Err(AuthError::AuthHeaderMalformed)
		));
	}

	#[test]
	fn non_ascii_headers_are_malformed() {
		let mut headers = HeaderMap::new();
		headers.insert(
			AUTHORIZATION,
			HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
		);

		assert!(matches!(
			extract_bearer(&headers),
			Err(AuthError::AuthHeaderMalformed)
		));
	}
}
