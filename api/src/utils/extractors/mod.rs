use axum::{
	extract::{FromRequest, FromRequestParts, Path, Query, Request},
	http::request::Parts,
	Json,
};
use models::ErrorType;
use serde::de::DeserializeOwned;

use crate::prelude::*;

/// A path parameter that rejects with [`ErrorType::WrongParameters`] instead
/// of axum's plain text rejection
#[derive(Debug, Clone)]
pub struct DecodedPath<T>(pub T);

/// Query parameters that reject with [`ErrorType::WrongParameters`]
#[derive(Debug, Clone)]
pub struct DecodedQuery<T>(pub T);

/// A JSON body that rejects with [`ErrorType::WrongParameters`], whatever is
/// wrong with it
#[derive(Debug, Clone)]
pub struct DecodedJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for DecodedPath<T>
where
	S: Send + Sync,
	T: DeserializeOwned + Send,
{
	type Rejection = ErrorType;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let Path(value) = Path::<T>::from_request_parts(parts, state)
			.await
			.map_err(|err| {
				debug!("Failed to parse path `{}`: {}", parts.uri.path(), err);
				ErrorType::WrongParameters
			})?;
		Ok(Self(value))
	}
}

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for DecodedQuery<T>
where
	S: Send + Sync,
	T: DeserializeOwned,
{
	type Rejection = ErrorType;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let Query(value) = Query::<T>::from_request_parts(parts, state)
			.await
			.map_err(|err| {
				debug!("Failed to parse query {:?}: {}", parts.uri.query(), err);
				ErrorType::WrongParameters
			})?;
		Ok(Self(value))
	}
}

#[axum::async_trait]
impl<S, T> FromRequest<S> for DecodedJson<T>
where
	S: Send + Sync,
	T: DeserializeOwned,
{
	type Rejection = ErrorType;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let Json(value) = Json::<T>::from_request(req, state)
			.await
			.map_err(|err| {
				debug!("Failed to parse body: {}", err);
				ErrorType::WrongParameters
			})?;
		Ok(Self(value))
	}
}
