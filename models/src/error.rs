use std::{
	fmt::{Display, Formatter},
	mem,
};

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::{Deserialize, Serialize};

/// A list of all the possible errors that can be returned by the API
#[derive(Debug)]
pub enum ErrorType {
	/// The parameters sent with the request are invalid. This covers bodies
	/// that aren't valid JSON, unknown query values and malformed path IDs
	WrongParameters,
	/// The request did not have an `Authorization` header
	MissingAuthorizationHeader,
	/// The `Authorization` header was not of the form `<Scheme> <credential>`
	MalformedAuthorizationHeader,
	/// The email provided is not a valid email address
	InvalidEmail,
	/// The chirp body is longer than the maximum allowed length
	ChirpTooLong,
	/// Either no user exists with that email, or the password does not
	/// match. The two cases are deliberately not distinguished
	IncorrectCredentials,
	/// The access token (JWT) provided is malformed, expired, or not signed
	/// by this server
	InvalidAccessToken,
	/// The refresh token provided does not exist, has been revoked or has
	/// expired
	InvalidRefreshToken,
	/// The API key used to call the webhook is not the configured one
	InvalidApiKey,
	/// The user tried to delete a chirp they did not write
	NotChirpAuthor,
	/// The resource that the user is trying to access does not exist
	ResourceDoesNotExist,
	/// The user referenced by the request was not found
	UserNotFound,
	/// The email provided is not available. It is being used by another account
	EmailUnavailable,
	/// The request took longer than the server is willing to wait
	RequestTimedOut,
	/// An internal server error occurred. This should not happen unless there
	/// is a bug in the server or the database is unavailable
	InternalServerError(anyhow::Error),
}

impl ErrorType {
	/// Returns the status code that should be used for this error
	pub fn default_status_code(&self) -> StatusCode {
		match self {
			Self::WrongParameters => StatusCode::BAD_REQUEST,
			Self::MissingAuthorizationHeader => StatusCode::BAD_REQUEST,
			Self::MalformedAuthorizationHeader => StatusCode::BAD_REQUEST,
			Self::InvalidEmail => StatusCode::BAD_REQUEST,
			Self::ChirpTooLong => StatusCode::BAD_REQUEST,
			Self::IncorrectCredentials => StatusCode::UNAUTHORIZED,
			Self::InvalidAccessToken => StatusCode::UNAUTHORIZED,
			Self::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
			Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
			Self::NotChirpAuthor => StatusCode::FORBIDDEN,
			Self::ResourceDoesNotExist => StatusCode::NOT_FOUND,
			Self::UserNotFound => StatusCode::NOT_FOUND,
			Self::EmailUnavailable => StatusCode::CONFLICT,
			Self::RequestTimedOut => StatusCode::SERVICE_UNAVAILABLE,
			Self::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Returns the message that should be used for this error. This is the
	/// message that is user-friendly and can be shown to the user. It never
	/// says which authentication check failed
	pub fn message(&self) -> &'static str {
		match self {
			Self::WrongParameters => "The parameters sent with that request are invalid",
			Self::MissingAuthorizationHeader => "No authorization header was included in the request",
			Self::MalformedAuthorizationHeader => "The authorization header is malformed",
			Self::InvalidEmail => "Invalid email",
			Self::ChirpTooLong => "Chirp is too long",
			Self::IncorrectCredentials => "Incorrect email or password",
			Self::InvalidAccessToken => "Invalid access token",
			Self::InvalidRefreshToken => "Invalid refresh token",
			Self::InvalidApiKey => "API key is invalid",
			Self::NotChirpAuthor => "You can only delete your own chirps",
			Self::ResourceDoesNotExist => "The resource you are trying to access does not exist",
			Self::UserNotFound => "Couldn't find user",
			Self::EmailUnavailable => "An account already exists with that email",
			Self::RequestTimedOut => "The request took too long to complete",
			Self::InternalServerError(_) => "An internal server error has occured",
		}
	}

	/// Creates an [`ErrorType::InternalServerError`] with the given message
	pub fn server_error(message: impl Display) -> Self {
		Self::InternalServerError(anyhow::anyhow!(message.to_string()))
	}
}

impl PartialEq for ErrorType {
	fn eq(&self, other: &Self) -> bool {
		mem::discriminant(self) == mem::discriminant(other)
	}
}

impl Eq for ErrorType {}

impl Display for ErrorType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.message())
	}
}

impl From<anyhow::Error> for ErrorType {
	fn from(error: anyhow::Error) -> Self {
		Self::InternalServerError(error)
	}
}

/// The body sent along with every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponseBody {
	/// The user-friendly error message
	pub error: String,
}

impl IntoResponse for ErrorType {
	fn into_response(self) -> Response {
		(
			self.default_status_code(),
			Json(ApiErrorResponseBody {
				error: self.message().to_string(),
			}),
		)
			.into_response()
	}
}
