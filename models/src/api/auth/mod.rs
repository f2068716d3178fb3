use serde::{Deserialize, Serialize};

use crate::api::user::User;

/// The body of `POST /login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
	/// The email the user signed up with
	pub email: String,
	/// The password of the user
	pub password: String,
}

/// The response of a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
	/// The user that just logged in
	#[serde(flatten)]
	pub user: User,
	/// The access token is used to authenticate the user, implying that the
	/// user is logged in. It expires after a short while.
	pub token: String,
	/// The access token has a expiry, and the refresh token is used to renew
	/// it by calling `POST /refresh`.
	pub refresh_token: String,
}

/// The response of `POST /refresh`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshAccessTokenResponse {
	/// A freshly issued access token
	pub token: String,
}
