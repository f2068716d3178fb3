use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A user, as exposed by the API. The password hash is never part of this
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// The ID of the user
	pub id: Uuid,
	/// When the user signed up
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// When the user's email or password was last changed
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
	/// The email of the user, used to login
	pub email: String,
	/// Whether the user has upgraded to Chirpy Red
	pub is_chirpy_red: bool,
}

/// The body of `POST /users` and `PUT /users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredentialsRequest {
	/// The email to sign up with, or to change to
	pub email: String,
	/// The plaintext password. This is hashed before it is stored
	pub password: String,
}
