use serde::{de::IntoDeserializer, Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A chirp, as exposed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
	/// The ID of the chirp
	pub id: Uuid,
	/// When the chirp was posted
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// When the chirp was last changed
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
	/// The contents of the chirp, with profanity already masked
	pub body: String,
	/// The ID of the user that wrote the chirp
	pub user_id: Uuid,
}

/// The body of `POST /chirps`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChirpRequest {
	/// The contents of the chirp
	pub body: String,
}

/// The order in which chirps are listed, by the time they were posted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
	/// Oldest first
	#[default]
	Asc,
	/// Newest first
	Desc,
}

/// The query parameters of `GET /chirps`. Empty values count as absent, so
/// `?author_id=&sort=` lists every chirp, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListChirpsQuery {
	/// Only list chirps written by this user
	#[serde(default, deserialize_with = "empty_as_none")]
	pub author_id: Option<Uuid>,
	/// The order to list chirps in. Defaults to [`SortOrder::Asc`]
	#[serde(default, deserialize_with = "empty_as_default")]
	pub sort: SortOrder,
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	match Option::<String>::deserialize(deserializer)? {
		Some(value) if !value.is_empty() => T::deserialize(value.into_deserializer()).map(Some),
		_ => Ok(None),
	}
}

fn empty_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de> + Default,
{
	Ok(empty_as_none(deserializer)?.unwrap_or_default())
}
