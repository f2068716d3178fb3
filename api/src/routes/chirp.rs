use axum::{
	extract::State,
	http::StatusCode,
	routing::{get, post},
	Json,
	Router,
};
use models::{
	api::chirp::{Chirp, CreateChirpRequest, ListChirpsQuery},
	ErrorType,
};

use crate::{
	app::RequestCancellation,
	auth::AuthenticatedUser,
	prelude::*,
	utils::{
		extractors::{DecodedJson, DecodedPath, DecodedQuery},
		validator,
	},
};

#[instrument(skip(state))]
pub fn setup_routes(state: &AppState) -> Router {
	Router::new()
		.route("/chirps", post(create_chirp).get(list_chirps))
		.route("/chirps/:chirp_id", get(get_chirp).delete(delete_chirp))
		.with_state(state.clone())
}

#[instrument(skip(state, cancel, body))]
async fn create_chirp(
	State(state): State<AppState>,
	RequestCancellation(cancel): RequestCancellation,
	AuthenticatedUser(user_id): AuthenticatedUser,
	DecodedJson(CreateChirpRequest { body }): DecodedJson<CreateChirpRequest>,
) -> Result<(StatusCode, Json<Chirp>), ErrorType> {
	let body = validator::clean_chirp_body(&body).ok_or_else(|| {
		debug!("Chirp is {} bytes long", body.len());
		ErrorType::ChirpTooLong
	})?;

	let chirp = state.chirps.create_chirp(user_id, &body, &cancel).await?;

	debug!("Chirp `{}` created", chirp.id);
	Ok((StatusCode::CREATED, Json(chirp.into())))
}

#[instrument(skip(state, cancel))]
async fn list_chirps(
	State(state): State<AppState>,
	RequestCancellation(cancel): RequestCancellation,
	DecodedQuery(ListChirpsQuery { author_id, sort }): DecodedQuery<ListChirpsQuery>,
) -> Result<Json<Vec<Chirp>>, ErrorType> {
	let chirps = state.chirps.list_chirps(author_id, sort, &cancel).await?;

	trace!("Found {} chirps", chirps.len());
	Ok(Json(chirps.into_iter().map(Chirp::from).collect()))
}

#[instrument(skip(state, cancel))]
async fn get_chirp(
	State(state): State<AppState>,
	RequestCancellation(cancel): RequestCancellation,
	DecodedPath(chirp_id): DecodedPath<Uuid>,
) -> Result<Json<Chirp>, ErrorType> {
	state
		.chirps
		.get_chirp(chirp_id, &cancel)
		.await?
		.map(|chirp| Json(chirp.into()))
		.ok_or(ErrorType::ResourceDoesNotExist)
}

/// Deletes a chirp. Only the author of a chirp may delete it
#[instrument(skip(state, cancel))]
async fn delete_chirp(
	State(state): State<AppState>,
	RequestCancellation(cancel): RequestCancellation,
	AuthenticatedUser(user_id): AuthenticatedUser,
	DecodedPath(chirp_id): DecodedPath<Uuid>,
) -> Result<StatusCode, ErrorType> {
	let chirp = state
		.chirps
		.get_chirp(chirp_id, &cancel)
		.await?
		.ok_or(ErrorType::ResourceDoesNotExist)?;

	if chirp.user_id != user_id {
		info!(
			"User `{}` tried to delete chirp `{}` by `{}`",
			user_id, chirp.id, chirp.user_id
		);
		return Err(ErrorType::NotChirpAuthor);
	}

	if !state.chirps.delete_chirp(chirp_id, &cancel).await? {
		// Deleted by a concurrent request
		return Err(ErrorType::ResourceDoesNotExist);
	}

	debug!("Chirp `{}` deleted", chirp_id);
	Ok(StatusCode::NO_CONTENT)
}
