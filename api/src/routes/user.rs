use axum::{
	extract::State,
	http::StatusCode,
	routing::post,
	Json,
	Router,
};
use models::{
	api::user::{User, UserCredentialsRequest},
	ErrorType,
};

use crate::{
	app::RequestCancellation,
	auth::AuthenticatedUser,
	db::StoreError,
	prelude::*,
	utils::{extractors::DecodedJson, validator},
};

#[instrument(skip(state))]
pub fn setup_routes(state: &AppState) -> Router {
	Router::new()
		.route("/users", post(create_user).put(update_user))
		.with_state(state.clone())
}

fn email_conflict(error: StoreError) -> ErrorType {
	match error {
		StoreError::UniqueViolation => ErrorType::EmailUnavailable,
		err => err.into(),
	}
}

#[instrument(skip_all)]
async fn create_user(
	State(state): State<AppState>,
	RequestCancellation(cancel): RequestCancellation,
	DecodedJson(UserCredentialsRequest { email, password }): DecodedJson<UserCredentialsRequest>,
) -> Result<(StatusCode, Json<User>), ErrorType> {
	if !validator::is_email_valid(&email) {
		debug!("Rejecting invalid email");
		return Err(ErrorType::InvalidEmail);
	}

	let hashed_password = state.hasher.hash_async(password).await?;
	let user = state
		.users
		.create_user(&email, &hashed_password, &cancel)
		.await
		.map_err(email_conflict)?;

	info!("User `{}` signed up", user.id);
	Ok((StatusCode::CREATED, Json(user.into())))
}

/// Changes the email and password of the logged in user
#[instrument(skip_all)]
async fn update_user(
	State(state): State<AppState>,
	RequestCancellation(cancel): RequestCancellation,
	AuthenticatedUser(user_id): AuthenticatedUser,
	DecodedJson(UserCredentialsRequest { email, password }): DecodedJson<UserCredentialsRequest>,
) -> Result<Json<User>, ErrorType> {
	if !validator::is_email_valid(&email) {
		debug!("Rejecting invalid email");
		return Err(ErrorType::InvalidEmail);
	}

	let hashed_password = state.hasher.hash_async(password).await?;
	let user = state
		.users
		.update_user_credentials(user_id, &email, &hashed_password, &cancel)
		.await
		.map_err(email_conflict)?
		.ok_or_else(|| {
			warn!("Authenticated user `{}` no longer exists", user_id);
			ErrorType::UserNotFound
		})?;

	info!("User `{}` updated their credentials", user.id);
	Ok(Json(user.into()))
}
