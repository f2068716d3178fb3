use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use models::{
	api::auth::{LoginRequest, LoginResponse, RefreshAccessTokenResponse},
	ErrorType,
};

use crate::{
	app::RequestCancellation,
	auth::{access_token, refresh_token, BearerToken},
	prelude::*,
	utils::extractors::DecodedJson,
};

#[instrument(skip(state))]
pub fn setup_routes(state: &AppState) -> Router {
	Router::new()
		.route("/login", post(login))
		.route("/refresh", post(refresh))
		.route("/revoke", post(revoke))
		.with_state(state.clone())
}

/// Logs a user in with their email and password. An unknown email and a
/// wrong password are indistinguishable to the caller, in the response as
/// well as in how long it takes.
#[instrument(skip_all)]
async fn login(
	State(state): State<AppState>,
	RequestCancellation(cancel): RequestCancellation,
	DecodedJson(LoginRequest { email, password }): DecodedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ErrorType> {
	let user = state.users.get_user_by_email(&email, &cancel).await?;

	state
		.hasher
		.verify_async(password, user.as_ref().map(|user| user.hashed_password.clone()))
		.await
		.inspect_err(|err| debug!("Login failed: {}", err))?;
	let user = user.ok_or(ErrorType::IncorrectCredentials)?;
	trace!("Credentials verified for user `{}`", user.id);

	let token = access_token::issue(
		user.id,
		&state.config.jwt_secret,
		state.config.access_token_validity(),
	)?;
	let refresh_token = refresh_token::issue(
		state.refresh_tokens.as_ref(),
		user.id,
		state.config.refresh_token_validity(),
		&cancel,
	)
	.await?;

	info!("User `{}` logged in", user.id);
	Ok(Json(LoginResponse {
		user: user.into(),
		token,
		refresh_token,
	}))
}

/// Exchanges a refresh token for a new access token. The refresh token itself
/// stays as it is.
#[instrument(skip_all)]
async fn refresh(
	State(state): State<AppState>,
	RequestCancellation(cancel): RequestCancellation,
	BearerToken(refresh_token): BearerToken,
) -> Result<Json<RefreshAccessTokenResponse>, ErrorType> {
	let user_id = refresh_token::redeem(state.refresh_tokens.as_ref(), &refresh_token, &cancel).await?;

	let token = access_token::issue(
		user_id,
		&state.config.jwt_secret,
		state.config.access_token_validity(),
	)?;

	debug!("Issued a new access token for user `{}`", user_id);
	Ok(Json(RefreshAccessTokenResponse { token }))
}

/// Revokes a refresh token. Whoever holds a token may revoke it
#[instrument(skip_all)]
async fn revoke(
	State(state): State<AppState>,
	RequestCancellation(cancel): RequestCancellation,
	BearerToken(refresh_token): BearerToken,
) -> Result<StatusCode, ErrorType> {
	refresh_token::revoke(state.refresh_tokens.as_ref(), &refresh_token, &cancel).await?;

	info!("Refresh token revoked");
	Ok(StatusCode::NO_CONTENT)
}
