use axum::{routing::get, Router};

use crate::prelude::*;

/// Login, token refresh and token revocation
mod auth;
/// Posting, listing and deleting chirps
mod chirp;
/// Signing up and changing credentials
mod user;
/// Callbacks from Polka, the payment provider
mod webhook;

/// Sets up every route of the API. The routes are relative to the base path,
/// which is applied by [`crate::app::setup_app`].
#[instrument(skip(state))]
pub fn setup_routes(state: &AppState) -> Router {
	Router::new()
		.route("/healthz", get(health_check))
		.merge(auth::setup_routes(state))
		.merge(user::setup_routes(state))
		.merge(chirp::setup_routes(state))
		.merge(webhook::setup_routes(state))
}

async fn health_check() -> &'static str {
	"OK"
}
