use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use models::{api::webhook::PolkaWebhookRequest, ErrorType};

use crate::{app::RequestCancellation, auth::ApiKey, prelude::*};

#[instrument(skip(state))]
pub fn setup_routes(state: &AppState) -> Router {
	Router::new()
		.route("/polka/webhooks", post(polka_webhook))
		.with_state(state.clone())
}

/// Handles an event from Polka. The API key is checked before the body is
/// even parsed. Events other than a user upgrade are acknowledged and
/// ignored, so Polka doesn't keep retrying them.
#[instrument(skip_all)]
async fn polka_webhook(
	State(state): State<AppState>,
	RequestCancellation(cancel): RequestCancellation,
	ApiKey(api_key): ApiKey,
	body: Bytes,
) -> Result<StatusCode, ErrorType> {
	if api_key != state.config.polka_key {
		warn!("Webhook called with an invalid API key");
		return Err(ErrorType::InvalidApiKey);
	}

	let event = serde_json::from_slice::<PolkaWebhookRequest>(&body).map_err(|err| {
		debug!("Failed to parse webhook body: {}", err);
		ErrorType::WrongParameters
	})?;

	if !event.is_user_upgrade() {
		debug!("Ignoring `{}` event", event.event);
		return Ok(StatusCode::NO_CONTENT);
	}

	let user_id = event.data.user_id.ok_or_else(|| {
		debug!("Upgrade event without a user ID");
		ErrorType::WrongParameters
	})?;

	if !state
		.users
		.upgrade_user_to_chirpy_red(user_id, &cancel)
		.await?
	{
		return Err(ErrorType::UserNotFound);
	}

	info!("User `{}` upgraded to Chirpy Red", user_id);
	Ok(StatusCode::NO_CONTENT)
}
