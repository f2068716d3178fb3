use std::{convert::Infallible, fmt::Debug, sync::Arc};

use axum::{
	extract::{FromRequestParts, Request, State},
	http::request::Parts,
	middleware::{self, Next},
	response::{IntoResponse, Response},
	Router,
};
use models::ErrorType;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
	auth::{CredentialHasher, RefreshTokenStore},
	db::{ChirpStore, UserStore},
	prelude::*,
	routes,
};

/// The global state of the application. Everything in here is either
/// immutable or synchronizes itself, so it is shared freely between requests.
#[derive(Clone)]
pub struct AppState {
	/// The application configuration, loaded once at startup
	pub config: Arc<AppConfig>,
	/// Hashes and verifies passwords within a bounded worker budget
	pub hasher: CredentialHasher,
	pub users: Arc<dyn UserStore>,
	pub chirps: Arc<dyn ChirpStore>,
	pub refresh_tokens: Arc<dyn RefreshTokenStore>,
}

impl Debug for AppState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AppState")
			.field("api_base_path", &self.config.api_base_path)
			.field("environment", &self.config.environment)
			.field("hasher", &self.hasher)
			.finish_non_exhaustive()
	}
}

/// Creates the router for the whole API, mounted at the configured base path
#[instrument(skip(state))]
pub fn setup_app(state: &AppState) -> Router {
	let routes = routes::setup_routes(state);
	let base_path = state.config.api_base_path.trim_end_matches('/');

	let router = if base_path.is_empty() {
		Router::new().merge(routes)
	} else {
		Router::new().nest(base_path, routes)
	};

	router.layer(middleware::from_fn_with_state(
		state.clone(),
		request_context,
	))
}

/// Gives every request a [`CancellationToken`] that fires once the request
/// is done with, gets dropped, or runs past the configured timeout. Also logs
/// each request as it completes.
async fn request_context(
	State(state): State<AppState>,
	mut request: Request,
	next: Next,
) -> Response {
	// Start measuring time to check how long a route takes to execute
	let start_time = Instant::now();
	let method = request.method().clone();
	let path = request.uri().path().to_string();

	let cancel = CancellationToken::new();
	let _cancel_on_drop = cancel.clone().drop_guard();
	request.extensions_mut().insert(cancel.clone());

	let response = match time::timeout(state.config.request_timeout(), next.run(request)).await {
		Ok(response) => response,
		Err(_) => {
			cancel.cancel();
			warn!("{} {} timed out", method, path);
			ErrorType::RequestTimedOut.into_response()
		}
	};

	let elapsed_time = start_time.elapsed();
	info!(
		"{} {} {} - {}",
		method,
		path,
		response.status(),
		if elapsed_time.as_millis() > 0 {
			format!("{} ms", elapsed_time.as_millis())
		} else {
			format!("{} μs", elapsed_time.as_micros())
		}
	);

	response
}

/// The cancellation token of the current request. Outside of
/// [`setup_app`]'s middleware this is a fresh token that never fires.
#[derive(Debug, Clone)]
pub struct RequestCancellation(pub CancellationToken);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestCancellation
where
	S: Send + Sync,
{
	type Rejection = Infallible;

	async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
		Ok(Self(
			parts
				.extensions
				.get::<CancellationToken>()
				.cloned()
				.unwrap_or_else(CancellationToken::new),
		))
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;

	use axum::{body::Body, http, http::StatusCode, routing::get};
	use tower::ServiceExt;

	use super::*;
	use crate::test::{test_config, test_state};

	fn watched_route(
		state: &AppState,
		seen: Arc<Mutex<Option<CancellationToken>>>,
		delay: time::Duration,
	) -> Router {
		Router::new()
			.route(
				"/watched",
				get(move |RequestCancellation(cancel): RequestCancellation| {
					let seen = seen.clone();
					async move {
						*seen.lock().unwrap() = Some(cancel);
						time::sleep(delay).await;
						"done"
					}
				}),
			)
			.layer(middleware::from_fn_with_state(
				state.clone(),
				request_context,
			))
	}

	fn request() -> Request {
		http::Request::builder()
			.uri("/watched")
			.body(Body::empty())
			.unwrap()
	}

	#[tokio::test(start_paused = true)]
	async fn slow_requests_time_out_and_are_cancelled() {
		let mut config = test_config();
		config.request_timeout = 1;
		let (state, _) = test_state(config);
		let seen = Arc::new(Mutex::new(None));

		let response = watched_route(&state, seen.clone(), time::Duration::from_secs(60))
			.oneshot(request())
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
		assert!(seen.lock().unwrap().as_ref().unwrap().is_cancelled());
	}

	#[tokio::test(start_paused = true)]
	async fn tokens_are_cancelled_once_the_request_completes() {
		let (state, _) = test_state(test_config());
		let seen = Arc::new(Mutex::new(None));

		let response = watched_route(&state, seen.clone(), time::Duration::from_millis(10))
			.oneshot(request())
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
		assert!(seen.lock().unwrap().as_ref().unwrap().is_cancelled());
	}

	#[tokio::test]
	async fn routes_can_be_mounted_at_the_root() {
		let mut config = test_config();
		config.api_base_path = "/".to_string();
		let (state, _) = test_state(config);

		let response = setup_app(&state)
			.oneshot(
				http::Request::builder()
					.uri("/healthz")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
	}
}
