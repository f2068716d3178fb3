//! The Chirpy API server. Users sign up, log in and post short messages
//! (chirps). Logins hand out a short-lived access token and a long-lived,
//! revocable refresh token.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

/// This module contains the app state and the middleware every request goes
/// through
mod app;
/// The authentication and session core
mod auth;
/// The database module contains all the database related functions. Such as
/// initializing the database, getting the connection, etc.
mod db;
/// All the routes of the API
mod routes;
/// In-memory stores and helpers for the test suite
#[cfg(test)]
mod test;
/// This module contains all the utilities used by the API. This includes
/// things like the config parser, validators, extractors, etc.
mod utils;

/// The prelude module contains all the things that are commonly used
/// throughout the crate
pub mod prelude {
	pub use tracing::{debug, error, info, instrument, trace, warn};
	pub use uuid::Uuid;

	pub use crate::{
		app::AppState,
		utils::{config::*, constants},
	};
}

use crate::{auth::CredentialHasher, db::PgStore, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let config = utils::config::parse_config().context("unable to parse config")?;

	utils::logger::initialize(config.environment)
		.context("unable to set the global default subscriber")?;
	debug!(
		"Configuration read. Running environment set to {}",
		config.environment
	);

	let pool = db::connect(&config.database)
		.await
		.context("unable to connect to the database")?;
	db::initialize(&pool)
		.await
		.context("unable to initialize the database")?;

	let hasher = CredentialHasher::new(config.password_pepper.as_bytes(), config.hashing_concurrency)
		.context("unable to set up password hashing")?;
	let store = Arc::new(PgStore::new(pool));

	let state = AppState {
		config: Arc::new(config),
		hasher,
		users: store.clone(),
		chirps: store.clone(),
		refresh_tokens: store,
	};

	let tcp_listener = TcpListener::bind(state.config.bind_addr)
		.await
		.with_context(|| format!("unable to bind to {}", state.config.bind_addr))?;
	info!(
		"{} v{} listening for connections on {}",
		constants::APP_NAME,
		constants::APP_VERSION,
		tcp_listener.local_addr()?
	);

	axum::serve(tcp_listener, app::setup_app(&state))
		.with_graceful_shutdown(exit_signal())
		.await
		.context("server error")?;

	info!("Server stopped");
	Ok(())
}

/// Resolves once the process is asked to stop, with either SIGINT or SIGTERM
async fn exit_signal() {
	let ctrl_c = async {
		if let Err(err) = tokio::signal::ctrl_c().await {
			error!("Failed to listen for SIGINT: {}", err);
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(err) => {
				error!("Failed to listen for SIGTERM: {}", err);
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => (),
		_ = terminate => (),
	}
	info!("Shutdown signal received, shutting down server gracefully");
}
