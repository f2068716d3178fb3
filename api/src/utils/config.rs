use std::{
	env,
	fmt::{Display, Formatter},
	net::SocketAddr,
};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Reads the config from `config/dev` or `config/prod` (whichever matches the
/// running environment), overridden by `APP_*` environment variables, and
/// validates it. Keys are snake_case since the config crate lowercases every
/// key it reads.
#[instrument]
pub fn parse_config() -> Result<AppConfig, ConfigError> {
	trace!("Reading config data...");

	let env = if cfg!(debug_assertions) {
		env::var("APP_ENV").unwrap_or_else(|_| "dev".into())
	} else {
		env::var("APP_ENV").unwrap_or_else(|_| "prod".into())
	};

	let config: AppConfig = match env.as_ref() {
		"prod" | "production" => Config::builder()
			.add_source(File::with_name("config/prod").required(false))
			.set_default("environment", "production")?,
		"dev" | "development" => Config::builder()
			.add_source(File::with_name("config/dev").required(false))
			.set_default("environment", "development")?,
		_ => {
			return Err(ConfigError::Message(format!(
				"unknown running environment `{env}`"
			)));
		}
	}
	.add_source(environment_overrides())
	.build()?
	.try_deserialize()?;

	config.validate()?;
	Ok(config)
}

/// `APP_JWT_SECRET` sets `jwt_secret`, `APP_DATABASE__HOST` sets
/// `database.host`
fn environment_overrides() -> Environment {
	Environment::with_prefix("APP")
		.prefix_separator("_")
		.separator("__")
}

/// Everything the server needs to know to run. This is loaded once at startup
/// and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
	pub bind_addr: SocketAddr,
	#[serde(default = "default_api_base_path")]
	pub api_base_path: String,
	/// The HS256 key access tokens are signed with
	pub jwt_secret: String,
	/// The key Polka must present to call the webhook
	pub polka_key: String,
	#[serde(default)]
	pub password_pepper: String,
	/// In seconds
	#[serde(default = "default_access_token_validity")]
	pub access_token_validity: u64,
	/// In seconds
	#[serde(default = "default_refresh_token_validity")]
	pub refresh_token_validity: u64,
	/// In seconds
	#[serde(default = "default_request_timeout")]
	pub request_timeout: u64,
	#[serde(default = "default_hashing_concurrency")]
	pub hashing_concurrency: usize,
	pub environment: RunningEnvironment,
	pub database: DatabaseConfig,
}

impl AppConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.jwt_secret.is_empty() {
			return Err(ConfigError::Message("jwt_secret must not be empty".into()));
		}
		if self.polka_key.is_empty() {
			return Err(ConfigError::Message("polka_key must not be empty".into()));
		}
		if self.access_token_validity == 0 {
			return Err(ConfigError::Message(
				"access_token_validity must be at least a second".into(),
			));
		}
		if self.refresh_token_validity <= self.access_token_validity {
			return Err(ConfigError::Message(
				"refresh_token_validity must be longer than access_token_validity".into(),
			));
		}
		if self.refresh_token_validity > constants::MAX_TOKEN_VALIDITY {
			return Err(ConfigError::Message(format!(
				"refresh_token_validity must be at most {} seconds",
				constants::MAX_TOKEN_VALIDITY
			)));
		}
		Ok(())
	}

	pub fn access_token_validity(&self) -> time::Duration {
		validity_duration(self.access_token_validity)
	}

	pub fn refresh_token_validity(&self) -> time::Duration {
		validity_duration(self.refresh_token_validity)
	}

	pub fn request_timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.request_timeout)
	}
}

/// Clamped, so an unvalidated config can't wrap around into the past
fn validity_duration(seconds: u64) -> time::Duration {
	time::Duration::seconds(
		i64::try_from(seconds.min(constants::MAX_TOKEN_VALIDITY)).unwrap_or(i64::MAX),
	)
}

fn default_api_base_path() -> String {
	"/api".to_string()
}

fn default_access_token_validity() -> u64 {
	60 * 60
}

fn default_refresh_token_validity() -> u64 {
	60 * 24 * 60 * 60
}

fn default_request_timeout() -> u64 {
	30
}

fn default_hashing_concurrency() -> usize {
	4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunningEnvironment {
	Development,
	Production,
}

impl Display for RunningEnvironment {
	fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			formatter,
			"{}",
			match self {
				RunningEnvironment::Development => "Development",
				RunningEnvironment::Production => "Production",
			}
		)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
	pub host: String,
	pub port: u16,
	pub user: String,
	pub password: String,
	pub database: String,
	pub connection_limit: u32,
}
