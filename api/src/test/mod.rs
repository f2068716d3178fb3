use std::{
	collections::HashMap,
	sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use axum::{
	body::{self, Body, Bytes},
	http::{header, Method, Request, StatusCode},
	Router,
};
use models::api::chirp::SortOrder;
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use crate::{
	app,
	auth::{CredentialHasher, RefreshTokenRecord, RefreshTokenStore},
	db::{ChirpRecord, ChirpStore, StoreError, UserRecord, UserStore},
	prelude::*,
};

mod auth;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

/// Keeps everything in memory, behind a single lock, so every operation is
/// atomic the same way a single SQL statement is
#[derive(Debug, Default)]
pub struct MemoryStore {
	tables: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
	users: Vec<UserRecord>,
	chirps: Vec<ChirpRecord>,
	refresh_tokens: HashMap<String, RefreshTokenRecord>,
	last_timestamp: Option<OffsetDateTime>,
}

impl Tables {
	/// Timestamps strictly increase, so ordering by them is deterministic
	fn now(&mut self) -> OffsetDateTime {
		let now = match self.last_timestamp {
			Some(last) => OffsetDateTime::now_utc().max(last + Duration::microseconds(1)),
			None => OffsetDateTime::now_utc(),
		};
		self.last_timestamp = Some(now);
		now
	}
}

impl MemoryStore {
	fn tables(&self, cancel: &CancellationToken) -> Result<MutexGuard<'_, Tables>, StoreError> {
		if cancel.is_cancelled() {
			return Err(StoreError::Cancelled);
		}
		Ok(self.tables.lock().unwrap_or_else(PoisonError::into_inner))
	}

	pub fn user(&self, user_id: Uuid) -> Option<UserRecord> {
		self.tables(&CancellationToken::new())
			.ok()?
			.users
			.iter()
			.find(|user| user.id == user_id)
			.cloned()
	}

	pub fn refresh_token(&self, token: &str) -> Option<RefreshTokenRecord> {
		self.tables(&CancellationToken::new())
			.ok()?
			.refresh_tokens
			.get(token)
			.cloned()
	}
}

#[async_trait]
impl UserStore for MemoryStore {
	async fn create_user(
		&self,
		email: &str,
		hashed_password: &str,
		cancel: &CancellationToken,
	) -> Result<UserRecord, StoreError> {
		let mut tables = self.tables(cancel)?;
		if tables.users.iter().any(|user| user.email == email) {
			return Err(StoreError::UniqueViolation);
		}

		let now = tables.now();
		let user = UserRecord {
			id: Uuid::new_v4(),
			created_at: now,
			updated_at: now,
			email: email.to_string(),
			hashed_password: hashed_password.to_string(),
			is_chirpy_red: false,
		};
		tables.users.push(user.clone());
		Ok(user)
	}

	async fn get_user_by_email(
		&self,
		email: &str,
		cancel: &CancellationToken,
	) -> Result<Option<UserRecord>, StoreError> {
		Ok(self
			.tables(cancel)?
			.users
			.iter()
			.find(|user| user.email == email)
			.cloned())
	}

	async fn update_user_credentials(
		&self,
		user_id: Uuid,
		email: &str,
		hashed_password: &str,
		cancel: &CancellationToken,
	) -> Result<Option<UserRecord>, StoreError> {
		let mut tables = self.tables(cancel)?;
		if tables
			.users
			.iter()
			.any(|user| user.email == email && user.id != user_id)
		{
			return Err(StoreError::UniqueViolation);
		}

		let now = tables.now();
		Ok(tables
			.users
			.iter_mut()
			.find(|user| user.id == user_id)
			.map(|user| {
				user.email = email.to_string();
				user.hashed_password = hashed_password.to_string();
				user.updated_at = now;
				user.clone()
			}))
	}

	async fn upgrade_user_to_chirpy_red(
		&self,
		user_id: Uuid,
		cancel: &CancellationToken,
	) -> Result<bool, StoreError> {
		let mut tables = self.tables(cancel)?;
		let now = tables.now();
		Ok(tables
			.users
			.iter_mut()
			.find(|user| user.id == user_id)
			.map(|user| {
				user.is_chirpy_red = true;
				user.updated_at = now;
			})
			.is_some())
	}
}

#[async_trait]
impl ChirpStore for MemoryStore {
	async fn create_chirp(
		&self,
		user_id: Uuid,
		body: &str,
		cancel: &CancellationToken,
	) -> Result<ChirpRecord, StoreError> {
		let mut tables = self.tables(cancel)?;
		let now = tables.now();
		let chirp = ChirpRecord {
			id: Uuid::new_v4(),
			created_at: now,
			updated_at: now,
			body: body.to_string(),
			user_id,
		};
		tables.chirps.push(chirp.clone());
		Ok(chirp)
	}

	async fn list_chirps(
		&self,
		author_id: Option<Uuid>,
		sort: SortOrder,
		cancel: &CancellationToken,
	) -> Result<Vec<ChirpRecord>, StoreError> {
		let mut chirps = self
			.tables(cancel)?
			.chirps
			.iter()
			.filter(|chirp| author_id.map_or(true, |author_id| chirp.user_id == author_id))
			.cloned()
			.collect::<Vec<_>>();

		chirps.sort_by_key(|chirp| chirp.created_at);
		if sort == SortOrder::Desc {
			chirps.reverse();
		}
		Ok(chirps)
	}

	async fn get_chirp(
		&self,
		chirp_id: Uuid,
		cancel: &CancellationToken,
	) -> Result<Option<ChirpRecord>, StoreError> {
		Ok(self
			.tables(cancel)?
			.chirps
			.iter()
			.find(|chirp| chirp.id == chirp_id)
			.cloned())
	}

	async fn delete_chirp(
		&self,
		chirp_id: Uuid,
		cancel: &CancellationToken,
	) -> Result<bool, StoreError> {
		let mut tables = self.tables(cancel)?;
		let before = tables.chirps.len();
		tables.chirps.retain(|chirp| chirp.id != chirp_id);
		Ok(tables.chirps.len() < before)
	}
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
	async fn save(
		&self,
		token: &str,
		user_id: Uuid,
		expires_at: OffsetDateTime,
		cancel: &CancellationToken,
	) -> Result<(), StoreError> {
		let mut tables = self.tables(cancel)?;
		if tables.refresh_tokens.contains_key(token) {
			return Err(StoreError::UniqueViolation);
		}
		tables.refresh_tokens.insert(
			token.to_string(),
			RefreshTokenRecord::new(token.to_string(), user_id, expires_at),
		);
		Ok(())
	}

	async fn lookup_active(
		&self,
		token: &str,
		cancel: &CancellationToken,
	) -> Result<Option<Uuid>, StoreError> {
		Ok(self
			.tables(cancel)?
			.refresh_tokens
			.get(token)
			.and_then(|record| record.active_user_at(OffsetDateTime::now_utc())))
	}

	async fn revoke(&self, token: &str, cancel: &CancellationToken) -> Result<bool, StoreError> {
		let mut tables = self.tables(cancel)?;
		let now = tables.now();
		Ok(tables
			.refresh_tokens
			.get_mut(token)
			.filter(|record| record.revoked_at.is_none())
			.map(|record| {
				record.revoked_at = Some(now);
				record.updated_at = now;
			})
			.is_some())
	}
}

pub fn test_config() -> AppConfig {
	AppConfig {
		bind_addr: ([127, 0, 0, 1], 0).into(),
		api_base_path: "/api".to_string(),
		jwt_secret: JWT_SECRET.to_string(),
		polka_key: POLKA_KEY.to_string(),
		password_pepper: "test-pepper".to_string(),
		access_token_validity: 60 * 60,
		refresh_token_validity: 60 * 24 * 60 * 60,
		request_timeout: 30,
		hashing_concurrency: 2,
		environment: RunningEnvironment::Development,
		database: DatabaseConfig {
			host: "localhost".to_string(),
			port: 5432,
			user: "postgres".to_string(),
			password: "postgres".to_string(),
			database: "chirpy".to_string(),
			connection_limit: 1,
		},
	}
}

pub fn test_state(config: AppConfig) -> (AppState, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::default());
	let state = AppState {
		hasher: CredentialHasher::new(config.password_pepper.as_bytes(), config.hashing_concurrency)
			.unwrap(),
		config: Arc::new(config),
		users: store.clone(),
		chirps: store.clone(),
		refresh_tokens: store.clone(),
	};

	(state, store)
}

/// An app backed by a fresh [`MemoryStore`], which is returned as well so
/// tests can look behind the API
pub fn test_app() -> (Router, Arc<MemoryStore>) {
	let (state, store) = test_state(test_config());
	(app::setup_app(&state), store)
}

#[derive(Debug)]
pub struct TestResponse {
	pub status: StatusCode,
	pub body: Bytes,
}

impl TestResponse {
	pub fn json(&self) -> Value {
		serde_json::from_slice(&self.body).unwrap()
	}

	/// The message of an error response
	pub fn error(&self) -> String {
		self.json()["error"].as_str().unwrap().to_string()
	}
}

pub async fn send(
	app: &Router,
	method: Method,
	uri: &str,
	authorization: Option<&str>,
	body: Option<Value>,
) -> TestResponse {
	let mut request = Request::builder().method(method).uri(uri);
	if let Some(authorization) = authorization {
		request = request.header(header::AUTHORIZATION, authorization);
	}
	let request = match body {
		Some(body) => request
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string())),
		None => request.body(Body::empty()),
	}
	.unwrap();

	let response = app.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

	TestResponse { status, body }
}

pub fn bearer(token: &str) -> String {
	format!("Bearer {token}")
}

/// Signs a user up and returns their ID
pub async fn sign_up(app: &Router, email: &str, password: &str) -> Uuid {
	let response = send(
		app,
		Method::POST,
		"/api/users",
		None,
		Some(json!({ "email": email, "password": password })),
	)
	.await;
	assert_eq!(response.status, StatusCode::CREATED);

	response.json()["id"].as_str().unwrap().parse().unwrap()
}

/// A logged in user
#[derive(Debug, Clone)]
pub struct Session {
	pub user_id: Uuid,
	pub token: String,
	pub refresh_token: String,
}

pub async fn log_in(app: &Router, email: &str, password: &str) -> Session {
	let response = send(
		app,
		Method::POST,
		"/api/login",
		None,
		Some(json!({ "email": email, "password": password })),
	)
	.await;
	assert_eq!(response.status, StatusCode::OK);

	let body = response.json();
	Session {
		user_id: body["id"].as_str().unwrap().parse().unwrap(),
		token: body["token"].as_str().unwrap().to_string(),
		refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
	}
}

pub async fn sign_up_and_log_in(app: &Router, email: &str, password: &str) -> Session {
	sign_up(app, email, password).await;
	log_in(app, email, password).await
}
