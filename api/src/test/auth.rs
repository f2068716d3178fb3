use axum::http::{Method, StatusCode};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use super::*;
use crate::auth::{access_token, RefreshTokenState};

#[tokio::test]
async fn login_returns_the_user_and_both_tokens() {
	let (app, store) = test_app();
	let user_id = sign_up(&app, "walt@breakingbad.com", "04234").await;

	let response = send(
		&app,
		Method::POST,
		"/api/login",
		None,
		Some(json!({ "email": "walt@breakingbad.com", "password": "04234" })),
	)
	.await;
	assert_eq!(response.status, StatusCode::OK);

	let body = response.json();
	assert_eq!(body["id"], user_id.to_string());
	assert_eq!(body["email"], "walt@breakingbad.com");
	assert_eq!(body["is_chirpy_red"], false);
	assert!(body.get("hashed_password").is_none());
	assert!(body.get("password").is_none());

	let token = body["token"].as_str().unwrap();
	assert_eq!(access_token::verify(token, JWT_SECRET).unwrap(), user_id);

	let refresh_token = body["refresh_token"].as_str().unwrap();
	assert_eq!(refresh_token.len(), 64);
	let record = store.refresh_token(refresh_token).unwrap();
	assert_eq!(record.user_id, user_id);
	assert_eq!(record.state_at(OffsetDateTime::now_utc()), RefreshTokenState::Active);
	assert!(record.expires_at > OffsetDateTime::now_utc() + Duration::days(59));
}

#[tokio::test]
async fn unknown_emails_and_wrong_passwords_look_the_same() {
	let (app, _) = test_app();
	sign_up(&app, "walt@breakingbad.com", "04234").await;

	let wrong_password = send(
		&app,
		Method::POST,
		"/api/login",
		None,
		Some(json!({ "email": "walt@breakingbad.com", "password": "wrong" })),
	)
	.await;
	let unknown_email = send(
		&app,
		Method::POST,
		"/api/login",
		None,
		Some(json!({ "email": "jesse@breakingbad.com", "password": "04234" })),
	)
	.await;

	assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
	assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
	assert_eq!(wrong_password.body, unknown_email.body);
	assert_eq!(wrong_password.error(), "Incorrect email or password");
}

#[tokio::test]
async fn malformed_login_bodies_are_bad_requests() {
	let (app, _) = test_app();

	let response = send(
		&app,
		Method::POST,
		"/api/login",
		None,
		Some(json!({ "email": "walt@breakingbad.com" })),
	)
	.await;

	assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_then_revoke() {
	let (app, _) = test_app();
	let session = sign_up_and_log_in(&app, "walt@breakingbad.com", "04234").await;

	let refreshed = send(
		&app,
		Method::POST,
		"/api/refresh",
		Some(&bearer(&session.refresh_token)),
		None,
	)
	.await;
	assert_eq!(refreshed.status, StatusCode::OK);
	let token = refreshed.json()["token"].as_str().unwrap().to_string();
	assert_eq!(
		access_token::verify(&token, JWT_SECRET).unwrap(),
		session.user_id
	);

	// Refreshing doesn't rotate the refresh token
	let refreshed_again = send(
		&app,
		Method::POST,
		"/api/refresh",
		Some(&bearer(&session.refresh_token)),
		None,
	)
	.await;
	assert_eq!(refreshed_again.status, StatusCode::OK);

	let revoked = send(
		&app,
		Method::POST,
		"/api/revoke",
		Some(&bearer(&session.refresh_token)),
		None,
	)
	.await;
	assert_eq!(revoked.status, StatusCode::NO_CONTENT);
	assert!(revoked.body.is_empty());

	let after_revoke = send(
		&app,
		Method::POST,
		"/api/refresh",
		Some(&bearer(&session.refresh_token)),
		None,
	)
	.await;
	assert_eq!(after_revoke.status, StatusCode::UNAUTHORIZED);
	assert_eq!(after_revoke.error(), "Invalid refresh token");

	let revoked_twice = send(
		&app,
		Method::POST,
		"/api/revoke",
		Some(&bearer(&session.refresh_token)),
		None,
	)
	.await;
	assert_eq!(revoked_twice.status, StatusCode::UNAUTHORIZED);

	// Access tokens already handed out stay valid until they expire
	assert_eq!(
		access_token::verify(&session.token, JWT_SECRET).unwrap(),
		session.user_id
	);
}

#[tokio::test]
async fn access_tokens_are_not_refresh_tokens() {
	let (app, _) = test_app();
	let session = sign_up_and_log_in(&app, "walt@breakingbad.com", "04234").await;

	let response = send(
		&app,
		Method::POST,
		"/api/refresh",
		Some(&bearer(&session.token)),
		None,
	)
	.await;

	assert_eq!(response.status, StatusCode::UNAUTHORIZED);
	assert_eq!(response.error(), "Invalid refresh token");
}

#[tokio::test]
async fn refresh_tokens_are_not_access_tokens() {
	let (app, _) = test_app();
	let session = sign_up_and_log_in(&app, "walt@breakingbad.com", "04234").await;

	let response = send(
		&app,
		Method::POST,
		"/api/chirps",
		Some(&bearer(&session.refresh_token)),
		Some(json!({ "body": "hello" })),
	)
	.await;

	assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_needs_a_well_formed_header() {
	let (app, _) = test_app();
	let session = sign_up_and_log_in(&app, "walt@breakingbad.com", "04234").await;

	let missing = send(&app, Method::POST, "/api/refresh", None, None).await;
	assert_eq!(missing.status, StatusCode::BAD_REQUEST);

	let wrong_scheme = send(
		&app,
		Method::POST,
		"/api/refresh",
		Some(&format!("ApiKey {}", session.refresh_token)),
		None,
	)
	.await;
	assert_eq!(wrong_scheme.status, StatusCode::BAD_REQUEST);

	let unknown = send(
		&app,
		Method::POST,
		"/api/revoke",
		Some(&bearer(&crate::auth::refresh_token::generate())),
		None,
	)
	.await;
	assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_access_tokens_are_rejected() {
	let (app, _) = test_app();
	let session = sign_up_and_log_in(&app, "walt@breakingbad.com", "04234").await;
	let expired = access_token::issue_at(
		session.user_id,
		JWT_SECRET,
		Duration::hours(1),
		OffsetDateTime::now_utc() - Duration::hours(2),
	)
	.unwrap();

	let response = send(
		&app,
		Method::POST,
		"/api/chirps",
		Some(&bearer(&expired)),
		Some(json!({ "body": "hello" })),
	)
	.await;

	assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_check() {
	let (app, _) = test_app();

	let response = send(&app, Method::GET, "/api/healthz", None, None).await;

	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(&response.body[..], b"OK");
}
