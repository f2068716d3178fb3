/// Login, access token renewal and refresh token revocation
pub mod auth;
/// Creating, listing, reading and deleting chirps
pub mod chirp;
/// Signing up and updating a user's credentials
pub mod user;
/// Events sent to us by the payment provider
pub mod webhook;
