use argon2::Params;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Argon2id parameters for password hashes: 8 MiB of memory, 4 passes and 4
/// lanes. Hashes record their own parameters, so changing these only affects
/// new hashes.
#[cfg(not(test))]
pub const HASHING_PARAMS: Params = if let Ok(params) = Params::new(8192, 4, 4, None) {
	params
} else {
	panic!("Failed to create hashing params");
};

/// Tests hash a lot of passwords. Keep them quick
#[cfg(test)]
pub const HASHING_PARAMS: Params = if let Ok(params) = Params::new(Params::MIN_M_COST, 1, 1, None) {
	params
} else {
	panic!("Failed to create hashing params");
};

/// The `iss` claim of every access token this server issues
pub const ACCESS_TOKEN_ISSUER: &str = "chirpy-access";

/// The longest any token may stay valid for, in seconds (100 years)
pub const MAX_TOKEN_VALIDITY: u64 = 100 * 365 * 24 * 60 * 60;

/// Number of random bytes in a refresh token, before hex encoding
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Chirps longer than this many bytes are rejected
pub const MAX_CHIRP_LENGTH: usize = 140;

/// Words that are masked out of chirps, compared case-insensitively
pub const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

/// What a profane word is replaced with
pub const PROFANITY_MASK: &str = "****";
