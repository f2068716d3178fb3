#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Types shared between the Chirpy API server and anything that talks to it.
//! The request and response bodies of every endpoint live under [`api`], and
//! the error type returned by every endpoint is [`ErrorType`].

/// Request and response bodies of every endpoint, grouped by resource.
pub mod api;

mod error;

pub use self::error::*;

/// Everything an endpoint implementation usually needs.
pub mod prelude {
	pub use time::OffsetDateTime;
	pub use uuid::Uuid;

	pub use crate::{
		api::{auth::*, chirp::*, user::*, webhook::*},
		ErrorType,
	};
}
