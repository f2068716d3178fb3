use tracing::{level_filters::LevelFilter, Dispatch};
use tracing_subscriber::{
	filter::Targets,
	fmt::{format::FmtSpan, Layer as FmtLayer},
	layer::SubscriberExt,
	Layer,
};

use crate::prelude::*;

/// Sets up the global default subscriber. Events from this crate and from the
/// models crate are logged at TRACE in development and DEBUG in production.
/// Dependencies only get to log warnings.
pub fn initialize(environment: RunningEnvironment) -> Result<(), tracing::dispatcher::SetGlobalDefaultError> {
	let crate_level = match environment {
		RunningEnvironment::Development => LevelFilter::TRACE,
		RunningEnvironment::Production => LevelFilter::DEBUG,
	};

	tracing::dispatcher::set_global_default(Dispatch::new(
		tracing_subscriber::registry().with(
			FmtLayer::new()
				.with_span_events(FmtSpan::NONE)
				.event_format(
					tracing_subscriber::fmt::format()
						.with_ansi(environment == RunningEnvironment::Development)
						.with_file(false)
						.compact(),
				)
				.with_filter(
					Targets::new()
						.with_target(env!("CARGO_PKG_NAME"), crate_level)
						.with_target("models", crate_level)
						.with_default(LevelFilter::WARN),
				),
		),
	))
}
