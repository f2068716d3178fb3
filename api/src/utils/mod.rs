/// The config parser and the [`config::AppConfig`] it produces
pub mod config;
pub mod constants;
/// Extractors that reject with the API's own error type
pub mod extractors;
/// The subscriber that [`tracing`] events are written to
pub mod logger;
pub mod validator;
