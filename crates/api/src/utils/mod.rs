/// Tracing setup and structured startup logs.
pub mod logging;
