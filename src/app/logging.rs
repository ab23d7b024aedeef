use tracing_subscriber::{EnvFilter, fmt};

use crate::app::AppError;

const DEFAULT_FILTER: &str = "info,actix_server=warn";

/// Logs go to stderr so report binaries keep stdout for their output.
pub fn init() -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(AppError::logging_init)
}
