mod config;
mod error;
pub mod import;
pub mod ingestion;
mod logging;
pub mod reports;
mod runtime;
pub mod seed;
pub mod services;

pub use config::AppConfig;
pub use error::AppError;
pub use runtime::open_store;

pub fn run_api() -> Result<(), AppError> {
    logging::init()?;

    let config = AppConfig::from_env()?;

    tracing::info!(
        db_path = %config.db_path,
        http_bind = %config.http_bind,
        cors_allowed_origin = %config.cors_allowed_origin,
        list_limit_max = config.list_limit_max,
        "application bootstrap initialized"
    );

    runtime::run_api(config)
}

pub fn run_import(csv_path: &str) -> Result<(), AppError> {
    logging::init()?;

    let config = AppConfig::from_env()?;
    tracing::info!(db_path = %config.db_path, csv_path, "import bootstrap initialized");

    runtime::run_import(config, csv_path).map(|_| ())
}

/// Logging setup for the operator binaries under `src/bin`.
pub fn init_logging() -> Result<(), AppError> {
    logging::init()
}
