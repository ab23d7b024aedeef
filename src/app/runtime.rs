use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use rusqlite::Connection;

use crate::adapters::api::{ApiState, configure_routes};
use crate::adapters::db::{open_connection, run_migrations, schema_version};
use crate::adapters::reading_csv;
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::import::{ImportSummary, import_rows};
use crate::app::services::SqliteFacilityService;

/// Opens the store and brings the schema up to date. Failing here is fatal
/// for every binary.
pub fn open_store(db_path: &str) -> Result<Connection, AppError> {
    if let Some(parent) = std::path::Path::new(db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(AppError::database_init)?;
    }

    let mut connection = open_connection(db_path).map_err(AppError::database_init)?;
    run_migrations(&mut connection).map_err(AppError::database_init)?;

    let version = schema_version(&connection).map_err(AppError::database_init)?;
    tracing::info!(db_path, schema_version = version, "reading store ready");

    Ok(connection)
}

pub fn run_api(config: AppConfig) -> Result<(), AppError> {
    let connection = open_store(&config.db_path)?;
    let api_state = ApiState {
        facility_service: SqliteFacilityService::new(Arc::new(Mutex::new(connection))),
        list_limit_max: config.list_limit_max,
    };
    let allowed_origin = config.cors_allowed_origin.clone();

    tracing::info!(bind = %config.http_bind, "http server starting");

    actix_web::rt::System::new()
        .block_on(async move {
            HttpServer::new(move || {
                let cors = Cors::default()
                    .allowed_origin(&allowed_origin)
                    .allowed_methods(vec!["GET", "PUT"])
                    .allow_any_header()
                    .max_age(3600);

                App::new()
                    .wrap(cors)
                    .wrap(Logger::default())
                    .app_data(web::Data::new(api_state.clone()))
                    .configure(configure_routes)
            })
            .bind(&config.http_bind)?
            .run()
            .await
        })
        .map_err(AppError::runtime)
}

pub fn run_import(config: AppConfig, csv_path: &str) -> Result<ImportSummary, AppError> {
    let connection = open_store(&config.db_path)?;
    let service = SqliteFacilityService::new(Arc::new(Mutex::new(connection)));

    let rows = reading_csv::read_file(csv_path).map_err(AppError::runtime)?;
    tracing::info!(csv_path, rows = rows.len(), "reading import started");

    let summary = import_rows(&service, rows).map_err(AppError::runtime)?;

    tracing::info!(
        csv_path,
        inserted = summary.inserted,
        updated = summary.updated,
        rejected = summary.rejected,
        "reading import finished"
    );

    Ok(summary)
}
