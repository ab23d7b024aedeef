use std::collections::BTreeMap;

use actix_web::{HttpResponse, Responder, get, put, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::app::ingestion::{IngestionError, UpsertOutcome, upsert_reading};
use crate::app::reports::{
    ReportError, facility_overview, maintenance_overview, meter_consumption_report,
    meter_overview, readings_by_meter_type,
};
use crate::app::services::{
    MeterQueryHandler, RegistryCommandHandler, RegistryQueryHandler, ServiceError,
    SqliteFacilityService,
};
use crate::domain::models::{Meter, MeterStatus, MeterType, Reading};
use crate::domain::validation::{DateWindow, ValidationError};

#[derive(Clone)]
pub struct ApiState {
    pub facility_service: SqliteFacilityService,
    pub list_limit_max: u32,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeterResponse {
    pub id: i64,
    pub facility_id: i64,
    pub serial_number: String,
    #[serde(rename = "type")]
    pub meter_type: MeterType,
    pub location: Option<String>,
    pub installation_date: Option<NaiveDate>,
    pub status: MeterStatus,
}

impl From<Meter> for MeterResponse {
    fn from(meter: Meter) -> Self {
        Self {
            id: meter.id,
            facility_id: meter.facility_id,
            serial_number: meter.serial_number,
            meter_type: meter.meter_type,
            location: meter.location,
            installation_date: meter.installation_date,
            status: meter.status,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingResponse {
    pub id: i64,
    pub meter_id: i64,
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub notes: Option<String>,
}

impl From<Reading> for ReadingResponse {
    fn from(reading: Reading) -> Self {
        Self {
            id: reading.id,
            meter_id: reading.meter_id,
            date: reading.date,
            value: reading.value,
            notes: reading.notes,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResponse {
    pub reading_id: i64,
    pub outcome: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsDbResponse {
    pub schema_version: u32,
    pub facilities_count: i64,
    pub meters_count: i64,
    pub readings_count: i64,
    pub readings_by_meter_type: BTreeMap<MeterType, i64>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReadingBody {
    pub value: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MeterStatusBody {
    pub status: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(list_meters_endpoint)
        .service(update_meter_status_endpoint)
        .service(list_readings_endpoint)
        .service(upsert_reading_endpoint)
        .service(consumption_endpoint)
        .service(facility_stats_endpoint)
        .service(maintenance_stats_endpoint)
        .service(meter_stats_endpoint)
        .service(get_db_diagnostics_endpoint);
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[get("/meters")]
async fn list_meters_endpoint(
    state: web::Data<ApiState>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let limit = query.limit.unwrap_or(50).clamp(1, state.list_limit_max);
    let offset = query.offset.unwrap_or(0);

    match state.facility_service.list_meters_page(limit, offset) {
        Ok(meters) => {
            let mapped: Vec<MeterResponse> =
                meters.into_iter().map(MeterResponse::from).collect();
            HttpResponse::Ok().json(mapped)
        }
        Err(error) => service_error_response(error),
    }
}

#[put("/meters/{meter_id}/status")]
async fn update_meter_status_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<i64>,
    body: web::Json<MeterStatusBody>,
) -> impl Responder {
    let meter_id = path.into_inner();
    let status = match body.status.parse::<MeterStatus>() {
        Ok(status) => status,
        Err(error) => return validation_error_response(error),
    };

    match state.facility_service.update_meter_status(meter_id, status) {
        Ok(true) => {
            tracing::info!(meter_id, status = %status, "meter status changed");
            HttpResponse::Ok().json(serde_json::json!({ "id": meter_id, "status": status }))
        }
        Ok(false) => validation_error_response(ValidationError::UnknownMeter(meter_id)),
        Err(error) => service_error_response(error),
    }
}

#[get("/meters/{meter_id}/readings")]
async fn list_readings_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<i64>,
) -> impl Responder {
    let meter_id = path.into_inner();

    match state.facility_service.get_meter(meter_id) {
        Ok(Some(_)) => {}
        Ok(None) => return validation_error_response(ValidationError::UnknownMeter(meter_id)),
        Err(error) => return service_error_response(error),
    }

    match state.facility_service.list_readings(meter_id) {
        Ok(readings) => {
            let mapped: Vec<ReadingResponse> =
                readings.into_iter().map(ReadingResponse::from).collect();
            HttpResponse::Ok().json(mapped)
        }
        Err(error) => service_error_response(error),
    }
}

#[put("/meters/{meter_id}/readings/{date}")]
async fn upsert_reading_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<(i64, String)>,
    body: web::Json<ReadingBody>,
) -> impl Responder {
    let (meter_id, date) = path.into_inner();

    match upsert_reading(
        &state.facility_service,
        meter_id,
        &date,
        body.value,
        body.notes.as_deref(),
    ) {
        Ok(outcome) => {
            let response = UpsertResponse {
                reading_id: outcome.reading_id(),
                outcome: outcome.label(),
            };
            match outcome {
                UpsertOutcome::Inserted { .. } => HttpResponse::Created().json(response),
                UpsertOutcome::Updated { .. } => HttpResponse::Ok().json(response),
            }
        }
        Err(IngestionError::Validation(error)) => validation_error_response(error),
        Err(IngestionError::Store(error)) => service_error_response(error),
    }
}

#[get("/meters/{meter_id}/consumption")]
async fn consumption_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<i64>,
    query: web::Query<WindowQuery>,
) -> impl Responder {
    let window = match DateWindow::parse(query.from.as_deref(), query.to.as_deref()) {
        Ok(window) => window,
        Err(error) => return validation_error_response(error),
    };

    match meter_consumption_report(&state.facility_service, path.into_inner(), window) {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(ReportError::Validation(error)) => validation_error_response(error),
        Err(ReportError::Store(error)) => service_error_response(error),
    }
}

#[get("/stats/facilities")]
async fn facility_stats_endpoint(state: web::Data<ApiState>) -> impl Responder {
    match facility_overview(&state.facility_service) {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(error) => service_error_response(error),
    }
}

#[get("/stats/maintenance")]
async fn maintenance_stats_endpoint(state: web::Data<ApiState>) -> impl Responder {
    let today = Utc::now().date_naive();
    match maintenance_overview(&state.facility_service, today) {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(error) => service_error_response(error),
    }
}

#[get("/stats/meters")]
async fn meter_stats_endpoint(state: web::Data<ApiState>) -> impl Responder {
    match meter_overview(&state.facility_service) {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(error) => service_error_response(error),
    }
}

#[get("/diagnostics/db")]
async fn get_db_diagnostics_endpoint(state: web::Data<ApiState>) -> impl Responder {
    let service = &state.facility_service;

    let schema_version = match service.get_schema_version() {
        Ok(value) => value,
        Err(error) => return service_error_response(error),
    };
    let facilities_count = match service.count_facilities() {
        Ok(value) => value,
        Err(error) => return service_error_response(error),
    };
    let meters_count = match service.count_meters() {
        Ok(value) => value,
        Err(error) => return service_error_response(error),
    };
    let readings_count = match service.count_readings() {
        Ok(value) => value,
        Err(error) => return service_error_response(error),
    };
    let readings_by_meter_type = match readings_by_meter_type(service) {
        Ok(value) => value,
        Err(error) => return service_error_response(error),
    };

    HttpResponse::Ok().json(DiagnosticsDbResponse {
        schema_version,
        facilities_count,
        meters_count,
        readings_count,
        readings_by_meter_type,
    })
}

fn validation_error_response(error: ValidationError) -> HttpResponse {
    let body = serde_json::json!({ "error": error.to_string() });
    match error {
        ValidationError::UnknownMeter(_) | ValidationError::UnknownMeterSerial(_) => {
            HttpResponse::NotFound().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn service_error_response(error: ServiceError) -> HttpResponse {
    tracing::error!(error = %error, "request failed on the reading store");
    match error {
        ServiceError::DbLockPoisoned => {
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "database lock poisoned"
            }))
        }
        ServiceError::Database(error) => {
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("database query failed: {error}")
            }))
        }
    }
}
