use std::sync::{Arc, Mutex};

use facility_meters::app::reports::meter_consumption_report;
use facility_meters::app::services::{MeterQueryHandler, SqliteFacilityService};
use facility_meters::app::{AppConfig, open_store};
use facility_meters::domain::consumption::ConsumptionReport;
use facility_meters::domain::validation::DateWindow;

struct Args {
    serial_number: String,
    from: Option<String>,
    to: Option<String>,
    db_path: Option<String>,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("meter report failed: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(args) = parse_args()? else {
        return Ok(());
    };

    facility_meters::app::init_logging().map_err(|error| error.to_string())?;

    let db_path = match args.db_path {
        Some(path) => path,
        None => AppConfig::from_env().map_err(|error| error.to_string())?.db_path,
    };
    let window = DateWindow::parse(args.from.as_deref(), args.to.as_deref())
        .map_err(|error| error.to_string())?;

    let connection = open_store(&db_path).map_err(|error| error.to_string())?;
    let service = SqliteFacilityService::new(Arc::new(Mutex::new(connection)));

    let meter = service
        .get_meter_by_serial(&args.serial_number)
        .map_err(|error| error.to_string())?
        .ok_or_else(|| format!("no meter with serial number '{}'", args.serial_number))?;
    let report =
        meter_consumption_report(&service, meter.id, window).map_err(|error| error.to_string())?;

    println!(
        "Meter {} ({}, {}) | status: {}",
        meter.serial_number,
        meter.meter_type,
        meter.location.as_deref().unwrap_or("n/a"),
        meter.status
    );
    print_report(&report);
    Ok(())
}

fn print_report(report: &ConsumptionReport) {
    let native = report.native_unit.symbol();
    let reporting = report.reporting_unit.symbol();

    match (report.from, report.to) {
        (None, None) => println!("  Window: full history"),
        (from, to) => println!(
            "  Window: {} .. {}",
            from.map_or_else(|| "start".to_string(), |date| date.to_string()),
            to.map_or_else(|| "end".to_string(), |date| date.to_string())
        ),
    }

    if report.periods.is_empty() {
        println!("  No consumption periods in window");
    }
    for line in &report.periods {
        println!(
            "  {}  {:>12.3} {native}  {:>10.4} {reporting}{}",
            line.date,
            line.delta,
            line.converted_delta,
            if line.clamped { "  (reset, clamped)" } else { "" }
        );
    }

    for (month, total) in &report.monthly {
        println!("  Month {month}: {total:.4} {reporting}");
    }

    println!(
        "  Total (last - first): {:.3} {native} = {:.4} {reporting}",
        report.total_raw, report.total_converted
    );
}

fn parse_args() -> Result<Option<Args>, String> {
    let mut serial_number = None;
    let mut from = None;
    let mut to = None;
    let mut db_path = None;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut index = 0;
    while index < args.len() {
        let flag = args[index].as_str();
        if flag == "--help" || flag == "-h" {
            print_help();
            return Ok(None);
        }

        let Some(value) = args.get(index + 1).cloned() else {
            return Err(format!("{flag} requires a value"));
        };
        match flag {
            "--serial" => serial_number = Some(value),
            "--from" => from = Some(value),
            "--to" => to = Some(value),
            "--path" => db_path = Some(value),
            other => return Err(format!("unknown argument: {other}")),
        }
        index += 2;
    }

    let serial_number = serial_number.ok_or_else(|| "--serial is required".to_string())?;
    Ok(Some(Args {
        serial_number,
        from,
        to,
        db_path,
    }))
}

fn print_help() {
    println!("meter_report");
    println!();
    println!("Usage:");
    println!(
        "  cargo run --bin meter_report -- --serial <serial> [--from YYYY-MM-DD] [--to YYYY-MM-DD] [--path <file>]"
    );
    println!();
    println!("Without --path the database from DB_PATH (or ./data/facility.db) is used.");
}
