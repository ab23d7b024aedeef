use std::path::Path;
use std::sync::{Arc, Mutex};

use facility_meters::adapters::db::{open_connection, run_migrations, schema_version};
use facility_meters::app::seed::seed_demo_data;
use facility_meters::app::services::SqliteFacilityService;

fn main() {
    if let Err(error) = run() {
        eprintln!("failed to create test db: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut path = "./data/facility_test.db".to_string();
    let mut force = false;
    let mut seed = false;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--path" => {
                let Some(value) = args.get(index + 1) else {
                    return Err("--path requires a value".to_string());
                };
                path = value.clone();
                index += 2;
            }
            "--force" => {
                force = true;
                index += 1;
            }
            "--seed" => {
                seed = true;
                index += 1;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                return Err(format!("unknown argument: {other}"));
            }
        }
    }

    facility_meters::app::init_logging().map_err(|error| error.to_string())?;

    let path_ref = Path::new(&path);
    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|error| format!("failed to create parent directory: {error}"))?;
    }

    if force && path_ref.exists() {
        std::fs::remove_file(path_ref)
            .map_err(|error| format!("failed to remove existing db file: {error}"))?;
    }

    let mut connection = open_connection(&path).map_err(|error| error.to_string())?;
    run_migrations(&mut connection).map_err(|error| error.to_string())?;
    let version = schema_version(&connection).map_err(|error| error.to_string())?;

    println!("created/updated test db at: {path}");
    println!("schema version: {version}");

    if seed {
        let service = SqliteFacilityService::new(Arc::new(Mutex::new(connection)));
        let summary = seed_demo_data(&service).map_err(|error| error.to_string())?;
        println!(
            "seeded: {} facilities, {} meters, {} readings, {} maintenance records",
            summary.facilities, summary.meters, summary.readings, summary.maintenance_records
        );
    }

    Ok(())
}

fn print_help() {
    println!("create_test_db");
    println!();
    println!("Usage:");
    println!("  cargo run --bin create_test_db -- [--path <file>] [--force] [--seed]");
    println!();
    println!("Options:");
    println!("  --path <file>   target sqlite file (default: ./data/facility_test.db)");
    println!("  --force         delete existing file before creating");
    println!("  --seed          insert demo facilities, meters and readings into an empty db");
}
