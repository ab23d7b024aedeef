fn main() {
    let Some(csv_path) = std::env::args().nth(1) else {
        eprintln!("usage: facility_import <readings.csv>");
        std::process::exit(2);
    };

    if let Err(err) = facility_meters::app::run_import(&csv_path) {
        eprintln!("reading import failed: {err}");
        std::process::exit(1);
    }
}
