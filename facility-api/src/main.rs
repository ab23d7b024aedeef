fn main() {
    if let Err(err) = facility_meters::app::run_api() {
        eprintln!("api startup failed: {err}");
        std::process::exit(1);
    }
}
