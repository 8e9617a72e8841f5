fn main() {
    if let Err(err) = csv_design::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
