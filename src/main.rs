use std::process::exit;

fn main() {
    if let Err(e) = fuzzbuster::app::run_cli() {
        fuzzbuster::app::report_error(&e);
        exit(1);
    }
}
