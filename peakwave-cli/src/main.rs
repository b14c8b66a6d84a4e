//! # Peakwave
//!
//! A terminal waveform player and peak exporter.

use log::error;

mod cli;
mod controls;
mod logging;
mod runner;
mod ui;
mod view;

fn main() {
    dotenv::dotenv().ok();
    let log_buffer = logging::init();
    let args = cli::args::build_cli().get_matches();

    let code = match runner::run(&args, log_buffer) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            eprintln!("peakwave: {}", err);
            1
        }
    };

    std::process::exit(code)
}
