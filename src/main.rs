mod cli;
mod config;
mod mission;
mod model;
mod stream;
mod telemetry;
mod tui;

use std::process;

use clap::Parser;

use cli::Cli;
use config::Config;
use stream::StreamController;

fn main() {
    let cli = Cli::parse();

    // The console owns the terminal, so it logs to a file instead.
    let log_guard = match cli.command {
        Some(_) => {
            telemetry::init_stderr();
            None
        }
        None => telemetry::init_file(),
    };

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            process::exit(1);
        }
    };

    let endpoint = match config.endpoint(cli.endpoint.as_deref()) {
        Ok(url) => url,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to start async runtime: {e}");
            process::exit(1);
        }
    };

    let mut controller =
        StreamController::new(endpoint, config.classifier, runtime.handle().clone());

    let result = match cli.command {
        Some(command) => cli::run(command, &config, &mut controller, &runtime),
        None => tui::run(&mut controller, &config.defaults).map_err(|e| e.to_string()),
    };

    // Flush the log file before exiting.
    drop(log_guard);

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
