mod cli;
mod commands;
mod config;
mod core;
mod models;
mod sources;
mod transport;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_logging(debug: bool) {
    let default = if debug { "cidar=debug" } else { "cidar=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(debug)
        .with_line_number(debug)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    init_logging(cli.debug);

    if let Err(e) = cli::run(cli).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
