use clap::Parser;
use coil_lib::cli::Cli;
use env_logger::Env;
use log::{debug, error};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize the logger from the environment
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level))
        .filter_module("sqlx", log::LevelFilter::Warn)
        .init();

    debug!("Started; args: {:?}", cli);

    if let Err(e) = coil_lib::run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
