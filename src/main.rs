use clap::Parser;
use tracing::{error, info};

use registry_ui::config::{AppConfig, CliArgs};
use registry_ui::util::logging::init_tracing;
use registry_ui::web;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let app = web::build_app(&config);

    info!("Starting registry UI server on {}:{}", config.web.host, config.web.port);
    match web::run_server(config.web, app).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
