use chemstore::logging::init_tracing;
use chemstore::router::init_router;
use chemstore::state::init_app_state;
use chemstore_config::AppConfig;
use dotenvy::dotenv;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(config.log_level) {
        eprintln!("Failed to initialize logging: {}", err);
        std::process::exit(1);
    }

    let bind_addr = config.bind_addr.clone();
    let state = match init_app_state(config).await {
        Ok(state) => state,
        Err(err) => {
            error!(error = %err, "Failed to connect to database");
            std::process::exit(1);
        }
    };
    let app = init_router(state);

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, addr = %bind_addr, "Failed to bind");
            std::process::exit(1);
        }
    };
    info!(addr = %bind_addr, "Server running");

    if let Err(err) = axum::serve(listener, app).await {
        error!(error = %err, "Server stopped");
        std::process::exit(1);
    }
}
