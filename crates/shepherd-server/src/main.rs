use tracing_subscriber::EnvFilter;

use shepherd_core::ShepherdConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ShepherdConfig::load_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = shepherd_server::run(config).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
