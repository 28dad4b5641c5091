use dotenv::dotenv;

mod application;
mod config;
mod domain;
mod infrastructure;
mod presentation;

use config::AppConfig;
use infrastructure::AppContainer;
use presentation::http::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env()?;
    tracing::info!(port = config.server.port, "starting citeweave");

    let container = AppContainer::new(config).await?;
    HttpServer::new(&container).run().await
}
