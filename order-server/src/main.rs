use order_server::{Config, Server, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv is optional; real deployments use env vars)
    dotenv::dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Logging: JSON to rotating files in production, pretty console
    //    in development
    let log_dir = format!("{}/logs", config.work_dir);
    if config.is_production() {
        init_logger_with_file("info", true, Some(&log_dir))?;
    } else {
        init_logger_with_file("debug", false, None)?;
    }

    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        catalog = %config.catalog_base_url,
        "Order server starting"
    );

    // 4. Run the HTTP server (background tasks start inside run())
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(anyhow::anyhow!(e));
    }

    Ok(())
}
