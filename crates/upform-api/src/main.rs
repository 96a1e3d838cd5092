use upform_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    upform_infra::init_telemetry(&config.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    // Validate config, prepare storage and build routes
    let (_state, router) = upform_api::setup::initialize_app(config.clone()).await?;

    upform_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
