use animal_happiness_api::{
    config::{Config, Transport},
    initialize, logging, transport,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let config = Config::from_env().inspect_err(|err| {
        error!(error = %err, "invalid configuration");
    })?;
    let app = initialize(&config).await?;

    match config.transport {
        Transport::Listener => {
            let bind_socket = config.bind_socket()?;
            info!(
                bind_addr = %config.bind_addr,
                bind_port = config.bind_port,
                "server starting"
            );
            transport::serve_listener(app, bind_socket).await?;
        }
        Transport::Function => transport::serve_function(app).await?,
    }

    Ok(())
}
