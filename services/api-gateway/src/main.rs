use api_gateway::{app, config, GatewayConfig};
use rideshare_service::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = GatewayConfig::load(config::defaults())?;

    // Initialize tracing
    init_tracing(&config.service)?;

    info!(
        service = %config.service.name,
        port = config.service.port,
        upstream = %config.custom.upstreams.users,
        "Starting service"
    );

    let app = app(&config.custom)?;

    info!("  ANY /api/users[/{{path}}] - Proxied to {}", config.custom.upstreams.users);
    info!("  GET /metrics - Prometheus metrics");
    info!("  GET /health - Health check");

    Server::new(config.service, config.middleware)
        .serve(app)
        .await
}
