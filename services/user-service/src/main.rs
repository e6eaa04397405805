use rideshare_service::prelude::*;
use user_service::{config, router, AppState, UserServiceConfig, UserStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = UserServiceConfig::load(config::defaults())?;

    // Initialize tracing
    init_tracing(&config.service)?;

    let users = &config.custom.users;
    let store = if users.seed {
        UserStore::seeded(users.id_strategy)
    } else {
        UserStore::new(users.id_strategy)
    };

    info!(
        service = %config.service.name,
        port = config.service.port,
        id_strategy = ?store.strategy(),
        users = store.len().await,
        "Starting service"
    );
    info!("  GET    /api/users - List users");
    info!("  POST   /api/users - Create user");
    info!("  GET    /api/users/{{id}} - Get user");
    info!("  PUT    /api/users/{{id}} - Update user");
    info!("  DELETE /api/users/{{id}} - Delete user");

    let app = router(AppState::new(store), &config.service.name);

    Server::new(config.service, config.middleware)
        .serve(app)
        .await
}
