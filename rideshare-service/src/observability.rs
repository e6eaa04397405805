//! Tracing initialization

use tracing_subscriber::EnvFilter;

use crate::{config::ServiceConfig, error::Result};

/// Initialize JSON tracing for a service
///
/// `RUST_LOG` takes precedence over `service.log_level` when set. Calling
/// this more than once is harmless; later calls keep the first subscriber.
pub fn init_tracing(service: &ServiceConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&service.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            environment = %service.environment,
            "Tracing initialized for service: {}",
            service.name
        );
    }

    Ok(())
}
