use rideshare_service::config::{Config, ServiceConfig};
use serde::{Deserialize, Serialize};

use crate::store::IdStrategy;

/// Service name used in logs and health responses
pub const SERVICE_NAME: &str = "user-service";

/// Port the service listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 3000;

/// Full configuration for the user service
pub type UserServiceConfig = Config<UserServiceSettings>;

/// Sections specific to the user service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserServiceSettings {
    #[serde(default)]
    pub users: UsersConfig,
}

/// `[users]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersConfig {
    /// Id assignment for created users (length, sequence)
    #[serde(default)]
    pub id_strategy: IdStrategy,

    /// Load the two startup users
    #[serde(default = "default_true")]
    pub seed: bool,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::default(),
            seed: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Defaults applied before `config.toml` and the environment
pub fn defaults() -> UserServiceConfig {
    Config::new(
        ServiceConfig::new(SERVICE_NAME, DEFAULT_PORT),
        UserServiceSettings::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = defaults();
        assert_eq!(config.service.name, "user-service");
        assert_eq!(config.service.port, 3000);
        assert_eq!(config.custom.users.id_strategy, IdStrategy::Length);
        assert!(config.custom.users.seed);
        assert!(config.validate().is_ok());
    }
}
