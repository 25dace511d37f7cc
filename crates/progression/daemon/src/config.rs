//! Configuration for progressiond

use progression_service::ServiceConfig;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Orchestrator settings, including the stage rules
    #[serde(default)]
    pub service: ServiceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Development data for the in-memory collaborators
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    /// JSON file with memberships, enrollments, attendance and assessments
    #[serde(default)]
    pub directory_file: Option<String>,

    /// Badges accepted in addition to the standard catalog
    #[serde(default)]
    pub extra_badges: Vec<String>,
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Layer defaults, an optional file and `PROGRESSION_*` variables.
    ///
    /// Nested keys are separated by a double underscore, for example
    /// `PROGRESSION_SERVER__LISTEN_ADDR`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PROGRESSION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progression_types::OrganizationType;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert!(config.server.enable_cors);
        assert_eq!(config.logging.level, "info");
        assert!(config.seed.directory_file.is_none());
        assert_eq!(config.service.max_commit_attempts, 5);
    }

    #[test]
    fn test_sections_deserialize_with_defaults() {
        let config: DaemonConfig = serde_json::from_str(
            r#"{
                "server": {"listen_addr": "0.0.0.0:9090"},
                "service": {
                    "default_organization_type": "school",
                    "rules": {"min_attendance_rate": 0.8}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.server.listen_addr.port(), 9090);
        assert!(config.server.enable_cors);
        assert_eq!(
            config.service.default_organization_type,
            OrganizationType::School
        );
        assert_eq!(config.service.rules.min_attendance_rate, 0.8);
        assert_eq!(config.service.rules.min_dwell.school_days, 90);
    }
}
