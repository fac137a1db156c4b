use serde::Deserialize;

use crate::catalog_repository::PostgresCatalogRepositoryConfig;

/// Service settings read from environment variables, e.g. `DB_HOST` sets `db_host`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_pool_size: usize,
    /// Skips postgres entirely, data is lost on restart
    pub use_in_memory_db: bool,
    pub http_port: u16,
}

impl Settings {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("db_host", "127.0.0.1")?
            .set_default("db_port", 5432_i64)?
            .set_default("db_user", "postgres")?
            .set_default("db_password", "postgres")?
            .set_default("db_name", "postgres")?
            .set_default("db_pool_size", 16_i64)?
            .set_default("use_in_memory_db", false)?
            .set_default("http_port", 8080_i64)?
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    pub fn repository_config(&self) -> PostgresCatalogRepositoryConfig {
        PostgresCatalogRepositoryConfig {
            hostname: self.db_host.clone(),
            port: self.db_port,
            username: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_name.clone(),
            pool_size: self.db_pool_size,
        }
    }
}

#[cfg(test)]
mod settings_tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        config::Environment::default().source(Some(
            vars.iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        ))
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let settings = Settings::from_environment(environment(&[])).unwrap();
        assert_eq!(
            settings,
            Settings {
                db_host: "127.0.0.1".to_string(),
                db_port: 5432,
                db_user: "postgres".to_string(),
                db_password: "postgres".to_string(),
                db_name: "postgres".to_string(),
                db_pool_size: 16,
                use_in_memory_db: false,
                http_port: 8080,
            }
        );
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let settings = Settings::from_environment(environment(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_USER", "library"),
            ("DB_PASSWORD", "12345"),
            ("DB_NAME", "catalog"),
            ("USE_IN_MEMORY_DB", "true"),
        ]))
        .unwrap();

        assert_eq!(settings.db_host, "db.internal");
        assert_eq!(settings.db_port, 6543);
        assert_eq!(settings.db_password, "12345");
        assert!(settings.use_in_memory_db);

        let repository_config = settings.repository_config();
        assert_eq!(repository_config.database, "catalog");
        assert_eq!(repository_config.username, "library");
    }

    #[test]
    fn test_numeric_looking_credentials_are_kept_verbatim() {
        let settings = Settings::from_environment(environment(&[
            ("DB_PASSWORD", "0123"),
            ("DB_NAME", "1e3"),
            ("DB_USER", "true"),
            ("HTTP_PORT", "9090"),
        ]))
        .unwrap();

        assert_eq!(settings.db_password, "0123");
        assert_eq!(settings.db_name, "1e3");
        assert_eq!(settings.db_user, "true");
        assert_eq!(settings.http_port, 9090);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(Settings::from_environment(environment(&[("DB_PORT", "not-a-port")])).is_err());
    }
}
