//! Dependency initialization and wiring for the masjid directory.

use std::sync::Arc;
use std::time::Duration;

use masjid_directory_repository::{MasjidService, MasjidStore, PostgresMasjidStore};
use tokio::time::sleep;
use tracing::{info, warn};

use super::settings::{ConnectionMode, DatabaseSettings};
use crate::AppError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The directory service, backed by PostgreSQL.
    pub service: MasjidService,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`DatabaseSettings::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError)` - If initialization fails (connection only in fail-fast mode)
    pub async fn new() -> Result<Self, AppError> {
        let settings = DatabaseSettings::from_env()?;
        Self::from_settings(settings).await
    }

    /// Initialize dependencies from already parsed settings.
    pub async fn from_settings(settings: DatabaseSettings) -> Result<Self, AppError> {
        info!(
            max_connections = settings.max_connections,
            connection_mode = ?settings.connection_mode,
            retry_interval_secs = settings.retry_interval.as_secs(),
            max_slug_attempts = settings.service.max_slug_attempts,
            "Initializing dependencies"
        );

        let store = Self::connect_to_postgres(
            &settings.database_url,
            settings.max_connections,
            settings.connection_mode,
            settings.retry_interval,
        )
        .await?;

        info!("PostgreSQL connection established");

        // Exits if the schema and its indexes cannot be created
        store
            .ensure_indexes()
            .await
            .map_err(|e| AppError::config(format!("Failed to ensure indexes exist: {}", e)))?;

        let service = MasjidService::with_config(Arc::new(store), settings.service);

        Ok(Self { service })
    }

    /// Connect to PostgreSQL with retry logic based on connection mode.
    async fn connect_to_postgres(
        url: &str,
        max_connections: u32,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<PostgresMasjidStore, AppError> {
        loop {
            match PostgresMasjidStore::connect(url, max_connections).await {
                Ok(store) => return Ok(store),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(AppError::config(format!(
                            "Failed to connect to PostgreSQL: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to PostgreSQL, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use masjid_directory_repository::MasjidServiceConfig;

    #[tokio::test]
    async fn test_fail_fast_reports_unreachable_database() {
        let settings = DatabaseSettings {
            database_url: "not-a-database-url".to_string(),
            max_connections: 1,
            connection_mode: ConnectionMode::FailFast,
            retry_interval: Duration::from_secs(1),
            service: MasjidServiceConfig::default(),
        };

        let result = Dependencies::from_settings(settings).await;

        match result {
            Err(AppError::ConfigError(msg)) => {
                assert!(msg.starts_with("Failed to connect to PostgreSQL"))
            }
            Err(other) => panic!("expected config error, got {}", other),
            Ok(_) => panic!("expected connection failure"),
        }
    }
}
