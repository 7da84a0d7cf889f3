use crate::config::{UsageLogBackend, UsageLogConfig};
use crate::error::{AppError, Result};
use crate::usage::{InMemoryUsageLog, SledUsageLog, UsageLogStore};
use std::sync::Arc;

/// Create a usage log store based on configuration; `None` when usage logging is disabled
pub fn create_usage_store(config: &UsageLogConfig) -> Result<Option<Arc<dyn UsageLogStore>>> {
    if !config.enabled {
        tracing::info!("Usage logging disabled in configuration");
        return Ok(None);
    }

    match config.backend {
        UsageLogBackend::Sled => {
            let path = config.path.as_ref().ok_or_else(|| {
                AppError::Configuration("Sled usage log requires 'path' configuration".to_string())
            })?;

            tracing::info!(path = ?path, "Initializing Sled usage log backend");

            let store = SledUsageLog::new(path)?;
            Ok(Some(Arc::new(store)))
        }

        UsageLogBackend::Memory => Ok(Some(create_in_memory_usage_store())),
    }
}

/// Create an in-memory usage log (for testing and development)
pub fn create_in_memory_usage_store() -> Arc<dyn UsageLogStore> {
    tracing::info!("Initializing in-memory usage log backend");
    Arc::new(InMemoryUsageLog::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_sled_store() {
        let temp_dir = TempDir::new().unwrap();
        let config = UsageLogConfig {
            enabled: true,
            backend: UsageLogBackend::Sled,
            path: Some(temp_dir.path().to_path_buf()),
        };

        let store = create_usage_store(&config).unwrap().unwrap();
        assert_eq!(store.backend(), "sled");
    }

    #[test]
    fn test_sled_without_path_is_configuration_error() {
        let config = UsageLogConfig {
            enabled: true,
            backend: UsageLogBackend::Sled,
            path: None,
        };

        let result = create_usage_store(&config);
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_disabled_usage_log() {
        let config = UsageLogConfig {
            enabled: false,
            ..UsageLogConfig::default()
        };

        assert!(create_usage_store(&config).unwrap().is_none());
    }
}
