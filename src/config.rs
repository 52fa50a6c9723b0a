//! Worker pool configuration

use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default thread name prefix for pool threads
pub const DEFAULT_THREAD_NAME: &str = "etl-worker";

/// Default cap on threads running synchronous reader and writer bodies
pub const DEFAULT_MAX_BLOCKING_THREADS: usize = 512;

/// Settings for the shared worker pool every pipeline task is scheduled on
///
/// Loaded from a JSON file, from environment variables, or left at defaults.
///
/// # Example
/// ```
/// use etl_chain::config::RuntimeConfig;
///
/// let config: RuntimeConfig = serde_json::from_str(r#"{"worker_threads": 4}"#).unwrap();
/// assert_eq!(config.worker_threads, Some(4));
/// assert_eq!(config.thread_name, "etl-worker");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of async worker threads (`None` lets tokio use one per core)
    pub worker_threads: Option<usize>,

    /// Upper bound on the blocking pool that runs synchronous bodies
    pub max_blocking_threads: usize,

    /// Thread name prefix
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            max_blocking_threads: DEFAULT_MAX_BLOCKING_THREADS,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables
    ///
    /// Recognized variables:
    /// - ETL_WORKER_THREADS: async worker thread count (optional)
    /// - ETL_MAX_BLOCKING_THREADS: blocking pool size (optional, defaults to 512)
    /// - ETL_THREAD_NAME: thread name prefix (optional, defaults to "etl-worker")
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("ETL_WORKER_THREADS") {
            let threads = value
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid ETL_WORKER_THREADS: {}", value))?;
            config.worker_threads = Some(threads);
        }

        if let Ok(value) = std::env::var("ETL_MAX_BLOCKING_THREADS") {
            config.max_blocking_threads = value
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid ETL_MAX_BLOCKING_THREADS: {}", value))?;
        }

        if let Ok(name) = std::env::var("ETL_THREAD_NAME") {
            config.thread_name = name;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read runtime config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse runtime config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings tokio would panic on
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == Some(0) {
            bail!("worker_threads must be greater than zero");
        }
        if self.max_blocking_threads == 0 {
            bail!("max_blocking_threads must be greater than zero");
        }
        if self.thread_name.trim().is_empty() {
            bail!("thread_name must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn clear_env() {
        // The pool reads these variables on first use
        let _ = crate::etl::runtime::handle();

        // SAFETY: after the pool exists only `serial` tests in this module
        // read the environment, and they hold the same lock.
        unsafe {
            std::env::remove_var("ETL_WORKER_THREADS");
            std::env::remove_var("ETL_MAX_BLOCKING_THREADS");
            std::env::remove_var("ETL_THREAD_NAME");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = RuntimeConfig::from_env().unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        unsafe {
            std::env::set_var("ETL_WORKER_THREADS", "3");
            std::env::set_var("ETL_MAX_BLOCKING_THREADS", "16");
            std::env::set_var("ETL_THREAD_NAME", "pump");
        }

        let config = RuntimeConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.worker_threads, Some(3));
        assert_eq!(config.max_blocking_threads, 16);
        assert_eq!(config.thread_name, "pump");
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        clear_env();
        unsafe {
            std::env::set_var("ETL_WORKER_THREADS", "many");
        }

        let err = RuntimeConfig::from_env().unwrap_err();
        clear_env();

        assert!(err.to_string().contains("ETL_WORKER_THREADS"));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_zero_workers() {
        clear_env();
        unsafe {
            std::env::set_var("ETL_WORKER_THREADS", "0");
        }

        let result = RuntimeConfig::from_env();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_blocking_threads": 8, "thread_name": "loader"}}"#).unwrap();

        let config = RuntimeConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.worker_threads, None);
        assert_eq!(config.max_blocking_threads, 8);
        assert_eq!(config.thread_name, "loader");
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = RuntimeConfig::from_json_file("/nonexistent/runtime.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read runtime config"));
    }
}
