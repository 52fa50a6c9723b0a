//! Shared worker pool backing every pipeline task

use crate::config::RuntimeConfig;
use eyre::{Context, Result, eyre};
use std::sync::OnceLock;
use tokio::runtime::{Builder, Handle, Runtime};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn build(config: &RuntimeConfig) -> Result<Runtime> {
    config.validate()?;

    let mut builder = Builder::new_multi_thread();
    builder
        .enable_all()
        .thread_name(config.thread_name.clone())
        .max_blocking_threads(config.max_blocking_threads);
    if let Some(threads) = config.worker_threads {
        builder.worker_threads(threads);
    }

    builder.build().context("Failed to build ETL worker pool")
}

fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        let config = RuntimeConfig::from_env().unwrap_or_else(|err| {
            log::warn!("Ignoring worker pool environment: {:#}", err);
            RuntimeConfig::default()
        });
        log::debug!("Starting ETL worker pool: {:?}", config);
        build(&config).expect("failed to build shared ETL worker pool")
    })
}

/// Install the worker pool with explicit settings
///
/// Must run before the first task is spawned; the pool is otherwise built
/// lazily from the environment.
///
/// # Errors
/// Returns an error if the configuration is invalid or the pool already exists.
pub fn configure(config: &RuntimeConfig) -> Result<()> {
    if RUNTIME.get().is_some() {
        return Err(eyre!("ETL worker pool is already initialized"));
    }

    let runtime = build(config)?;
    log::debug!("Starting ETL worker pool: {:?}", config);
    RUNTIME.set(runtime).map_err(|rejected| {
        // Lost a race with lazy initialization
        rejected.shutdown_background();
        eyre!("ETL worker pool is already initialized")
    })
}

pub(crate) fn handle() -> &'static Handle {
    runtime().handle()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_after_start_fails() {
        let _ = handle();
        assert!(RUNTIME.get().is_some());

        let err = configure(&RuntimeConfig::default()).unwrap_err();
        assert!(err.to_string().contains("already initialized"));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = RuntimeConfig {
            max_blocking_threads: 0,
            ..RuntimeConfig::default()
        };
        assert!(build(&config).is_err());
    }
}
