use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::registry::Registry;
use crate::stayset::StaySetIndicator;
use crate::stopwatch::StopWatch;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

/// Stop watches and stay-set indicators of one application, created once
/// and passed to whoever needs them.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<Inner>,
}

struct Inner {
    config: MonitorConfig,
    stop_watches: Registry<StopWatch>,
    indicators: Registry<StaySetIndicator>,
}

impl Monitor {
    /// Creates a monitor driven by the current Tokio runtime.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;
        Self::with_runtime(config, runtime)
    }

    pub fn with_runtime(config: MonitorConfig, runtime: Handle) -> Result<Self> {
        config.validate()?;

        info!(
            "Creating monitor (namespace '{}', queue {}, buffer {}, flush {:?}, overflow {:?})",
            config.default_namespace,
            config.queue_capacity,
            config.buffer_capacity,
            config.flush_interval,
            config.overflow
        );

        Ok(Self {
            inner: Arc::new(Inner {
                stop_watches: Registry::new(config.clone(), runtime.clone()),
                indicators: Registry::new(config.clone(), runtime),
                config,
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// The stop watch of the default namespace.
    pub fn stop_watch(&self) -> Arc<StopWatch> {
        self.inner
            .stop_watches
            .for_namespace(&self.inner.config.default_namespace)
    }

    /// The stay-set indicator of the default namespace.
    pub fn stay_set_indicator(&self) -> Arc<StaySetIndicator> {
        self.inner
            .indicators
            .for_namespace(&self.inner.config.default_namespace)
    }

    pub fn stop_watches(&self) -> &Registry<StopWatch> {
        &self.inner.stop_watches
    }

    pub fn indicators(&self) -> &Registry<StaySetIndicator> {
        &self.inner.indicators
    }

    /// Drops every collected value of both kinds. Collections handed out
    /// earlier stay valid; point handles handed out earlier are orphaned.
    pub async fn reset(&self) -> Result<()> {
        let stop_watches = self.inner.stop_watches.reset().await?;
        let indicators = self.inner.indicators.reset().await?;
        info!(
            "Monitor reset ({} stop watch and {} indicator namespaces)",
            stop_watches, indicators
        );
        Ok(())
    }

    /// Folds every buffered sample of both kinds.
    pub async fn flush(&self) -> Result<()> {
        self.inner.stop_watches.flush().await?;
        self.inner.indicators.flush().await
    }

    /// Terminates all control loops. Idempotent.
    pub fn stop(&self) {
        if self.is_stopped() {
            return;
        }
        info!("Stopping monitor");
        self.inner.stop_watches.stop_all();
        self.inner.indicators.stop_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stop_watches.is_stopped() && self.inner.indicators.is_stopped()
    }
}
