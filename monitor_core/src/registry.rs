use crate::collection::CollectionStats;
use crate::config::MonitorConfig;
use crate::error::{CollectionKind, Result};
use crate::statistic::{IndicatorValue, MeteringValue};
use crate::stayset::StaySetIndicator;
use crate::stopwatch::StopWatch;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use tracing::info;

/// A per-namespace aggregate collection that a [`Registry`] can own.
#[async_trait]
pub trait Collection: Send + Sync + 'static {
    type Value: Send + 'static;

    const KIND: CollectionKind;

    fn spawn(namespace: &str, config: &MonitorConfig, runtime: &Handle) -> Self;

    fn namespace(&self) -> &str;

    async fn values(&self) -> Result<Vec<Self::Value>>;

    async fn flush(&self) -> Result<()>;

    async fn stats(&self) -> Result<CollectionStats>;

    async fn reset(&self) -> Result<()>;

    fn stop(&self);
}

#[async_trait]
impl Collection for StopWatch {
    type Value = MeteringValue;

    const KIND: CollectionKind = CollectionKind::StopWatch;

    fn spawn(namespace: &str, config: &MonitorConfig, runtime: &Handle) -> Self {
        StopWatch::new(namespace, config, runtime)
    }

    fn namespace(&self) -> &str {
        StopWatch::namespace(self)
    }

    async fn values(&self) -> Result<Vec<MeteringValue>> {
        StopWatch::values(self).await
    }

    async fn flush(&self) -> Result<()> {
        StopWatch::flush(self).await
    }

    async fn stats(&self) -> Result<CollectionStats> {
        StopWatch::stats(self).await
    }

    async fn reset(&self) -> Result<()> {
        StopWatch::reset(self).await
    }

    fn stop(&self) {
        StopWatch::stop(self)
    }
}

#[async_trait]
impl Collection for StaySetIndicator {
    type Value = IndicatorValue;

    const KIND: CollectionKind = CollectionKind::StaySetIndicator;

    fn spawn(namespace: &str, config: &MonitorConfig, runtime: &Handle) -> Self {
        StaySetIndicator::new(namespace, config, runtime)
    }

    fn namespace(&self) -> &str {
        StaySetIndicator::namespace(self)
    }

    async fn values(&self) -> Result<Vec<IndicatorValue>> {
        StaySetIndicator::values(self).await
    }

    async fn flush(&self) -> Result<()> {
        StaySetIndicator::flush(self).await
    }

    async fn stats(&self) -> Result<CollectionStats> {
        StaySetIndicator::stats(self).await
    }

    async fn reset(&self) -> Result<()> {
        StaySetIndicator::reset(self).await
    }

    fn stop(&self) {
        StaySetIndicator::stop(self)
    }
}

/// Maps namespaces to their collection, creating each one exactly once.
pub struct Registry<C: Collection> {
    collections: RwLock<HashMap<String, Arc<C>>>,
    config: MonitorConfig,
    runtime: Handle,
    stopped: AtomicBool,
}

impl<C: Collection> Registry<C> {
    pub fn new(config: MonitorConfig, runtime: Handle) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            config,
            runtime,
            stopped: AtomicBool::new(false),
        }
    }

    /// Returns the collection of `namespace`, creating it on first use.
    /// Concurrent first callers all receive the same instance.
    pub fn for_namespace(&self, namespace: &str) -> Arc<C> {
        if let Some(collection) = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(namespace)
        {
            return collection.clone();
        }

        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(collection) = collections.get(namespace) {
            return collection.clone();
        }

        let collection = Arc::new(C::spawn(namespace, &self.config, &self.runtime));
        if self.stopped.load(Ordering::Acquire) {
            collection.stop();
        }
        collections.insert(namespace.to_string(), collection.clone());
        collection
    }

    /// Returns the collection of `namespace` without creating it.
    pub fn get(&self, namespace: &str) -> Option<Arc<C>> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(namespace)
            .cloned()
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Arc<C>> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Values of every point in every namespace, in no particular order.
    pub async fn values(&self) -> Result<Vec<C::Value>> {
        let mut values = Vec::new();
        for collection in self.snapshot() {
            values.extend(collection.values().await?);
        }
        Ok(values)
    }

    pub async fn flush(&self) -> Result<()> {
        for collection in self.snapshot() {
            collection.flush().await?;
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<Vec<(String, CollectionStats)>> {
        let mut stats = Vec::new();
        for collection in self.snapshot() {
            stats.push((collection.namespace().to_string(), collection.stats().await?));
        }
        Ok(stats)
    }

    /// Discards every point of every namespace and returns how many
    /// collections were reset. Collections stay registered, so handles to
    /// them keep working; point handles obtained before the reset are
    /// orphaned and their later samples counted as such.
    pub async fn reset(&self) -> Result<usize> {
        let collections = self.snapshot();
        for collection in &collections {
            collection.reset().await?;
        }
        if !collections.is_empty() {
            info!("Reset {} registry ({} namespaces)", C::KIND, collections.len());
        }
        Ok(collections.len())
    }

    /// Stops every collection. Namespaces requested afterwards are handed
    /// out already stopped.
    pub fn stop_all(&self) {
        self.stopped.store(true, Ordering::Release);
        for collection in self.snapshot() {
            collection.stop();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::time::Duration;

    fn registry<C: Collection>() -> Registry<C> {
        Registry::new(MonitorConfig::default(), Handle::current())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_for_namespace_is_idempotent_under_concurrency() {
        let registry: Arc<Registry<StopWatch>> = Arc::new(registry());

        let tasks = (0..32).map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.for_namespace("shared") })
        });
        let collections: Vec<Arc<StopWatch>> = join_all(tasks)
            .await
            .into_iter()
            .map(|result| result.unwrap())
            .collect();

        let first = &collections[0];
        assert!(collections.iter().all(|c| Arc::ptr_eq(first, c)));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_values_across_namespaces() {
        let registry: Registry<StopWatch> = registry();

        for namespace in ["ns1", "ns2"] {
            let sw = registry.for_namespace(namespace);
            sw.metering_point("a")
                .record(Duration::from_millis(1))
                .await
                .unwrap();
            sw.metering_point("b")
                .record(Duration::from_millis(2))
                .await
                .unwrap();
        }

        let mut values: Vec<(String, String)> = registry
            .values()
            .await
            .unwrap()
            .into_iter()
            .map(|v| (v.namespace, v.id))
            .collect();
        values.sort();

        assert_eq!(
            values,
            vec![
                ("ns1".to_string(), "a".to_string()),
                ("ns1".to_string(), "b".to_string()),
                ("ns2".to_string(), "a".to_string()),
                ("ns2".to_string(), "b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_values_empty_when_nothing_recorded() {
        let registry: Registry<StaySetIndicator> = registry();
        assert!(registry.values().await.unwrap().is_empty());

        registry.for_namespace("idle");
        assert!(registry.values().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_keeps_collections_registered() {
        let registry: Registry<StaySetIndicator> = registry();
        let ssi = registry.for_namespace("ns");
        let ip = ssi.indicator_point("a");
        ip.start().await.unwrap().stop().await.unwrap();

        assert_eq!(registry.reset().await.unwrap(), 1);
        assert!(registry.values().await.unwrap().is_empty());
        assert_eq!(registry.reset().await.unwrap(), 1);
        assert!(registry.values().await.unwrap().is_empty());

        assert!(Arc::ptr_eq(&ssi, &registry.for_namespace("ns")));
        assert!(ssi.read("a").await.unwrap_err().is_not_found());

        // Handles from before the reset no longer count.
        assert!(ip.start().await.is_ok());
        assert!(ssi.read("a").await.unwrap_err().is_not_found());
        assert_eq!(ssi.stats().await.unwrap().orphaned, 1);

        ssi.increase("a").await.unwrap();
        assert_eq!(ssi.read("a").await.unwrap().current, 1);
    }

    #[tokio::test]
    async fn test_reset_empty_registry() {
        let registry: Registry<StopWatch> = registry();
        assert_eq!(registry.reset().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stop_all() {
        let registry: Registry<StopWatch> = registry();
        let sw = registry.for_namespace("ns");

        registry.stop_all();
        assert!(registry.is_stopped());
        assert!(sw.is_stopped());
        assert!(registry.for_namespace("late").is_stopped());
        assert!(registry.values().await.unwrap_err().is_stopped());
    }
}
