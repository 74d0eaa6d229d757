use crate::collection::{Channel, CollectionStats};
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::statistic::{Change, IndicatorStatistic, IndicatorValue};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Tracks how many executions of the code sections of one namespace stay
/// active at the same time.
pub struct StaySetIndicator {
    channel: Channel<IndicatorStatistic>,
}

impl StaySetIndicator {
    pub fn new(namespace: &str, config: &MonitorConfig, runtime: &Handle) -> Self {
        Self {
            channel: Channel::spawn(namespace, config, runtime),
        }
    }

    pub fn namespace(&self) -> &str {
        self.channel.namespace()
    }

    pub fn indicator_point(&self, id: &str) -> IndicatorPoint {
        IndicatorPoint {
            channel: self.channel.clone(),
            id: Arc::from(id),
            epoch: self.channel.epoch(),
        }
    }

    /// Returns a handle for `id`, creating the point with `initial` as its
    /// current value. An already existing point keeps its values.
    pub async fn indicator_point_with_value(
        &self,
        id: &str,
        initial: i64,
    ) -> Result<IndicatorPoint> {
        let point = self.indicator_point(id);
        self.channel
            .register(
                point.id.clone(),
                point.epoch,
                IndicatorStatistic::with_initial(initial),
            )
            .await?;
        Ok(point)
    }

    pub async fn increase(&self, id: &str) -> Result<()> {
        self.indicator_point(id).change(Change::Increase).await
    }

    pub async fn decrease(&self, id: &str) -> Result<()> {
        self.indicator_point(id).change(Change::Decrease).await
    }

    pub async fn read(&self, id: &str) -> Result<IndicatorValue> {
        self.channel.read(id).await
    }

    pub async fn values(&self) -> Result<Vec<IndicatorValue>> {
        self.channel.values().await
    }

    /// Calls `f` for every point until it returns an error.
    pub async fn try_for_each<F, E>(&self, f: F) -> std::result::Result<(), E>
    where
        F: FnMut(IndicatorValue) -> std::result::Result<(), E>,
        E: From<crate::error::MonitorError>,
    {
        self.values().await?.into_iter().try_for_each(f)
    }

    pub async fn flush(&self) -> Result<()> {
        self.channel.flush().await
    }

    pub async fn stats(&self) -> Result<CollectionStats> {
        self.channel.stats().await
    }

    /// Discards every indicator point of this namespace. Indications still
    /// running are orphaned and their stops are ignored.
    pub async fn reset(&self) -> Result<()> {
        self.channel.reset().await
    }

    pub fn stop(&self) {
        self.channel.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.channel.is_stopped()
    }
}

/// Handle to one indicator point.
#[derive(Clone)]
pub struct IndicatorPoint {
    channel: Channel<IndicatorStatistic>,
    id: Arc<str>,
    epoch: u64,
}

impl IndicatorPoint {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn namespace(&self) -> &str {
        self.channel.namespace()
    }

    /// Counts one more active execution. The returned indication has to be
    /// stopped, otherwise the current value stays raised for good.
    pub async fn start(&self) -> Result<Indication> {
        self.change(Change::Increase).await?;
        Ok(Indication {
            owner: self.clone(),
        })
    }

    /// Keeps the point raised while `fut` runs.
    pub async fn measure_async<Fut>(&self, fut: Fut) -> Result<Fut::Output>
    where
        Fut: Future,
    {
        let indication = self.start().await?;
        let output = fut.await;
        let _ = indication.stop().await;
        Ok(output)
    }

    pub async fn value(&self) -> Result<IndicatorValue> {
        self.channel.read(&self.id).await
    }

    async fn change(&self, change: Change) -> Result<()> {
        self.channel
            .ingest(self.id.clone(), self.epoch, change)
            .await
    }
}

/// One active execution counted by an indicator point. Stopping consumes
/// it, so it balances its start exactly once.
#[must_use = "an indication keeps the point raised until it is stopped"]
pub struct Indication {
    owner: IndicatorPoint,
}

impl Indication {
    pub async fn stop(self) -> Result<()> {
        self.owner.change(Change::Decrease).await
    }
}
