use crate::collection::{Channel, CollectionStats};
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::statistic::{MeteringStatistic, MeteringValue};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;

/// Measures execution times of the code sections of one namespace.
pub struct StopWatch {
    channel: Channel<MeteringStatistic>,
}

impl StopWatch {
    pub fn new(namespace: &str, config: &MonitorConfig, runtime: &Handle) -> Self {
        Self {
            channel: Channel::spawn(namespace, config, runtime),
        }
    }

    pub fn namespace(&self) -> &str {
        self.channel.namespace()
    }

    /// Returns a handle for the given id. The point itself comes into
    /// existence with its first completed measurement.
    pub fn metering_point(&self, id: &str) -> MeteringPoint {
        MeteringPoint {
            channel: self.channel.clone(),
            id: Arc::from(id),
            epoch: self.channel.epoch(),
        }
    }

    /// Runs `f` and records its execution time under `id`.
    pub async fn measure<F, T>(&self, id: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.metering_point(id).measure(f).await
    }

    pub async fn read(&self, id: &str) -> Result<MeteringValue> {
        self.channel.read(id).await
    }

    pub async fn values(&self) -> Result<Vec<MeteringValue>> {
        self.channel.values().await
    }

    /// Calls `f` for every point until it returns an error.
    pub async fn try_for_each<F, E>(&self, f: F) -> std::result::Result<(), E>
    where
        F: FnMut(MeteringValue) -> std::result::Result<(), E>,
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

    /// Discards every metering point of this namespace. Points and
    /// measurements handed out before are orphaned; what they record later
    /// is counted as orphaned and otherwise ignored.
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

/// Handle to one metering point.
#[derive(Clone)]
pub struct MeteringPoint {
    channel: Channel<MeteringStatistic>,
    id: Arc<str>,
    epoch: u64,
}

impl MeteringPoint {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn namespace(&self) -> &str {
        self.channel.namespace()
    }

    pub fn start(&self) -> Measurement {
        Measurement {
            owner: self.clone(),
            started: Instant::now(),
        }
    }

    /// Records an externally measured duration.
    pub async fn record(&self, duration: Duration) -> Result<()> {
        self.channel
            .ingest(self.id.clone(), self.epoch, duration)
            .await
    }

    /// Runs `f` and records its execution time. A rejected sample is logged
    /// by the collection and otherwise ignored.
    pub async fn measure<F, T>(&self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let measurement = self.start();
        let output = f();
        let _ = measurement.stop().await;
        output
    }

    /// Like [`measure`](Self::measure) for a future.
    pub async fn measure_async<Fut>(&self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        let measurement = self.start();
        let output = fut.await;
        let _ = measurement.stop().await;
        output
    }

    pub async fn value(&self) -> Result<MeteringValue> {
        self.channel.read(&self.id).await
    }
}

/// A running measurement. Stopping consumes it, so it ends exactly once.
#[must_use = "a measurement records nothing until it is stopped"]
pub struct Measurement {
    owner: MeteringPoint,
    started: Instant,
}

impl Measurement {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Ends the measurement and hands its duration to the stop watch.
    pub async fn stop(self) -> Result<Duration> {
        let duration = self.started.elapsed();
        self.owner.record(duration).await?;
        Ok(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use tokio::time::sleep;

    fn stop_watch(namespace: &str) -> StopWatch {
        StopWatch::new(namespace, &MonitorConfig::default(), &Handle::current())
    }

    #[tokio::test]
    async fn test_recorded_durations() {
        let sw = stop_watch("ns");
        let mp = sw.metering_point("a");

        for millis in [1, 2, 3] {
            mp.record(Duration::from_millis(millis)).await.unwrap();
        }

        let values = sw.values().await.unwrap();
        assert_eq!(
            values,
            vec![MeteringValue {
                namespace: "ns".to_string(),
                id: "a".to_string(),
                quantity: 3,
                total: Duration::from_millis(6),
                minimum: Duration::from_millis(1),
                maximum: Duration::from_millis(3),
                average: Some(Duration::from_millis(2)),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_measurement_uses_elapsed_time() {
        let sw = stop_watch("ns");
        let mp = sw.metering_point("sleep");

        let measurement = mp.start();
        sleep(Duration::from_millis(10)).await;
        let duration = measurement.stop().await.unwrap();
        assert_eq!(duration, Duration::from_millis(10));

        let output = mp
            .measure_async(async {
                sleep(Duration::from_millis(30)).await;
                42
            })
            .await;
        assert_eq!(output, 42);

        let value = mp.value().await.unwrap();
        assert_eq!(value.quantity, 2);
        assert_eq!(value.minimum, Duration::from_millis(10));
        assert_eq!(value.maximum, Duration::from_millis(30));
        assert_eq!(value.average, Some(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_measure_closure() {
        let sw = stop_watch("ns");

        let sum = sw.measure("simple", || (1..=10).sum::<u32>()).await;
        assert_eq!(sum, 55);

        let value = sw.read("simple").await.unwrap();
        assert_eq!(value.id, "simple");
        assert_eq!(value.quantity, 1);
    }

    #[tokio::test]
    async fn test_read_unknown_id() {
        let sw = stop_watch("ns");
        sw.metering_point("never-recorded");

        let err = sw.read("never-recorded").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_producers() {
        let sw = Arc::new(stop_watch("ns"));

        let tasks = (0..8).map(|task| {
            let mp = sw.metering_point("shared");
            tokio::spawn(async move {
                for i in 0..250u64 {
                    mp.record(Duration::from_micros(task * 1000 + i)).await.unwrap();
                }
            })
        });
        for result in join_all(tasks).await {
            result.unwrap();
        }

        let value = sw.read("shared").await.unwrap();
        assert_eq!(value.quantity, 2000);
        assert_eq!(value.minimum, Duration::from_micros(0));
        assert_eq!(value.maximum, Duration::from_micros(7249));
        let average = value.average.unwrap();
        assert!(value.minimum <= average && average <= value.maximum);
    }

    #[tokio::test]
    async fn test_try_for_each_stops_at_error() {
        let sw = stop_watch("ns");
        for id in ["a", "b", "c"] {
            sw.metering_point(id)
                .record(Duration::from_millis(1))
                .await
                .unwrap();
        }

        let mut seen = 0;
        let result: anyhow::Result<()> = sw
            .try_for_each(|_| {
                seen += 1;
                if seen == 2 {
                    anyhow::bail!("enough");
                }
                Ok(())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn test_reset_discards_points() {
        let sw = stop_watch("ns");
        let old = sw.metering_point("a");
        old.record(Duration::from_millis(1)).await.unwrap();

        sw.reset().await.unwrap();
        assert!(sw.values().await.unwrap().is_empty());

        old.record(Duration::from_millis(2)).await.unwrap();
        assert!(sw.values().await.unwrap().is_empty());
        assert_eq!(sw.stats().await.unwrap().orphaned, 1);

        sw.metering_point("a")
            .record(Duration::from_millis(3))
            .await
            .unwrap();
        assert_eq!(sw.read("a").await.unwrap().total, Duration::from_millis(3));
    }

    #[tokio::test]
    async fn test_stop() {
        let sw = stop_watch("ns");
        let mp = sw.metering_point("a");
        sw.stop();

        assert!(sw.is_stopped());
        let measurement = mp.start();
        assert!(measurement.stop().await.unwrap_err().is_stopped());
    }
}
