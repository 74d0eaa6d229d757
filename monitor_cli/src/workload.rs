use futures::future::join_all;
use monitor_core::{MeteringPoint, Monitor, MonitorError};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Steps every simulated request goes through, each one a metering point.
pub const STEPS: [&str; 3] = ["parse", "process", "respond"];

/// Synthetic concurrent load: `tasks` producers each issue `iterations`
/// requests whose steps sleep for a random time up to `max_delay`.
#[derive(Debug, Clone)]
pub struct Workload {
    pub tasks: usize,
    pub iterations: usize,
    pub max_delay: Duration,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct WorkloadSummary {
    pub requests: usize,
    pub elapsed: Duration,
}

impl Workload {
    pub async fn run(&self, monitor: &Monitor) -> anyhow::Result<WorkloadSummary> {
        info!(
            "Running workload: {} tasks x {} iterations (max delay {:?}, seed {})",
            self.tasks, self.iterations, self.max_delay, self.seed
        );
        let started = Instant::now();

        let handles = (0..self.tasks).map(|task| {
            let stop_watch = monitor.stop_watch();
            let in_flight = monitor.stay_set_indicator().indicator_point("in_flight");
            let request = stop_watch.metering_point("request");
            let steps: Vec<MeteringPoint> =
                STEPS.iter().map(|step| stop_watch.metering_point(step)).collect();
            let workload = self.clone();

            tokio::spawn(async move {
                let mut rng = StdRng::seed_from_u64(workload.seed.wrapping_add(task as u64));
                let max_delay = delay_bound_micros(workload.max_delay);

                for _ in 0..workload.iterations {
                    let indication = in_flight.start().await?;
                    let measurement = request.start();
                    for step in &steps {
                        let delay = Duration::from_micros(rng.gen_range(0..=max_delay));
                        step.measure_async(tokio::time::sleep(delay)).await;
                    }
                    measurement.stop().await?;
                    indication.stop().await?;
                }

                debug!("Workload task {} finished", task);
                Ok::<(), MonitorError>(())
            })
        });

        for result in join_all(handles).await {
            result??;
        }
        monitor.flush().await?;

        Ok(WorkloadSummary {
            requests: self.tasks * self.iterations,
            elapsed: started.elapsed(),
        })
    }
}

fn delay_bound_micros(max_delay: Duration) -> u64 {
    u64::try_from(max_delay.as_micros()).unwrap_or(u64::MAX)
}
