//! The single-consumer control loop behind every collection.
//!
//! Producers only ever touch the sending half of a bounded queue. Points,
//! their buffers and the id map live inside the loop task and are never
//! shared, so they need no locking.

use crate::config::{MonitorConfig, OverflowPolicy};
use crate::error::{MonitorError, Result};
use crate::point::Point;
use crate::statistic::Statistic;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub(crate) enum Command<S: Statistic> {
    Ingest {
        id: Arc<str>,
        epoch: u64,
        sample: S::Sample,
    },
    Register {
        id: Arc<str>,
        epoch: u64,
        seed: S,
    },
    Read {
        id: String,
        reply: oneshot::Sender<Option<S::Value>>,
    },
    Values {
        reply: oneshot::Sender<Vec<S::Value>>,
    },
    Flush {
        reply: oneshot::Sender<()>,
    },
    Stats {
        reply: oneshot::Sender<(usize, usize)>,
    },
    Reset {
        epoch: u64,
    },
}

#[derive(Debug, Default)]
struct Counters {
    dropped: AtomicU64,
    orphaned: AtomicU64,
}

/// Operational counters of one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Points currently owned.
    pub points: usize,
    /// Samples buffered but not yet folded.
    pub pending: usize,
    /// Commands discarded because the queue was full.
    pub dropped: u64,
    /// Samples discarded because they came from a handle older than the
    /// last reset.
    pub orphaned: u64,
}

struct ControlLoop<S: Statistic> {
    namespace: Arc<str>,
    points: HashMap<Arc<str>, Point<S>>,
    epoch: u64,
    buffer_capacity: usize,
    counters: Arc<Counters>,
}

impl<S: Statistic> ControlLoop<S> {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command<S>>,
        flush_interval: Duration,
        shutdown: CancellationToken,
    ) {
        let mut ticker = time::interval_at(Instant::now() + flush_interval, flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let folded = self.flush_all();
                    if folded > 0 {
                        debug!(
                            "Periodic flush of {} '{}' folded {} samples",
                            S::KIND, self.namespace, folded
                        );
                    }
                }
                command = commands.recv() => match command {
                    Some(command) => self.execute(command),
                    None => break,
                },
            }
        }

        commands.close();
        let mut discarded = 0;
        while commands.try_recv().is_ok() {
            discarded += 1;
        }

        info!(
            "Stopped {} '{}' ({} queued commands discarded)",
            S::KIND, self.namespace, discarded
        );
    }

    fn execute(&mut self, command: Command<S>) {
        match command {
            Command::Ingest { id, epoch, sample } => {
                if self.admit(epoch) {
                    let capacity = self.buffer_capacity;
                    self.points
                        .entry(id)
                        .or_insert_with(|| Point::new(capacity))
                        .ingest(sample);
                }
            }
            Command::Register { id, epoch, seed } => {
                if self.admit(epoch) {
                    let capacity = self.buffer_capacity;
                    self.points
                        .entry(id)
                        .or_insert_with(|| Point::with_statistic(seed, capacity));
                }
            }
            Command::Read { id, reply } => {
                let namespace = &self.namespace;
                let value = self.points.get_mut(id.as_str()).map(|point| {
                    point.flush();
                    point.statistic().value(namespace, &id)
                });
                let _ = reply.send(value);
            }
            Command::Values { reply } => {
                self.flush_all();
                let values = self
                    .points
                    .iter()
                    .map(|(id, point)| point.statistic().value(&self.namespace, id))
                    .collect();
                let _ = reply.send(values);
            }
            Command::Flush { reply } => {
                self.flush_all();
                let _ = reply.send(());
            }
            Command::Stats { reply } => {
                let pending = self.points.values().map(Point::pending).sum();
                let _ = reply.send((self.points.len(), pending));
            }
            Command::Reset { epoch } => {
                // Already applied when a newer handle's sample overtook it.
                if epoch > self.epoch {
                    self.reset(epoch);
                }
            }
        }
    }

    fn admit(&mut self, epoch: u64) -> bool {
        if epoch < self.epoch {
            self.counters.orphaned.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Discarded sample from orphaned handle of {} '{}' (epoch {} < {})",
                S::KIND, self.namespace, epoch, self.epoch
            );
            return false;
        }
        if epoch > self.epoch {
            // The matching reset is still queued behind this command.
            self.reset(epoch);
        }
        true
    }

    fn reset(&mut self, epoch: u64) {
        info!(
            "Reset {} '{}' discarding {} points",
            S::KIND,
            self.namespace,
            self.points.len()
        );
        self.points = HashMap::new();
        self.epoch = epoch;
    }

    fn flush_all(&mut self) -> usize {
        self.points.values_mut().map(Point::flush).sum()
    }
}

/// Producer-side handle to a running control loop.
pub(crate) struct Channel<S: Statistic> {
    namespace: Arc<str>,
    commands: mpsc::Sender<Command<S>>,
    epoch: Arc<AtomicU64>,
    counters: Arc<Counters>,
    overflow: OverflowPolicy,
    shutdown: CancellationToken,
}

impl<S: Statistic> Clone for Channel<S> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            commands: self.commands.clone(),
            epoch: self.epoch.clone(),
            counters: self.counters.clone(),
            overflow: self.overflow,
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<S: Statistic> Channel<S> {
    pub(crate) fn spawn(namespace: &str, config: &MonitorConfig, runtime: &Handle) -> Self {
        let namespace: Arc<str> = Arc::from(namespace);
        let (commands, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let counters = Arc::new(Counters::default());
        let shutdown = CancellationToken::new();

        let control = ControlLoop::<S> {
            namespace: namespace.clone(),
            points: HashMap::new(),
            epoch: 0,
            buffer_capacity: config.buffer_capacity,
            counters: counters.clone(),
        };
        runtime.spawn(control.run(receiver, config.flush_interval, shutdown.clone()));

        info!("Started {} '{}'", S::KIND, namespace);

        Self {
            namespace,
            commands,
            epoch: Arc::new(AtomicU64::new(0)),
            counters,
            overflow: config.overflow,
            shutdown,
        }
    }

    pub(crate) fn namespace(&self) -> &str {
        &self.namespace
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    pub(crate) async fn ingest(&self, id: Arc<str>, epoch: u64, sample: S::Sample) -> Result<()> {
        self.submit(Command::Ingest { id, epoch, sample }).await
    }

    pub(crate) async fn register(&self, id: Arc<str>, epoch: u64, seed: S) -> Result<()> {
        self.submit(Command::Register { id, epoch, seed }).await
    }

    pub(crate) async fn read(&self, id: &str) -> Result<S::Value> {
        let (reply, response) = oneshot::channel();
        self.request(
            Command::Read {
                id: id.to_string(),
                reply,
            },
            response,
        )
        .await?
        .ok_or_else(|| MonitorError::NotFound {
            kind: S::KIND,
            namespace: self.namespace.to_string(),
            id: id.to_string(),
        })
    }

    pub(crate) async fn values(&self) -> Result<Vec<S::Value>> {
        let (reply, response) = oneshot::channel();
        self.request(Command::Values { reply }, response).await
    }

    pub(crate) async fn flush(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.request(Command::Flush { reply }, response).await
    }

    pub(crate) async fn stats(&self) -> Result<CollectionStats> {
        let (reply, response) = oneshot::channel();
        let (points, pending) = self.request(Command::Stats { reply }, response).await?;
        Ok(CollectionStats {
            points,
            pending,
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            orphaned: self.counters.orphaned.load(Ordering::Relaxed),
        })
    }

    /// Discards every point. Handles created before this call are orphaned.
    pub(crate) async fn reset(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(self.rejected());
        }
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        // Never dropped, regardless of the overflow policy.
        self.commands
            .send(Command::Reset { epoch })
            .await
            .map_err(|_| self.rejected())
    }

    pub(crate) fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Stopping {} '{}'", S::KIND, self.namespace);
            self.shutdown.cancel();
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled() || self.commands.is_closed()
    }

    async fn submit(&self, command: Command<S>) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(self.rejected());
        }
        match self.overflow {
            OverflowPolicy::Block => self
                .commands
                .send(command)
                .await
                .map_err(|_| self.rejected()),
            OverflowPolicy::Drop => match self.commands.try_send(command) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    let dropped = self.counters.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    // Powers of two only.
                    if dropped.is_power_of_two() {
                        warn!(
                            "{} '{}' queue full, {} commands dropped so far",
                            S::KIND, self.namespace, dropped
                        );
                    }
                    Err(MonitorError::Overloaded {
                        kind: S::KIND,
                        namespace: self.namespace.to_string(),
                    })
                }
                Err(TrySendError::Closed(_)) => Err(self.rejected()),
            },
        }
    }

    async fn request<T>(&self, command: Command<S>, response: oneshot::Receiver<T>) -> Result<T> {
        if self.shutdown.is_cancelled() {
            return Err(self.rejected());
        }
        self.commands
            .send(command)
            .await
            .map_err(|_| self.rejected())?;
        response.await.map_err(|_| self.rejected())
    }

    fn rejected(&self) -> MonitorError {
        debug!("Rejected command for stopped {} '{}'", S::KIND, self.namespace);
        MonitorError::Stopped {
            kind: S::KIND,
            namespace: self.namespace.to_string(),
        }
    }
}
