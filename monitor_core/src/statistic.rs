//! Running aggregates for the two point kinds and the values read out of them.

use crate::config::humantime_serde;
use crate::error::CollectionKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A running aggregate that raw samples are folded into.
pub trait Statistic: Clone + Default + Send + 'static {
    type Sample: Copy + fmt::Debug + Send + 'static;
    type Value: Clone + fmt::Debug + Send + 'static;

    const KIND: CollectionKind;

    fn fold(&mut self, sample: Self::Sample);

    fn value(&self, namespace: &str, id: &str) -> Self::Value;
}

/// Duration statistics of one metering point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeteringStatistic {
    pub quantity: u64,
    pub total: Duration,
    pub minimum: Duration,
    pub maximum: Duration,
}

impl MeteringStatistic {
    /// Truncating average; `None` while nothing has been measured.
    pub fn average(&self) -> Option<Duration> {
        if self.quantity == 0 {
            return None;
        }
        let nanos = self.total.as_nanos() / u128::from(self.quantity);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }
}

impl Statistic for MeteringStatistic {
    type Sample = Duration;
    type Value = MeteringValue;

    const KIND: CollectionKind = CollectionKind::StopWatch;

    fn fold(&mut self, duration: Duration) {
        if self.quantity == 0 {
            self.quantity = 1;
            self.total = duration;
            self.minimum = duration;
            self.maximum = duration;
            return;
        }
        self.quantity += 1;
        self.total = self.total.saturating_add(duration);
        self.minimum = self.minimum.min(duration);
        self.maximum = self.maximum.max(duration);
    }

    fn value(&self, namespace: &str, id: &str) -> MeteringValue {
        MeteringValue {
            namespace: namespace.to_string(),
            id: id.to_string(),
            quantity: self.quantity,
            total: self.total,
            minimum: self.minimum,
            maximum: self.maximum,
            average: self.average(),
        }
    }
}

/// Directional unit change of an indicator point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Increase,
    Decrease,
}

impl Change {
    pub fn delta(self) -> i64 {
        match self {
            Change::Increase => 1,
            Change::Decrease => -1,
        }
    }
}

/// Range statistics of a live count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorStatistic {
    /// Number of increases ever applied.
    pub quantity: u64,
    pub current: i64,
    pub minimum: i64,
    pub maximum: i64,
}

impl IndicatorStatistic {
    pub fn with_initial(value: i64) -> Self {
        Self {
            quantity: 0,
            current: value,
            minimum: value,
            maximum: value,
        }
    }
}

impl Statistic for IndicatorStatistic {
    type Sample = Change;
    type Value = IndicatorValue;

    const KIND: CollectionKind = CollectionKind::StaySetIndicator;

    // Bounds follow the running current value, not the change itself.
    // Going below zero is kept visible.
    fn fold(&mut self, change: Change) {
        if change == Change::Increase {
            self.quantity += 1;
        }
        self.current += change.delta();
        self.minimum = self.minimum.min(self.current);
        self.maximum = self.maximum.max(self.current);
    }

    fn value(&self, namespace: &str, id: &str) -> IndicatorValue {
        IndicatorValue {
            namespace: namespace.to_string(),
            id: id.to_string(),
            quantity: self.quantity,
            current: self.current,
            minimum: self.minimum,
            maximum: self.maximum,
        }
    }
}

/// Snapshot of one metering point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeteringValue {
    pub namespace: String,
    pub id: String,
    pub quantity: u64,
    #[serde(with = "humantime_serde")]
    pub total: Duration,
    #[serde(with = "humantime_serde")]
    pub minimum: Duration,
    #[serde(with = "humantime_serde")]
    pub maximum: Duration,
    #[serde(with = "humantime_serde::option")]
    pub average: Option<Duration>,
}

impl fmt::Display for MeteringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} :: {}] {} / total {:?} / min {:?} / max {:?} / avg ",
            self.namespace, self.id, self.quantity, self.total, self.minimum, self.maximum
        )?;
        match self.average {
            Some(average) => write!(f, "{:?}", average),
            None => write!(f, "n/a"),
        }
    }
}

/// Snapshot of one indicator point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorValue {
    pub namespace: String,
    pub id: String,
    pub quantity: u64,
    pub current: i64,
    pub minimum: i64,
    pub maximum: i64,
}

impl fmt::Display for IndicatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} :: {}] {} / act {} / min {} / max {}",
            self.namespace, self.id, self.quantity, self.current, self.minimum, self.maximum
        )
    }
}
