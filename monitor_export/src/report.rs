use chrono::{DateTime, Utc};
use monitor_core::{IndicatorValue, MeteringValue, Monitor};
use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of every namespace of a monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub metering: Vec<MeteringValue>,
    pub indicators: Vec<IndicatorValue>,
}

impl Report {
    /// Collects all values, ordered by namespace and id.
    pub async fn collect(monitor: &Monitor) -> monitor_core::Result<Self> {
        let mut metering = monitor.stop_watches().values().await?;
        metering.sort_by(|a, b| (&a.namespace, &a.id).cmp(&(&b.namespace, &b.id)));

        let mut indicators = monitor.indicators().values().await?;
        indicators.sort_by(|a, b| (&a.namespace, &a.id).cmp(&(&b.namespace, &b.id)));

        Ok(Self {
            generated_at: Utc::now(),
            metering,
            indicators,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.metering.is_empty() && self.indicators.is_empty()
    }
}
