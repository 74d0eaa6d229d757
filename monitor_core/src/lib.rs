pub mod collection;
pub mod config;
pub mod error;
pub mod monitor;
pub mod parser;
mod point;
pub mod registry;
pub mod statistic;
pub mod stayset;
pub mod stopwatch;

pub use collection::CollectionStats;
pub use config::{MonitorConfig, OverflowPolicy};
pub use error::{CollectionKind, MonitorError, Result};
pub use monitor::Monitor;
pub use parser::{parse_config_from_file, parse_config_from_str};
pub use registry::{Collection, Registry};
pub use statistic::{IndicatorValue, MeteringValue};
pub use stayset::{Indication, IndicatorPoint, StaySetIndicator};
pub use stopwatch::{Measurement, MeteringPoint, StopWatch};
