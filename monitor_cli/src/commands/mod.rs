pub mod run;
pub mod serve;
pub mod validate;

use anyhow::Result;
use monitor_core::{parse_config_from_file, MonitorConfig};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Markdown,
    Prometheus,
}

pub async fn load_config(config_file: Option<&Path>) -> Result<MonitorConfig> {
    match config_file {
        Some(path) => {
            info!("Loading monitor config from {}", path.display());
            Ok(parse_config_from_file(path).await?)
        }
        None => Ok(MonitorConfig::default()),
    }
}
