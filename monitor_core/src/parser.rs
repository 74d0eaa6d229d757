use crate::config::{MonitorConfig, MonitorConfigFile};
use crate::error::{MonitorError, Result};
use std::path::Path;

pub async fn parse_config_from_file(path: impl AsRef<Path>) -> Result<MonitorConfig> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await?;

    let extension = path.extension().and_then(|s| s.to_str());

    match extension {
        Some("yaml") | Some("yml") => parse_yaml(&contents),
        Some("toml") => parse_toml(&contents),
        Some("json") => parse_json(&contents),
        _ => Err(MonitorError::InvalidConfig(
            "Unsupported file format. Use .yaml, .yml, .toml, or .json".to_string(),
        )),
    }
}

pub fn parse_config_from_str(content: &str, format: &str) -> Result<MonitorConfig> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => parse_yaml(content),
        "toml" => parse_toml(content),
        "json" => parse_json(content),
        _ => Err(MonitorError::InvalidConfig(format!(
            "Unsupported format: {}",
            format
        ))),
    }
}

fn parse_yaml(content: &str) -> Result<MonitorConfig> {
    let config: MonitorConfig =
        serde_yaml::from_str(content).map_err(|e| MonitorError::Other(e.into()))?;
    config.validate()?;
    Ok(config)
}

fn parse_toml(content: &str) -> Result<MonitorConfig> {
    let file: MonitorConfigFile =
        toml::from_str(content).map_err(|e| MonitorError::Other(e.into()))?;
    file.monitor.validate()?;
    Ok(file.monitor)
}

fn parse_json(content: &str) -> Result<MonitorConfig> {
    let config: MonitorConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}
