use super::table::{indicator_table, metering_table, Layout};
use crate::report::Report;
use anyhow::Result;
use std::path::Path;

pub struct MarkdownExporter;

impl MarkdownExporter {
    pub async fn export(report: &Report, path: impl AsRef<Path>) -> Result<()> {
        let markdown = Self::format(report);
        tokio::fs::write(path, markdown).await?;
        Ok(())
    }

    pub fn format(report: &Report) -> String {
        let metering = if report.metering.is_empty() {
            "No measurements recorded.".to_string()
        } else {
            metering_table(&report.metering, Layout::Markdown)
        };

        let indicators = if report.indicators.is_empty() {
            "No indications recorded.".to_string()
        } else {
            indicator_table(&report.indicators, Layout::Markdown)
        };

        format!(
            r#"# Monitor Report

Generated at {}.

## Execution Times

{}

## Stay-Set Indicators

{}
"#,
            report.generated_at.to_rfc3339(),
            metering,
            indicators,
        )
    }
}
