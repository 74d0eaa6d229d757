use crate::report::Report;
use anyhow::Result;
use monitor_core::{IndicatorValue, MeteringValue};
use std::path::Path;
use std::time::Duration;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
pub(crate) struct MeteringRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Quantity")]
    quantity: u64,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Min")]
    minimum: String,
    #[tabled(rename = "Max")]
    maximum: String,
    #[tabled(rename = "Avg")]
    average: String,
}

impl From<&MeteringValue> for MeteringRow {
    fn from(value: &MeteringValue) -> Self {
        Self {
            namespace: value.namespace.clone(),
            id: value.id.clone(),
            quantity: value.quantity,
            total: millis(value.total),
            minimum: millis(value.minimum),
            maximum: millis(value.maximum),
            average: value.average.map(millis).unwrap_or_else(|| "n/a".to_string()),
        }
    }
}

#[derive(Tabled)]
pub(crate) struct IndicatorRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Quantity")]
    quantity: u64,
    #[tabled(rename = "Current")]
    current: i64,
    #[tabled(rename = "Min")]
    minimum: i64,
    #[tabled(rename = "Max")]
    maximum: i64,
}

impl From<&IndicatorValue> for IndicatorRow {
    fn from(value: &IndicatorValue) -> Self {
        Self {
            namespace: value.namespace.clone(),
            id: value.id.clone(),
            quantity: value.quantity,
            current: value.current,
            minimum: value.minimum,
            maximum: value.maximum,
        }
    }
}

pub(crate) fn millis(duration: Duration) -> String {
    format!("{:.4} ms", duration.as_secs_f64() * 1000.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    Terminal,
    Markdown,
}

fn render<R: Tabled>(rows: Vec<R>, layout: Layout) -> String {
    let mut table = Table::new(rows);
    match layout {
        Layout::Terminal => table.with(Style::rounded()),
        Layout::Markdown => table.with(Style::markdown()),
    };
    table.to_string()
}

pub(crate) fn metering_table(values: &[MeteringValue], layout: Layout) -> String {
    render(values.iter().map(MeteringRow::from).collect(), layout)
}

pub(crate) fn indicator_table(values: &[IndicatorValue], layout: Layout) -> String {
    render(values.iter().map(IndicatorRow::from).collect(), layout)
}

/// Plain terminal tables.
pub struct TableExporter;

impl TableExporter {
    pub async fn export(report: &Report, path: impl AsRef<Path>) -> Result<()> {
        let table = Self::format(report);
        tokio::fs::write(path, table).await?;
        Ok(())
    }

    pub fn format(report: &Report) -> String {
        let mut output = String::new();

        output.push_str("Stop watches\n");
        if report.metering.is_empty() {
            output.push_str("(no measurements)\n");
        } else {
            output.push_str(&metering_table(&report.metering, Layout::Terminal));
            output.push('\n');
        }

        output.push_str("\nStay-set indicators\n");
        if report.indicators.is_empty() {
            output.push_str("(no indications)\n");
        } else {
            output.push_str(&indicator_table(&report.indicators, Layout::Terminal));
            output.push('\n');
        }

        output
    }
}
