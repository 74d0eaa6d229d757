use super::{load_config, OutputFormat};
use crate::ui;
use crate::workload::Workload;
use anyhow::Result;
use colored::Colorize;
use monitor_core::{CollectionKind, Monitor};
use monitor_export::{JsonExporter, MarkdownExporter, PrometheusExporter, Report, TableExporter};
use std::path::PathBuf;
use tracing::debug;

pub async fn execute(
    config_file: Option<PathBuf>,
    workload: Workload,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    ui::print_header("Trace Monitor");

    let config = load_config(config_file.as_deref()).await?;
    let monitor = Monitor::new(config)?;

    println!("\n{}", "Workload Details:".bold());
    println!("  Namespace: {}", monitor.config().default_namespace.green());
    println!("  Tasks: {}", workload.tasks);
    println!("  Iterations per task: {}", workload.iterations);
    println!("  Max step delay: {}", humantime::format_duration(workload.max_delay));
    println!("  Seed: {} (reproducible)", workload.seed);

    let summary = workload.run(&monitor).await?;
    println!();
    ui::print_success(&format!(
        "{} requests completed in {:?}",
        summary.requests, summary.elapsed
    ));

    let report = Report::collect(&monitor).await?;
    match output {
        Some(path) => {
            match format {
                OutputFormat::Table => TableExporter::export(&report, &path).await?,
                OutputFormat::Json => JsonExporter::export(&report, &path).await?,
                OutputFormat::Markdown => MarkdownExporter::export(&report, &path).await?,
                OutputFormat::Prometheus => PrometheusExporter::export(&report, &path).await?,
            }
            ui::print_info(&format!("Report written to {}", path.display()));
        }
        None => {
            let rendered = match format {
                OutputFormat::Table => TableExporter::format(&report),
                OutputFormat::Json => JsonExporter::to_string(&report)?,
                OutputFormat::Markdown => MarkdownExporter::format(&report),
                OutputFormat::Prometheus => PrometheusExporter::format(&report),
            };
            println!("\n{}", rendered);
        }
    }

    let stop_watches = monitor.stop_watches().stats().await?;
    let indicators = monitor.indicators().stats().await?;
    let lossy = ui::print_losses(CollectionKind::StopWatch, &stop_watches)
        | ui::print_losses(CollectionKind::StaySetIndicator, &indicators);
    if !lossy {
        debug!("No samples lost");
    }

    monitor.stop();
    Ok(())
}
