use super::load_config;
use crate::ui;
use crate::workload::Workload;
use anyhow::Result;
use monitor_core::Monitor;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub async fn execute(
    config_file: Option<PathBuf>,
    port: u16,
    demo: Option<Workload>,
) -> Result<()> {
    let config = load_config(config_file.as_deref()).await?;
    let monitor = Monitor::new(config)?;

    if let Some(workload) = demo {
        let monitor = monitor.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = workload.run(&monitor).await {
                    warn!("Demo workload stopped: {}", e);
                    break;
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        });
    }

    let app = monitor_export::router(monitor.clone());

    let addr = format!("0.0.0.0:{}", port);
    ui::print_info(&format!("Serving monitor values on http://{}", addr));
    info!("Endpoints:");
    info!("  GET    /stopwatch                - All metering point values");
    info!("  DELETE /stopwatch                - Reset metering points");
    info!("  GET    /stopwatch/:namespace/:id - One metering point");
    info!("  GET    /stayset                  - All indicator point values");
    info!("  DELETE /stayset                  - Reset indicator points");
    info!("  GET    /stayset/:namespace/:id   - One indicator point");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    monitor.stop();
    info!("Monitor server stopped");
    Ok(())
}
