use crate::ui;
use anyhow::Result;
use monitor_core::parse_config_from_file;
use std::path::PathBuf;

pub async fn execute(config_file: PathBuf) -> Result<()> {
    ui::print_header("Validating Monitor Config");
    println!("File: {}", config_file.display());

    match parse_config_from_file(&config_file).await {
        Ok(config) => {
            println!();
            ui::print_success("Config is valid!");
            println!("\nConfig Details:");
            println!("  Default namespace: {}", config.default_namespace);
            println!("  Queue capacity: {}", config.queue_capacity);
            println!("  Buffer capacity: {}", config.buffer_capacity);
            println!(
                "  Flush interval: {}",
                humantime::format_duration(config.flush_interval)
            );
            println!("  Overflow policy: {:?}", config.overflow);
            Ok(())
        }
        Err(e) => {
            println!();
            ui::print_error("Config is invalid!");
            println!("\nError: {}", e);
            Err(e.into())
        }
    }
}
