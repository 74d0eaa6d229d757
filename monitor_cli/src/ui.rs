//! Status lines printed by the `monitor` commands.

use colored::Colorize;
use monitor_core::{CollectionKind, CollectionStats};

pub fn print_header(text: &str) {
    println!("\n{}", text.bold().cyan());
    println!("{}", "=".repeat(text.chars().count()).cyan());
}

pub fn print_success(text: &str) {
    println!("{} {}", "✓".green().bold(), text.green());
}

pub fn print_error(text: &str) {
    println!("{} {}", "✗".red().bold(), text.red());
}

pub fn print_warning(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}

pub fn print_info(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

/// Warns about every namespace that lost samples to a full queue or to a
/// reset. Returns whether anything was reported.
pub fn print_losses(kind: CollectionKind, stats: &[(String, CollectionStats)]) -> bool {
    let mut reported = false;
    for (namespace, stats) in stats {
        if stats.dropped > 0 {
            print_warning(&format!(
                "{} '{}' dropped {} samples under load",
                kind, namespace, stats.dropped
            ));
            reported = true;
        }
        if stats.orphaned > 0 {
            print_warning(&format!(
                "{} '{}' ignored {} samples from handles older than its last reset",
                kind, namespace, stats.orphaned
            ));
            reported = true;
        }
    }
    reported
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_losses_reports_only_lossy_namespaces() {
        let clean = vec![("api".to_string(), CollectionStats::default())];
        assert!(!print_losses(CollectionKind::StopWatch, &clean));

        let orphaned = CollectionStats {
            orphaned: 2,
            ..CollectionStats::default()
        };
        let lossy = vec![
            ("api".to_string(), CollectionStats::default()),
            ("jobs".to_string(), orphaned),
        ];
        assert!(print_losses(CollectionKind::StaySetIndicator, &lossy));
    }
}
