use crate::report::Report;
use anyhow::Result;
use std::fmt::Write;
use std::path::Path;

pub struct PrometheusExporter;

impl PrometheusExporter {
    pub async fn export(report: &Report, path: impl AsRef<Path>) -> Result<()> {
        let text = Self::format(report);
        tokio::fs::write(path, text).await?;
        Ok(())
    }

    pub fn format(report: &Report) -> String {
        let mut output = String::new();

        let metering: [(&str, &str, &str); 5] = [
            ("monitor_metering_quantity", "counter", "Completed measurements"),
            ("monitor_metering_total_seconds", "counter", "Total measured time in seconds"),
            ("monitor_metering_minimum_seconds", "gauge", "Shortest measurement in seconds"),
            ("monitor_metering_maximum_seconds", "gauge", "Longest measurement in seconds"),
            ("monitor_metering_average_seconds", "gauge", "Average measurement in seconds"),
        ];
        for (index, (name, kind, help)) in metering.iter().enumerate() {
            if report.metering.is_empty() {
                break;
            }
            header(&mut output, name, kind, help);
            for value in &report.metering {
                let sample = match index {
                    0 => Some(value.quantity as f64),
                    1 => Some(value.total.as_secs_f64()),
                    2 => Some(value.minimum.as_secs_f64()),
                    3 => Some(value.maximum.as_secs_f64()),
                    _ => value.average.map(|average| average.as_secs_f64()),
                };
                if let Some(sample) = sample {
                    line(&mut output, name, &value.namespace, &value.id, sample);
                }
            }
        }

        let indicators: [(&str, &str, &str); 4] = [
            ("monitor_indicator_quantity", "counter", "Started indications"),
            ("monitor_indicator_current", "gauge", "Currently active indications"),
            ("monitor_indicator_minimum", "gauge", "Lowest number of active indications"),
            ("monitor_indicator_maximum", "gauge", "Highest number of active indications"),
        ];
        for (index, (name, kind, help)) in indicators.iter().enumerate() {
            if report.indicators.is_empty() {
                break;
            }
            header(&mut output, name, kind, help);
            for value in &report.indicators {
                let sample = match index {
                    0 => value.quantity as f64,
                    1 => value.current as f64,
                    2 => value.minimum as f64,
                    _ => value.maximum as f64,
                };
                line(&mut output, name, &value.namespace, &value.id, sample);
            }
        }

        output
    }
}

fn header(output: &mut String, name: &str, kind: &str, help: &str) {
    let _ = writeln!(output, "# HELP {} {}", name, help);
    let _ = writeln!(output, "# TYPE {} {}", name, kind);
}

fn line(output: &mut String, name: &str, namespace: &str, id: &str, sample: f64) {
    let _ = writeln!(
        output,
        "{}{{namespace=\"{}\",id=\"{}\"}} {}",
        name,
        escape(namespace),
        escape(id),
        sample
    );
}

fn escape(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    #[test]
    fn test_prometheus_lines() {
        let text = PrometheusExporter::format(&sample_report());

        assert!(text.contains("# TYPE monitor_metering_quantity counter"));
        assert!(text.contains("monitor_metering_quantity{namespace=\"ns\",id=\"a\"} 3\n"));
        assert!(text.contains("monitor_metering_total_seconds{namespace=\"ns\",id=\"a\"} 0.006\n"));
        assert!(text.contains("monitor_metering_average_seconds{namespace=\"ns\",id=\"a\"} 0.002\n"));
        assert!(text.contains("monitor_indicator_current{namespace=\"ns\",id=\"b\"} 200\n"));
    }

    #[test]
    fn test_average_omitted_without_data() {
        let mut report = sample_report();
        report.metering[0].quantity = 0;
        report.metering[0].average = None;

        let text = PrometheusExporter::format(&report);
        assert!(text.contains("# TYPE monitor_metering_average_seconds gauge"));
        assert!(!text.contains("monitor_metering_average_seconds{"));
    }

    #[test]
    fn test_label_escaping() {
        assert_eq!(escape("a\"b\\c"), "a\\\"b\\\\c");
    }

    #[test]
    fn test_empty_report() {
        let mut report = sample_report();
        report.metering.clear();
        report.indicators.clear();
        assert!(PrometheusExporter::format(&report).is_empty());
    }
}
