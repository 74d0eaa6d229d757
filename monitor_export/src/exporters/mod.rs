pub mod json;
pub mod markdown;
pub mod prometheus;
pub mod table;

pub use json::JsonExporter;
pub use markdown::MarkdownExporter;
pub use prometheus::PrometheusExporter;
pub use table::TableExporter;
