pub mod exporters;
pub mod http;
pub mod report;

pub use exporters::{JsonExporter, MarkdownExporter, PrometheusExporter, TableExporter};
pub use http::router;
pub use report::Report;
