pub mod console;
pub mod error;
pub mod metrics;

pub use console::{ConsoleFormat, ConsoleReporter};
pub use error::IoError;
pub use metrics::{init_metrics, render_metrics, serve_metrics, MetricsReporter};
