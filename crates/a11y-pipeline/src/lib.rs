pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod page;
pub mod remediation;
pub mod scanner;
pub mod screenshots;
pub mod semantic;
pub mod structural;
pub mod tags;

#[cfg(test)]
mod testing;

pub use config::ScannerConfig;
pub use error::ScanError;
pub use model::{Issue, ScanResult, Severity, Suggestion};
pub use page::RenderedPage;
pub use scanner::{ScanOptions, Scanner};
