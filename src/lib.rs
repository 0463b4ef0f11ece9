// Outsift - structured diagnostic extraction from build tool output
//
// This is the library crate containing the parser pipeline and data structures.
// The binary crate (main.rs) provides the CLI entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod parser;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{OutputChannel, Severity, Task};
pub use parser::{LineParser, OutputPipeline, Status, TaskCollector, TaskSink};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
