//! Data models for the outsift library and CLI.
//!
//! This module contains the core data structures shared across the crate:
//! - [`Task`]: a structured diagnostic extracted from tool output, with severity,
//!   message, optional file location, and the raw line count it subsumes
//! - [`Severity`]: error / warning / unknown classification for tasks
//! - [`OutputChannel`]: which process stream a chunk arrived on (stdout or stderr)
//! - [`LineCategory`]: how a line should be presented after redirection detection
//! - [`ProfilesConfig`] / [`ToolProfile`]: named parser chains loaded from `Outsift Profiles.yaml`
//! - [`UserSettings`]: user preferences loaded from `Outsift Settings.yaml`
//!
//! # Architecture Note
//!
//! The models are designed to be:
//! - **Serializable**: config structs derive `Serialize`/`Deserialize` for YAML
//!   persistence; `Task` derives `Serialize` for JSON reports
//! - **Comparable**: `Task` derives `PartialEq`/`Eq` so tests can assert on whole
//!   diagnostics instead of picking fields apart
//! - **Plain**: no interior mutability; the pipeline owns all mutable state

pub mod config;
pub mod task;

pub use config::{ProfilesConfig, SiftSettings, ToolProfile, UserSettings};
pub use task::{LineCategory, OutputChannel, Severity, Task};
