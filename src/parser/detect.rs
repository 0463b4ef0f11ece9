//! Tool detection and pipeline assembly from profile definitions.
//!
//! This module maps tool names (gcc, clang, make, ...) to the parsers that
//! understand their output and assembles ready-to-use [`OutputPipeline`]s
//! from profiles:
//! - Parser names listed in a profile become chain nodes, head first
//! - The profile's search directories seed relative-path resolution
//! - The profile's redirection detector designation is applied by name
//!
//! # Examples
//!
//! ```ignore
//! use outsift::parser::detect::{detect_tool_from_command_line, pipeline_for_profile};
//!
//! // Pick a parser from the command a build is about to run
//! let tool = detect_tool_from_command_line("arm-none-eabi-gcc -c main.c");
//! assert_eq!(tool, Some("gcc".to_string()));
//!
//! // Or assemble a pipeline straight from a named profile
//! let pipeline = pipeline_for_profile(&profiles, "gcc-make")?;
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::models::{ProfilesConfig, ToolProfile};
use crate::parser::gcc::GccParser;
use crate::parser::make::MakeParser;
use crate::parser::node::LineParser;
use crate::parser::pipeline::OutputPipeline;

/// Errors that can occur while assembling a pipeline from configuration
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Unknown parser name: {0}")]
    UnknownParser(String),

    #[error("Profile {0} not found")]
    ProfileNotFound(String),
}

/// Map a tool name to the parser that understands its output.
///
/// Names are matched case-insensitively. The compiler drivers share one
/// parser and the make family shares another.
///
/// # Errors
///
/// Returns [`ProfileError::UnknownParser`] for names outside the supported
/// tool set.
pub fn parser_for_tool(name: &str) -> Result<Box<dyn LineParser>, ProfileError> {
    match name.to_lowercase().as_str() {
        "gcc" | "g++" | "cc" | "c++" | "clang" | "clang++" => Ok(Box::new(GccParser::new())),
        "make" | "gmake" | "mingw32-make" => Ok(Box::new(MakeParser::new())),
        _ => Err(ProfileError::UnknownParser(name.to_string())),
    }
}

/// Guess the tool a command line will run, for profile selection.
///
/// Examines the first token's file stem, ignoring the directory, a Windows
/// extension, and trailing version suffixes (`/usr/bin/g++-12` detects as
/// `g++`). Cross-compiler triples are recognized by their suffix
/// (`arm-none-eabi-gcc` detects as `gcc`).
///
/// # Returns
///
/// A tool name accepted by [`parser_for_tool`], or `None` when the command
/// is not a recognized tool.
pub fn detect_tool_from_command_line(command: &str) -> Option<String> {
    let first = command.split_whitespace().next()?;
    let stem = Utf8Path::new(first).file_stem()?.to_lowercase();
    let stem = stem.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '-');

    // Longest names first so "clang" never shadows "clang++"
    let tool_map: Vec<(&str, &str)> = vec![
        ("mingw32-make", "make"),
        ("clang++", "clang++"),
        ("gmake", "make"),
        ("clang", "clang"),
        ("make", "make"),
        ("g++", "g++"),
        ("gcc", "gcc"),
    ];

    for (pattern, tool) in tool_map {
        if stem == pattern || stem.ends_with(&format!("-{}", pattern)) {
            tracing::debug!("Detected tool from command line: {}", tool);
            return Some(tool.to_string());
        }
    }

    tracing::debug!("Could not detect a tool from the command line");
    None
}

/// Assemble a pipeline from a single profile definition.
///
/// # Errors
///
/// Returns [`ProfileError::UnknownParser`] if the profile names a parser
/// outside the supported tool set.
pub fn build_profile_pipeline(profile: &ToolProfile) -> Result<OutputPipeline, ProfileError> {
    let mut pipeline = OutputPipeline::new();
    let mut detector = None;

    for name in &profile.parsers {
        let id = pipeline.append_parser(parser_for_tool(name)?);
        let designated = profile
            .redirection_detector
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case(name));
        if designated && detector.is_none() {
            detector = Some(id);
        }
    }

    if !profile.search_dirs.is_empty() {
        let dirs: Vec<Utf8PathBuf> = profile.search_dirs.iter().map(Utf8PathBuf::from).collect();
        pipeline.set_search_dirs(&dirs);
    }

    match detector {
        Some(id) => pipeline.set_redirection_detector(id),
        None => {
            if let Some(name) = &profile.redirection_detector {
                tracing::warn!(
                    "Redirection detector '{}' is not one of the profile's parsers",
                    name
                );
            }
        }
    }

    tracing::debug!(parsers = pipeline.parser_count(), "Assembled parser pipeline");
    Ok(pipeline)
}

/// Assemble a pipeline from a named profile.
///
/// # Errors
///
/// Returns [`ProfileError::ProfileNotFound`] if `name` is not defined, or
/// any error from [`build_profile_pipeline`].
pub fn pipeline_for_profile(
    config: &ProfilesConfig,
    name: &str,
) -> Result<OutputPipeline, ProfileError> {
    let profile = config
        .get_profile(name)
        .ok_or_else(|| ProfileError::ProfileNotFound(name.to_string()))?;
    build_profile_pipeline(profile)
}
