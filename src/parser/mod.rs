//! Parser module - line-oriented extraction of diagnostics from tool output.
//!
//! This module turns the raw, arbitrarily chunked stdout/stderr of a build
//! tool into structured [`Task`](crate::models::Task) values. It is
//! **tool-agnostic at the seams**: everything specific to one tool lives in
//! a [`LineParser`] implementation, and everything else composes them.
//!
//! # Components
//!
//! - [`OutputPipeline`]: The driver. Owns the per-channel line reassembly,
//!   the parser chain, line filters, the redirection detector designation,
//!   and the flush sequence that runs when the producing process exits.
//!
//! - [`ParserNode`] / [`LineParser`]: The chain itself. Each node owns one
//!   parser and its successor; a line travels down the chain until a parser
//!   claims it. Parsers receive a [`ParseContext`] through which they emit
//!   tasks, resolve paths, and announce directory changes.
//!
//! - [`GccParser`] / [`MakeParser`]: Bundled parsers for the GCC/Clang
//!   compiler family and GNU make.
//!
//! - [`TaskSink`]: Where extracted tasks surface. Implemented by closures
//!   for one-off use and by [`TaskCollector`] / [`TaskTally`] for tests and
//!   reporting.
//!
//! - [`SearchDirs`]: Ordered directory set used to resolve relative paths
//!   in diagnostics, fed by make's directory announcements.
//!
//! # Usage Example
//!
//! ```ignore
//! use outsift::parser::{OutputPipeline, TaskCollector};
//! use outsift::parser::gcc::GccParser;
//!
//! let mut pipeline = OutputPipeline::new();
//! pipeline.append_parser(Box::new(GccParser::new()));
//!
//! let mut sink = TaskCollector::new();
//! pipeline.handle_stderr("main.c:3:1: error: boom\n", &mut sink);
//! pipeline.flush(&mut sink);
//!
//! assert_eq!(sink.tasks.len(), 1);
//! ```

pub mod channel;
pub mod detect;
pub mod gcc;
pub mod make;
pub mod node;
pub mod pipeline;
pub mod search;
pub mod sink;

pub use channel::LineAccumulator;
pub use detect::{
    build_profile_pipeline, detect_tool_from_command_line, parser_for_tool, pipeline_for_profile,
    ProfileError,
};
pub use gcc::GccParser;
pub use make::MakeParser;
pub use node::{LineParser, ParseContext, ParserNode, PassthroughParser, Status};
pub use pipeline::{ansi_filter, LineFilter, LineObserver, OutputPipeline, ParserId};
pub use search::SearchDirs;
pub use sink::{TaskCollector, TaskSink, TaskTally};
