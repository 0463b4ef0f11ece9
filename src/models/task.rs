use std::fmt;

use camino::Utf8PathBuf;
use serde::Serialize;

/// Severity of an extracted diagnostic.
///
/// `Unknown` covers lines that carry useful context without being an error
/// or warning in their own right (standalone compiler notes, for example).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Unknown,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

/// Output channel a chunk of tool output arrived on.
///
/// Channels are reassembled independently. Line order is guaranteed within
/// a channel, never across channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputChannel {
    Stdout,
    Stderr,
}

/// Display category assigned to a line before it is handed to an observer.
///
/// Distinct from [`OutputChannel`]: the channel is where the bytes arrived,
/// the category is how a frontend should present them. The two differ only
/// for stdout lines after the chain's redirection detector has fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCategory {
    Stdout,
    Stderr,
}

/// A structured diagnostic extracted from tool output.
///
/// Tasks are immutable once emitted; parsers build them up privately while
/// accumulating multi-line diagnostics and hand them over on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub severity: Severity,

    pub message: String,

    /// Source file the diagnostic points at, resolved against the search
    /// directories in effect when the line was parsed.
    pub file: Option<Utf8PathBuf>,

    /// 1-based line number within `file`.
    pub line: Option<u32>,

    /// Number of raw output lines this task subsumes. Starts at 1;
    /// continuation and note lines folded into the task increment it.
    pub output_lines: usize,
}

impl Task {
    /// Create a single-line error task with no location.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a single-line warning task with no location.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create a single-line task of unknown severity with no location.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(Severity::Unknown, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            file: None,
            line: None,
            output_lines: 1,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => {
                write!(f, "{}:{}: {}: {}", file, line, self.severity, self.message)
            }
            (Some(file), None) => write!(f, "{}: {}: {}", file, self.severity, self.message),
            _ => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}
