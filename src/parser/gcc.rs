use camino::Utf8Path;
use regex::Regex;

use crate::models::{OutputChannel, Task};
use crate::parser::node::{LineParser, ParseContext, Status};

/// Parser for GCC and Clang compiler/driver output
///
/// Recognizes located diagnostics (`file:line[:col]: kind: message`),
/// driver-level diagnostics without a location (`gcc: error: ...`), and the
/// source-excerpt and caret lines the compilers print under a diagnostic.
/// A located diagnostic is held back while its follow-up lines arrive and is
/// emitted when the first unrelated line shows up, or on flush.
///
/// # Fields
///
/// The parser pre-compiles regex patterns at construction time for performance:
///
/// - `diag_pattern`: Matches diagnostics that carry a source location
///   - Pattern: `file:line[:col]: (fatal error|error|warning|note): message`
///   - Example match: "main.c:12:5: error: unused variable 'x'"
///
/// - `tool_pattern`: Matches driver and linker diagnostics without a location
///   - Pattern: `[triple-]tool[-version][.exe]: (fatal error|error|warning|note): message`
///   - Example match: "collect2: error: ld returned 1 exit status"
///
/// - `context_pattern`: Matches source excerpts and caret/squiggle markers
///   - Pattern: lines shaped like `  12 |   code` or `      |   ^~~~`
///   - Example match: "   12 |     return x"
pub struct GccParser {
    /// Regex for diagnostics with a `file:line` location
    diag_pattern: Regex,

    /// Regex for locationless driver/linker diagnostics
    tool_pattern: Regex,

    /// Regex for excerpt and caret lines below a diagnostic
    context_pattern: Regex,

    /// Diagnostic currently being assembled across lines
    pending: Option<Task>,

    /// Set once a fatal error was seen; later output is untrustworthy
    fatal: bool,

    /// Set once a diagnostic arrived on stdout
    stdout_diagnostics: bool,
}

impl GccParser {
    /// Create a new GccParser with compiled diagnostic patterns
    pub fn new() -> Self {
        Self {
            diag_pattern: Regex::new(
                r"^(?P<file>(?:[A-Za-z]:)?[^:\s][^:]*):(?P<line>\d+)(?::(?P<col>\d+))?:\s+(?P<kind>fatal error|error|warning|note):\s+(?P<msg>.*)$",
            )
            .expect("Invalid diagnostic regex"),
            tool_pattern: Regex::new(
                r"^(?P<tool>(?:[\w.+-]+-)?(?:clang\+\+|clang|cc1plus|cc1|collect2|ld\.(?:lld|gold|bfd)|lld|ld|g\+\+|gcc|c\+\+|cc)(?:-\d+(?:\.\d+)*)?(?:\.exe)?):\s+(?P<kind>fatal error|error|warning|note):\s+(?P<msg>.*)$",
            )
            .expect("Invalid tool regex"),
            context_pattern: Regex::new(r"^(?:\s*(?:\d+\s*)?\||\s+[\^~])")
                .expect("Invalid context regex"),
            pending: None,
            fatal: false,
            stdout_diagnostics: false,
        }
    }

    fn start_diagnostic(
        &mut self,
        caps: &regex::Captures<'_>,
        channel: OutputChannel,
        cx: &ParseContext<'_>,
    ) {
        let kind = &caps["kind"];
        let msg = &caps["msg"];

        let mut task = match kind {
            "warning" => Task::warning(msg),
            "note" => Task::unknown(msg),
            _ => {
                if kind == "fatal error" {
                    self.fatal = true;
                }
                Task::error(msg)
            }
        };
        // Resolution happens at parse time: a later directory change must not
        // re-resolve a diagnostic that was already reported.
        task.file = Some(cx.resolve_path(Utf8Path::new(&caps["file"])));
        task.line = caps["line"].parse().ok();

        if channel == OutputChannel::Stdout {
            self.stdout_diagnostics = true;
        }
        self.pending = Some(task);
    }
}

impl LineParser for GccParser {
    fn handle_line(
        &mut self,
        line: &str,
        channel: OutputChannel,
        cx: &mut ParseContext<'_>,
    ) -> Status {
        let trimmed = line.trim_end();

        if let Some(mut pending) = self.pending.take() {
            if self.context_pattern.is_match(trimmed) {
                pending.output_lines += 1;
                self.pending = Some(pending);
                return Status::InProgress;
            }

            if let Some(caps) = self.diag_pattern.captures(trimmed) {
                if &caps["kind"] == "note" {
                    pending.message.push('\n');
                    pending.message.push_str(trimmed);
                    pending.output_lines += 1;
                    if channel == OutputChannel::Stdout {
                        self.stdout_diagnostics = true;
                    }
                    self.pending = Some(pending);
                    return Status::InProgress;
                }
            }

            // Unrelated line: the assembled diagnostic is complete.
            cx.emit(pending);
        }

        if let Some(caps) = self.diag_pattern.captures(trimmed) {
            self.start_diagnostic(&caps, channel, cx);
            return Status::InProgress;
        }

        if let Some(caps) = self.tool_pattern.captures(trimmed) {
            let kind = &caps["kind"];
            let msg = &caps["msg"];
            let task = match kind {
                "warning" => Task::warning(msg),
                "note" => Task::unknown(msg),
                _ => {
                    if kind == "fatal error" {
                        self.fatal = true;
                    }
                    Task::error(msg)
                }
            };
            if channel == OutputChannel::Stdout {
                self.stdout_diagnostics = true;
            }
            cx.emit(task);
            return Status::Done;
        }

        Status::NotHandled
    }

    fn flush(&mut self, cx: &mut ParseContext<'_>) {
        if let Some(task) = self.pending.take() {
            cx.emit(task);
        }
    }

    fn reset(&mut self) {
        self.pending = None;
        self.fatal = false;
        self.stdout_diagnostics = false;
    }

    fn has_fatal_errors(&self) -> bool {
        self.fatal
    }

    fn detected_redirection(&self) -> bool {
        self.stdout_diagnostics
    }
}

impl Default for GccParser {
    fn default() -> Self {
        Self::new()
    }
}
