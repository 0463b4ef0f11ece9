use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;

use crate::models::{LineCategory, OutputChannel, Task};
use crate::parser::channel::LineAccumulator;
use crate::parser::node::{LineParser, ParserNode, Status};
use crate::parser::sink::TaskSink;

/// Identifier for a parser within a pipeline, assigned in append order.
pub type ParserId = usize;

/// Transform applied to each line before dispatch.
///
/// Returning `None` leaves the line unchanged, so cheap no-op probes avoid
/// an allocation per line.
pub type LineFilter = Box<dyn FnMut(&str) -> Option<String>>;

/// Observer for display-ready lines and their category.
pub type LineObserver = Box<dyn FnMut(&str, LineCategory)>;

/// Driver for a parser chain over a two-channel output stream.
///
/// The pipeline owns one [`LineAccumulator`] per channel and the chain
/// itself; callers push raw fragments through [`handle_stdout`](Self::handle_stdout)
/// and [`handle_stderr`](Self::handle_stderr) and receive tasks through the
/// sink they pass in. [`flush`](Self::flush) must be called once the
/// producing process has exited.
///
/// # Dispatch order per line
///
/// 1. Filters rewrite the line (registration order)
/// 2. The designated redirection detector is queried, fixing the display
///    category before the line is dispatched
/// 3. The line observer, if any, sees the line and its category
/// 4. The chain handles the line
/// 5. Directory events the parsers reported are applied to the whole chain
///
/// Querying the detector before dispatch means the line that trips it is
/// still presented under its arrival channel; only later lines recategorize.
pub struct OutputPipeline {
    chain: ParserNode,
    stdout: LineAccumulator,
    stderr: LineAccumulator,
    filters: Vec<LineFilter>,
    line_observer: Option<LineObserver>,
    redirection_detector: Option<ParserId>,
    lines_processed: u64,
}

impl OutputPipeline {
    pub fn new() -> Self {
        Self {
            chain: ParserNode::passthrough(),
            stdout: LineAccumulator::new(),
            stderr: LineAccumulator::new(),
            filters: Vec::new(),
            line_observer: None,
            redirection_detector: None,
            lines_processed: 0,
        }
    }

    /// Append a parser at the end of the chain, returning its id.
    pub fn append_parser(&mut self, parser: Box<dyn LineParser>) -> ParserId {
        self.chain.append_child(ParserNode::new(parser));
        self.chain.chain_len() - 1
    }

    pub fn append_parsers(&mut self, parsers: Vec<Box<dyn LineParser>>) {
        for parser in parsers {
            self.append_parser(parser);
        }
    }

    /// Replace every parser in the chain. Clears the redirection-detector
    /// designation, since parser ids restart from zero.
    pub fn set_parsers(&mut self, parsers: Vec<Box<dyn LineParser>>) {
        self.chain.replace_child(None);
        self.redirection_detector = None;
        self.append_parsers(parsers);
    }

    pub fn parser_count(&self) -> usize {
        self.chain.chain_len()
    }

    /// Register a line filter; filters run in registration order.
    pub fn add_filter(&mut self, filter: LineFilter) {
        self.filters.push(filter);
    }

    /// Register an observer for display-ready lines.
    pub fn set_line_observer(&mut self, observer: LineObserver) {
        self.line_observer = Some(observer);
    }

    /// Designate the parser whose redirection verdict recategorizes stdout.
    pub fn set_redirection_detector(&mut self, id: ParserId) {
        if id >= self.parser_count() {
            tracing::warn!(
                id,
                parsers = self.parser_count(),
                "redirection detector id is out of range; it will never fire"
            );
        }
        self.redirection_detector = Some(id);
    }

    /// Ingest a stdout fragment and dispatch every completed line.
    pub fn handle_stdout(&mut self, data: &str, sink: &mut dyn TaskSink) {
        self.stdout.ingest(data);
        while let Some(line) = self.stdout.next_line() {
            self.dispatch_line(&line, OutputChannel::Stdout, sink);
        }
    }

    /// Ingest a stderr fragment and dispatch every completed line.
    pub fn handle_stderr(&mut self, data: &str, sink: &mut dyn TaskSink) {
        self.stderr.ingest(data);
        while let Some(line) = self.stderr.next_line() {
            self.dispatch_line(&line, OutputChannel::Stderr, sink);
        }
    }

    /// Flush pending diagnostics and the channel remainders.
    ///
    /// Three steps: pending tasks first, then each channel's unterminated
    /// remainder is dispatched as a final line, then pending tasks again to
    /// catch anything the remainders started.
    pub fn flush(&mut self, sink: &mut dyn TaskSink) {
        self.chain.flush_tasks(sink);

        if let Some(rest) = self.stdout.finalize() {
            self.dispatch_line(&rest, OutputChannel::Stdout, sink);
        }
        if let Some(rest) = self.stderr.finalize() {
            self.dispatch_line(&rest, OutputChannel::Stderr, sink);
        }

        self.chain.flush_tasks(sink);
    }

    /// Reset for a new run. Channel buffers and parser state are discarded;
    /// chain structure, search dirs, filters and the detector designation
    /// survive.
    pub fn clear(&mut self) {
        self.stdout.clear();
        self.stderr.clear();
        self.chain.reset();
        self.lines_processed = 0;
    }

    pub fn has_fatal_errors(&self) -> bool {
        self.chain.has_fatal_errors()
    }

    pub fn set_search_dirs(&mut self, dirs: &[Utf8PathBuf]) {
        self.chain.set_search_dirs(dirs);
    }

    pub fn add_search_dir(&mut self, dir: &Utf8Path) {
        self.chain.add_search_dir(dir);
    }

    pub fn drop_search_dir(&mut self, dir: &Utf8Path) {
        self.chain.drop_search_dir(dir);
    }

    pub fn search_dirs(&self) -> &[Utf8PathBuf] {
        self.chain.search_dirs()
    }

    /// Lines dispatched since construction or the last [`clear`](Self::clear).
    pub fn lines_processed(&self) -> u64 {
        self.lines_processed
    }

    fn dispatch_line(&mut self, line: &str, channel: OutputChannel, sink: &mut dyn TaskSink) {
        self.lines_processed += 1;

        let mut rewritten: Option<String> = None;
        for filter in &mut self.filters {
            let current = rewritten.as_deref().unwrap_or(line);
            if let Some(output) = filter(current) {
                rewritten = Some(output);
            }
        }
        let line = rewritten.as_deref().unwrap_or(line);

        let category = self.display_category(channel);
        if let Some(observer) = &mut self.line_observer {
            observer(line, category);
        }

        let mut recorder = DirEventRecorder::new(sink);
        let status = self.chain.handle_line(line, channel, &mut recorder);
        if status == Status::NotHandled {
            tracing::trace!(?channel, "line not claimed by any parser");
        }

        // Directory events are applied after the dispatch returns; the chain
        // cannot be mutated while one of its nodes is borrowed.
        let events = recorder.events;
        for event in events {
            match event {
                DirEvent::Entered(dir) => self.chain.add_search_dir(&dir),
                DirEvent::Left(dir) => self.chain.drop_search_dir(&dir),
            }
        }
    }

    fn display_category(&self, channel: OutputChannel) -> LineCategory {
        match channel {
            OutputChannel::Stderr => LineCategory::Stderr,
            OutputChannel::Stdout => {
                if self.redirection_detected() {
                    LineCategory::Stderr
                } else {
                    LineCategory::Stdout
                }
            }
        }
    }

    fn redirection_detected(&self) -> bool {
        self.redirection_detector
            .and_then(|id| self.chain.parser_at(id))
            .is_some_and(|parser| parser.detected_redirection())
    }
}

impl Default for OutputPipeline {
    fn default() -> Self {
        Self::new()
    }
}

enum DirEvent {
    Entered(Utf8PathBuf),
    Left(Utf8PathBuf),
}

/// Wraps the caller's sink to capture directory events for application once
/// the current dispatch has returned the chain borrow.
struct DirEventRecorder<'a> {
    inner: &'a mut dyn TaskSink,
    events: Vec<DirEvent>,
}

impl<'a> DirEventRecorder<'a> {
    fn new(inner: &'a mut dyn TaskSink) -> Self {
        Self {
            inner,
            events: Vec::new(),
        }
    }
}

impl TaskSink for DirEventRecorder<'_> {
    fn on_task(&mut self, task: Task) {
        self.inner.on_task(task);
    }

    fn on_search_dir_entered(&mut self, dir: &Utf8Path) {
        self.events.push(DirEvent::Entered(dir.to_path_buf()));
        self.inner.on_search_dir_entered(dir);
    }

    fn on_search_dir_left(&mut self, dir: &Utf8Path) {
        self.events.push(DirEvent::Left(dir.to_path_buf()));
        self.inner.on_search_dir_left(dir);
    }
}

/// Filter that strips ANSI escape sequences (colored compiler output).
pub fn ansi_filter() -> LineFilter {
    let pattern = Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("Invalid ANSI regex");
    Box::new(move |line: &str| {
        if !line.contains('\x1b') {
            return None;
        }
        Some(pattern.replace_all(line, "").into_owned())
    })
}
