use camino::{Utf8Path, Utf8PathBuf};

use crate::models::{OutputChannel, Task};
use crate::parser::search::SearchDirs;
use crate::parser::sink::TaskSink;

/// Outcome of offering one line to a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The line was consumed and any resulting task has been emitted.
    Done,
    /// The line starts or extends a multi-line diagnostic; the parser keeps
    /// state and expects related lines to follow.
    InProgress,
    /// The line is not this parser's business; it moves on to the next node.
    NotHandled,
}

/// Capabilities handed to a parser while it handles a line or flushes.
///
/// The context borrows the chain's task sink and the owning node's search
/// directories for exactly one call, which is how a deeply nested parser's
/// emissions surface at the head of the chain.
pub struct ParseContext<'a> {
    sink: &'a mut dyn TaskSink,
    search_dirs: &'a SearchDirs,
}

impl<'a> ParseContext<'a> {
    pub(crate) fn new(sink: &'a mut dyn TaskSink, search_dirs: &'a SearchDirs) -> Self {
        Self { sink, search_dirs }
    }

    /// Emit a discovered task.
    pub fn emit(&mut self, task: Task) {
        self.sink.on_task(task);
    }

    /// Resolve a diagnostic path against the search directories currently in
    /// effect. Best effort: unresolvable paths come back unchanged.
    pub fn resolve_path(&self, path: &Utf8Path) -> Utf8PathBuf {
        self.search_dirs.resolve(path)
    }

    /// Report that the build entered a directory. The pipeline adds it to
    /// every node's search dirs once the current dispatch returns.
    pub fn search_dir_entered(&mut self, dir: &Utf8Path) {
        self.sink.on_search_dir_entered(dir);
    }

    /// Report that the build left a directory.
    pub fn search_dir_left(&mut self, dir: &Utf8Path) {
        self.sink.on_search_dir_left(dir);
    }
}

/// A single tool's line handler, as plugged into a [`ParserNode`].
///
/// Implementations recognize one output format and turn matching lines into
/// tasks. All methods except [`handle_line`](Self::handle_line) have no-op
/// defaults, so stateless parsers stay one method long.
pub trait LineParser {
    /// Offer one line. The line keeps its trailing `\n` when it came off the
    /// wire complete; a final unterminated fragment arrives without one, so
    /// implementations should right-trim before matching.
    fn handle_line(
        &mut self,
        line: &str,
        channel: OutputChannel,
        cx: &mut ParseContext<'_>,
    ) -> Status;

    /// Emit any pending multi-line diagnostic. Pending state is cleared on
    /// emission, so a repeated flush emits nothing new.
    fn flush(&mut self, _cx: &mut ParseContext<'_>) {}

    /// Discard accumulated state without emitting.
    fn reset(&mut self) {}

    /// Whether this parser saw an error severe enough that the rest of the
    /// output cannot be trusted.
    fn has_fatal_errors(&self) -> bool {
        false
    }

    /// Whether diagnostics were observed on stdout. Only consulted when this
    /// parser is the chain's designated redirection detector.
    fn detected_redirection(&self) -> bool {
        false
    }
}

/// Parser that never matches anything; pure delegation plumbing.
///
/// A chain root is one of these, so configuration operations always have a
/// node to land on even before any real parser is appended.
#[derive(Debug, Default)]
pub struct PassthroughParser;

impl LineParser for PassthroughParser {
    fn handle_line(
        &mut self,
        _line: &str,
        _channel: OutputChannel,
        _cx: &mut ParseContext<'_>,
    ) -> Status {
        Status::NotHandled
    }
}

/// One node in a parser chain.
///
/// A node owns its parser and, exclusively, its child: dropping a node drops
/// the entire subtree below it. Lines are offered to the node's own parser
/// first and travel to the child only on [`Status::NotHandled`].
///
/// Each node keeps its own copy of the search directories; the `set`/`add`/
/// `drop` operations cascade so the copies never diverge.
pub struct ParserNode {
    parser: Box<dyn LineParser>,
    child: Option<Box<ParserNode>>,
    search_dirs: SearchDirs,
}

impl ParserNode {
    pub fn new(parser: Box<dyn LineParser>) -> Self {
        Self {
            parser,
            child: None,
            search_dirs: SearchDirs::new(),
        }
    }

    /// Root node for a fresh chain; delegates everything.
    pub fn passthrough() -> Self {
        Self::new(Box::new(PassthroughParser))
    }

    /// Append a node below the deepest descendant of this chain.
    pub fn append_child(&mut self, node: ParserNode) {
        match &mut self.child {
            Some(child) => child.append_child(node),
            None => self.adopt(node),
        }
    }

    /// Replace the entire subtree below this node. The previous child chain
    /// is dropped; `None` just cuts the chain here.
    pub fn replace_child(&mut self, node: Option<ParserNode>) {
        self.child = None;
        if let Some(node) = node {
            self.adopt(node);
        }
    }

    fn adopt(&mut self, mut node: ParserNode) {
        // An adopted subtree inherits the current search dirs, keeping the
        // per-node copies in sync regardless of configuration order.
        node.set_search_dirs(self.search_dirs.dirs());
        self.child = Some(Box::new(node));
    }

    /// Offer a line to this node's parser, delegating to the child on
    /// [`Status::NotHandled`]. Returns `NotHandled` only when no parser in
    /// the subtree claimed the line.
    pub fn handle_line(
        &mut self,
        line: &str,
        channel: OutputChannel,
        sink: &mut dyn TaskSink,
    ) -> Status {
        let status = {
            let mut cx = ParseContext::new(sink, &self.search_dirs);
            self.parser.handle_line(line, channel, &mut cx)
        };
        if status == Status::NotHandled {
            if let Some(child) = &mut self.child {
                return child.handle_line(line, channel, sink);
            }
        }
        status
    }

    /// Flush this node's pending diagnostics, then the child's.
    pub fn flush_tasks(&mut self, sink: &mut dyn TaskSink) {
        {
            let mut cx = ParseContext::new(sink, &self.search_dirs);
            self.parser.flush(&mut cx);
        }
        if let Some(child) = &mut self.child {
            child.flush_tasks(sink);
        }
    }

    /// Discard accumulated parser state down the whole chain.
    pub fn reset(&mut self) {
        self.parser.reset();
        if let Some(child) = &mut self.child {
            child.reset();
        }
    }

    pub fn has_fatal_errors(&self) -> bool {
        self.parser.has_fatal_errors()
            || self.child.as_ref().is_some_and(|c| c.has_fatal_errors())
    }

    /// Replace the search directories on this node and every descendant.
    pub fn set_search_dirs(&mut self, dirs: &[Utf8PathBuf]) {
        self.search_dirs.set(dirs.to_vec());
        if let Some(child) = &mut self.child {
            child.set_search_dirs(dirs);
        }
    }

    /// Add a search directory on this node and every descendant.
    pub fn add_search_dir(&mut self, dir: &Utf8Path) {
        self.search_dirs.add(dir.to_path_buf());
        if let Some(child) = &mut self.child {
            child.add_search_dir(dir);
        }
    }

    /// Drop the first occurrence of a search directory on this node and
    /// every descendant.
    pub fn drop_search_dir(&mut self, dir: &Utf8Path) {
        self.search_dirs.remove(dir);
        if let Some(child) = &mut self.child {
            child.drop_search_dir(dir);
        }
    }

    pub fn search_dirs(&self) -> &[Utf8PathBuf] {
        self.search_dirs.dirs()
    }

    pub fn resolve_path(&self, path: &Utf8Path) -> Utf8PathBuf {
        self.search_dirs.resolve(path)
    }

    /// Number of nodes below this one.
    pub(crate) fn chain_len(&self) -> usize {
        let mut count = 0;
        let mut node = self.child.as_deref();
        while let Some(current) = node {
            count += 1;
            node = current.child.as_deref();
        }
        count
    }

    /// Parser of the descendant at `depth` (0 = first child).
    pub(crate) fn parser_at(&self, depth: usize) -> Option<&dyn LineParser> {
        let mut node = self.child.as_deref()?;
        for _ in 0..depth {
            node = node.child.as_deref()?;
        }
        Some(node.parser.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::parser::sink::TaskCollector;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records which parsers saw a line, in order, and never claims it.
    struct Tagger {
        tag: &'static str,
        seen: Rc<RefCell<Vec<&'static str>>>,
    }

    impl LineParser for Tagger {
        fn handle_line(
            &mut self,
            _line: &str,
            _channel: OutputChannel,
            _cx: &mut ParseContext<'_>,
        ) -> Status {
            self.seen.borrow_mut().push(self.tag);
            Status::NotHandled
        }
    }

    /// Claims lines containing its needle and emits an error task for them.
    struct NeedleParser {
        needle: &'static str,
        fatal: bool,
    }

    impl LineParser for NeedleParser {
        fn handle_line(
            &mut self,
            line: &str,
            _channel: OutputChannel,
            cx: &mut ParseContext<'_>,
        ) -> Status {
            if line.contains(self.needle) {
                cx.emit(Task::error(line.trim_end()));
                return Status::Done;
            }
            Status::NotHandled
        }

        fn has_fatal_errors(&self) -> bool {
            self.fatal
        }
    }

    fn tagger(tag: &'static str, seen: &Rc<RefCell<Vec<&'static str>>>) -> ParserNode {
        ParserNode::new(Box::new(Tagger {
            tag,
            seen: Rc::clone(seen),
        }))
    }

    #[test]
    fn test_append_child_recurses_to_deepest() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut root = ParserNode::passthrough();
        root.append_child(tagger("a", &seen));
        root.append_child(tagger("b", &seen));
        root.append_child(tagger("c", &seen));

        let mut sink = TaskCollector::new();
        root.handle_line("x\n", OutputChannel::Stdout, &mut sink);

        assert_eq!(*seen.borrow(), vec!["a", "b", "c"]);
        assert_eq!(root.chain_len(), 3);
    }

    #[test]
    fn test_done_stops_delegation() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut root = ParserNode::passthrough();
        root.append_child(ParserNode::new(Box::new(NeedleParser {
            needle: "claimed",
            fatal: false,
        })));
        root.append_child(tagger("after", &seen));

        let mut sink = TaskCollector::new();
        let status = root.handle_line("claimed line\n", OutputChannel::Stdout, &mut sink);

        assert_eq!(status, Status::Done);
        assert!(seen.borrow().is_empty());
        assert_eq!(sink.tasks.len(), 1);
    }

    #[test]
    fn test_unclaimed_line_returns_not_handled() {
        let mut root = ParserNode::passthrough();
        root.append_child(ParserNode::new(Box::new(NeedleParser {
            needle: "nope",
            fatal: false,
        })));

        let mut sink = TaskCollector::new();
        let status = root.handle_line("plain output\n", OutputChannel::Stdout, &mut sink);
        assert_eq!(status, Status::NotHandled);
        assert!(sink.tasks.is_empty());
    }

    #[test]
    fn test_replace_child_drops_subtree() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut root = ParserNode::passthrough();
        root.append_child(tagger("old_a", &seen));
        root.append_child(tagger("old_b", &seen));

        root.replace_child(Some(tagger("new", &seen)));
        assert_eq!(root.chain_len(), 1);

        let mut sink = TaskCollector::new();
        root.handle_line("x\n", OutputChannel::Stdout, &mut sink);
        assert_eq!(*seen.borrow(), vec!["new"]);

        root.replace_child(None);
        assert_eq!(root.chain_len(), 0);
    }

    #[test]
    fn test_child_task_surfaces_at_head_sink() {
        let mut root = ParserNode::passthrough();
        root.append_child(ParserNode::passthrough());
        root.append_child(ParserNode::new(Box::new(NeedleParser {
            needle: "deep",
            fatal: false,
        })));

        let mut sink = TaskCollector::new();
        root.handle_line("deep trouble\n", OutputChannel::Stderr, &mut sink);

        assert_eq!(sink.tasks.len(), 1);
        assert_eq!(sink.tasks[0].severity, Severity::Error);
        assert_eq!(sink.tasks[0].message, "deep trouble");
    }

    #[test]
    fn test_has_fatal_errors_folds_over_chain() {
        let mut root = ParserNode::passthrough();
        root.append_child(ParserNode::new(Box::new(NeedleParser {
            needle: "a",
            fatal: false,
        })));
        assert!(!root.has_fatal_errors());

        root.append_child(ParserNode::new(Box::new(NeedleParser {
            needle: "b",
            fatal: true,
        })));
        assert!(root.has_fatal_errors());
    }

    /// Emits the resolution of a fixed relative path, exposing which search
    /// dirs the owning node holds.
    struct ResolveEcho;

    impl LineParser for ResolveEcho {
        fn handle_line(
            &mut self,
            _line: &str,
            _channel: OutputChannel,
            cx: &mut ParseContext<'_>,
        ) -> Status {
            let resolved = cx.resolve_path(Utf8Path::new("marker.c"));
            let mut task = Task::unknown("resolved");
            task.file = Some(resolved);
            cx.emit(task);
            Status::Done
        }
    }

    #[test]
    fn test_appended_node_inherits_search_dirs() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        std::fs::write(dir.join("marker.c"), "").unwrap();

        let mut root = ParserNode::passthrough();
        root.add_search_dir(&dir);

        // Appended after the dir was added; must still resolve through it.
        root.append_child(ParserNode::new(Box::new(ResolveEcho)));

        let mut sink = TaskCollector::new();
        root.handle_line("x\n", OutputChannel::Stdout, &mut sink);
        assert_eq!(sink.tasks[0].file, Some(dir.join("marker.c")));
    }

    #[test]
    fn test_drop_search_dir_cascades() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        std::fs::write(dir.join("marker.c"), "").unwrap();

        let mut root = ParserNode::passthrough();
        root.append_child(ParserNode::new(Box::new(ResolveEcho)));
        root.add_search_dir(&dir);
        root.drop_search_dir(&dir);

        let mut sink = TaskCollector::new();
        root.handle_line("x\n", OutputChannel::Stdout, &mut sink);

        // With the dir gone the relative path comes back unchanged.
        assert_eq!(sink.tasks[0].file, Some(Utf8PathBuf::from("marker.c")));
    }

    #[test]
    fn test_set_search_dirs_replaces() {
        let mut root = ParserNode::passthrough();
        root.add_search_dir(Utf8Path::new("/old"));
        root.set_search_dirs(&[Utf8PathBuf::from("/a"), Utf8PathBuf::from("/b")]);
        assert_eq!(
            root.search_dirs(),
            &[Utf8PathBuf::from("/a"), Utf8PathBuf::from("/b")]
        );
    }

    /// Emits one tagged task on flush only.
    struct FlushTagger {
        tag: &'static str,
    }

    impl LineParser for FlushTagger {
        fn handle_line(
            &mut self,
            _line: &str,
            _channel: OutputChannel,
            _cx: &mut ParseContext<'_>,
        ) -> Status {
            Status::NotHandled
        }

        fn flush(&mut self, cx: &mut ParseContext<'_>) {
            cx.emit(Task::unknown(self.tag));
        }
    }

    #[test]
    fn test_flush_runs_head_to_tail() {
        let mut root = ParserNode::passthrough();
        root.append_child(ParserNode::new(Box::new(FlushTagger { tag: "first" })));
        root.append_child(ParserNode::new(Box::new(FlushTagger { tag: "second" })));

        let mut sink = TaskCollector::new();
        root.flush_tasks(&mut sink);

        let messages: Vec<&str> = sink.tasks.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}
