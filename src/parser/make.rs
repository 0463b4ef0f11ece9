use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;

use crate::models::{OutputChannel, Task};
use crate::parser::node::{LineParser, ParseContext, Status};

/// Parser for GNU make output.
///
/// Claims `*** ` error lines and the `Entering directory` / `Leaving
/// directory` announcements make prints under `-w` or during recursion.
/// Directory announcements produce no task; they feed the chain's search
/// directories so relative paths from sub-directory compiles resolve.
pub struct MakeParser {
    /// Regex for `make: *** message` error lines
    error_pattern: Regex,

    /// Regex for `make[N]: Entering/Leaving directory 'dir'` lines
    dir_pattern: Regex,

    /// Regex for the `[makefile:line: target]` prefix inside an error message
    target_pattern: Regex,
}

impl MakeParser {
    pub fn new() -> Self {
        Self {
            error_pattern: Regex::new(r"^(?:mingw32-)?g?make(?:\[\d+\])?: \*\*\* (?P<msg>.*)$")
                .expect("Invalid make error regex"),
            dir_pattern: Regex::new(
                r"^(?:mingw32-)?g?make(?:\[\d+\])?: (?P<verb>Entering|Leaving) directory ['`](?P<dir>.+)'$",
            )
            .expect("Invalid make directory regex"),
            target_pattern: Regex::new(r"^\[(?P<file>[^:\]]+):(?P<line>\d+):\s*(?P<target>[^\]]*)\]")
                .expect("Invalid make target regex"),
        }
    }
}

impl LineParser for MakeParser {
    fn handle_line(
        &mut self,
        line: &str,
        _channel: OutputChannel,
        cx: &mut ParseContext<'_>,
    ) -> Status {
        let trimmed = line.trim_end();

        if let Some(caps) = self.dir_pattern.captures(trimmed) {
            let dir = Utf8PathBuf::from(&caps["dir"]);
            match &caps["verb"] {
                "Entering" => {
                    tracing::debug!(%dir, "make entered directory");
                    cx.search_dir_entered(&dir);
                }
                _ => {
                    tracing::debug!(%dir, "make left directory");
                    cx.search_dir_left(&dir);
                }
            }
            return Status::Done;
        }

        if let Some(caps) = self.error_pattern.captures(trimmed) {
            let msg = &caps["msg"];
            let mut task = Task::error(msg);
            if let Some(target) = self.target_pattern.captures(msg) {
                task.file = Some(cx.resolve_path(Utf8Path::new(&target["file"])));
                task.line = target["line"].parse().ok();
            }
            cx.emit(task);
            return Status::Done;
        }

        Status::NotHandled
    }
}

impl Default for MakeParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::parser::search::SearchDirs;
    use crate::parser::sink::TaskSink;

    /// Sink that records tasks and directory announcements.
    #[derive(Default)]
    struct DirRecorder {
        tasks: Vec<Task>,
        entered: Vec<Utf8PathBuf>,
        left: Vec<Utf8PathBuf>,
    }

    impl TaskSink for DirRecorder {
        fn on_task(&mut self, task: Task) {
            self.tasks.push(task);
        }

        fn on_search_dir_entered(&mut self, dir: &Utf8Path) {
            self.entered.push(dir.to_path_buf());
        }

        fn on_search_dir_left(&mut self, dir: &Utf8Path) {
            self.left.push(dir.to_path_buf());
        }
    }

    fn handle(parser: &mut MakeParser, line: &str, sink: &mut DirRecorder) -> Status {
        let dirs = SearchDirs::new();
        let mut cx = ParseContext::new(sink, &dirs);
        parser.handle_line(line, OutputChannel::Stdout, &mut cx)
    }

    #[test]
    fn test_error_line_without_location() {
        let mut parser = MakeParser::new();
        let mut sink = DirRecorder::default();

        let status = handle(
            &mut parser,
            "make: *** No rule to make target 'foo.o'.  Stop.\n",
            &mut sink,
        );
        assert_eq!(status, Status::Done);
        assert_eq!(sink.tasks.len(), 1);
        assert_eq!(sink.tasks[0].severity, Severity::Error);
        assert_eq!(sink.tasks[0].message, "No rule to make target 'foo.o'.  Stop.");
        assert!(sink.tasks[0].file.is_none());
    }

    #[test]
    fn test_error_line_with_target_location() {
        let mut parser = MakeParser::new();
        let mut sink = DirRecorder::default();

        handle(&mut parser, "make[2]: *** [Makefile:42: all] Error 1\n", &mut sink);

        let task = &sink.tasks[0];
        assert_eq!(task.file.as_deref(), Some(Utf8Path::new("Makefile")));
        assert_eq!(task.line, Some(42));
        assert_eq!(task.message, "[Makefile:42: all] Error 1");
    }

    #[test]
    fn test_entering_and_leaving_directories() {
        let mut parser = MakeParser::new();
        let mut sink = DirRecorder::default();

        let status = handle(
            &mut parser,
            "make[1]: Entering directory '/home/user/proj/sub'\n",
            &mut sink,
        );
        assert_eq!(status, Status::Done);

        handle(
            &mut parser,
            "make[1]: Leaving directory '/home/user/proj/sub'\n",
            &mut sink,
        );

        assert!(sink.tasks.is_empty());
        assert_eq!(sink.entered, vec![Utf8PathBuf::from("/home/user/proj/sub")]);
        assert_eq!(sink.left, vec![Utf8PathBuf::from("/home/user/proj/sub")]);
    }

    #[test]
    fn test_old_style_backquoted_directory() {
        let mut parser = MakeParser::new();
        let mut sink = DirRecorder::default();

        handle(
            &mut parser,
            "make: Entering directory `/opt/build'\n",
            &mut sink,
        );
        assert_eq!(sink.entered, vec![Utf8PathBuf::from("/opt/build")]);
    }

    #[test]
    fn test_mingw32_make_variant() {
        let mut parser = MakeParser::new();
        let mut sink = DirRecorder::default();

        let status = handle(
            &mut parser,
            "mingw32-make[1]: *** [all] Error 2\n",
            &mut sink,
        );
        assert_eq!(status, Status::Done);
        assert_eq!(sink.tasks.len(), 1);
    }

    #[test]
    fn test_ordinary_recipe_output_not_handled() {
        let mut parser = MakeParser::new();
        let mut sink = DirRecorder::default();

        let status = handle(&mut parser, "gcc -c -o main.o main.c\n", &mut sink);
        assert_eq!(status, Status::NotHandled);
        assert!(sink.tasks.is_empty());
    }
}
