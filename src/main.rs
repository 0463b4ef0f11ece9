//! Outsift - structured diagnostic extraction from build tool output
//!
//! Main entry point for the CLI.
//!
//! # Overview
//!
//! This binary crate provides the command-line frontend for outsift. It initializes:
//! - Logging infrastructure (file rotation, stderr echo with `--debug`)
//! - Configuration loading ([`ConfigManager`])
//! - The parser pipeline ([`OutputPipeline`] assembled from `--tool` names,
//!   a `--command` to recognize, or a named profile)
//! - Streaming ingest of the input in fixed-size chunks
//!
//! Extracted tasks print on stdout as they surface (or as one JSON array with
//! `--json`); logs and the closing tally go to stderr, so piping stdout
//! onward stays clean.
//!
//! # Execution Flow
//!
//! 1. Initialize logging → logs/outsift.<date> (file), stderr when `--debug`
//! 2. Load YAML configuration from Outsift Data/
//! 3. Assemble the parser chain and apply filters and search directories
//! 4. Stream the log file (or stdin) through the pipeline chunk by chunk
//! 5. Flush the pipeline once the input is exhausted
//! 6. Report: tasks on stdout, tally on stderr, metrics to the log
//! 7. Exit nonzero when error-severity tasks were extracted
//!
//! # Configuration Files
//!
//! Expected in `Outsift Data/` directory:
//! - `Outsift Profiles.yaml`: named parser chains (defaults are used when missing)
//! - `Outsift Settings.yaml`: user preferences (default profile, chunk size)

use std::fs::File;
use std::io::Read;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;

use outsift::metrics::Metrics;
use outsift::models::{LineCategory, ProfilesConfig, Task, ToolProfile, UserSettings};
use outsift::parser::{
    ansi_filter, build_profile_pipeline, detect_tool_from_command_line, pipeline_for_profile,
    TaskSink, TaskTally,
};
use outsift::{ConfigManager, OutputPipeline, APP_NAME, VERSION};

/// Extract structured diagnostics from compiler and build tool output
#[derive(Parser, Debug)]
#[command(name = "outsift", version, about)]
struct Cli {
    /// Log file to sift; reads stdin when omitted
    log_file: Option<Utf8PathBuf>,

    /// Parser to chain, head first (gcc, g++, clang, make, ...); repeatable
    #[arg(short = 't', long = "tool", value_name = "NAME")]
    tools: Vec<String>,

    /// Named profile from Outsift Profiles.yaml
    #[arg(short, long, conflicts_with = "tools")]
    profile: Option<String>,

    /// Build command the output came from; picks a parser by executable name
    #[arg(short, long, conflicts_with_all = ["tools", "profile"], value_name = "CMDLINE")]
    command: Option<String>,

    /// Configuration directory
    #[arg(long, default_value = "Outsift Data", value_name = "DIR")]
    config_dir: Utf8PathBuf,

    /// Directory to resolve relative diagnostic paths against; repeatable
    #[arg(short = 'I', long = "search-dir", value_name = "DIR")]
    search_dirs: Vec<Utf8PathBuf>,

    /// Treat the input as stderr output instead of stdout
    #[arg(long)]
    stderr: bool,

    /// Keep ANSI escape sequences instead of stripping them
    #[arg(long)]
    keep_ansi: bool,

    /// Print extracted tasks as a JSON array instead of lines
    #[arg(long)]
    json: bool,

    /// Echo every input line to stderr, tagged with its display channel
    #[arg(long)]
    echo: bool,

    /// List the available profiles and exit
    #[arg(long)]
    list_profiles: bool,

    /// Enable debug logging and echo logs to stderr
    #[arg(long)]
    debug: bool,
}

/// Sink that reports tasks as they surface.
///
/// In line mode each task prints to stdout immediately, so results stream
/// while a long sift is still running. In JSON mode tasks are collected and
/// serialized in one batch after the flush.
struct ReportSink<'a> {
    tally: TaskTally,
    tasks: Vec<Task>,
    json: bool,
    metrics: &'a Metrics,
}

impl<'a> ReportSink<'a> {
    fn new(json: bool, metrics: &'a Metrics) -> Self {
        Self {
            tally: TaskTally::default(),
            tasks: Vec::new(),
            json,
            metrics,
        }
    }
}

impl TaskSink for ReportSink<'_> {
    fn on_task(&mut self, task: Task) {
        self.tally.record(&task);
        self.metrics.record_task(&task);
        if self.json {
            self.tasks.push(task);
        } else {
            println!("{}", task);
        }
    }
}

/// Assemble the pipeline from the command line and configuration.
///
/// Precedence: explicit `--tool` names, then `--command` detection, then the
/// `--profile` name, then the settings default profile.
fn build_pipeline(
    cli: &Cli,
    profiles: &ProfilesConfig,
    settings: &UserSettings,
) -> Result<OutputPipeline> {
    if !cli.tools.is_empty() {
        let profile = ToolProfile {
            parsers: cli.tools.clone(),
            ..Default::default()
        };
        return build_profile_pipeline(&profile)
            .context("Failed to assemble parser chain from --tool");
    }

    if let Some(command) = &cli.command {
        let tool = detect_tool_from_command_line(command)
            .with_context(|| format!("Could not recognize a tool in command: {}", command))?;
        tracing::info!("Recognized tool '{}' from command line", tool);
        let profile = ToolProfile {
            parsers: vec![tool],
            ..Default::default()
        };
        return build_profile_pipeline(&profile)
            .context("Failed to assemble parser chain from --command");
    }

    let name = cli
        .profile
        .as_deref()
        .unwrap_or(&settings.settings.default_profile);
    pipeline_for_profile(profiles, name)
        .with_context(|| format!("Failed to assemble pipeline for profile '{}'", name))
}

/// Stream a reader through the pipeline in fixed-size chunks, then flush.
///
/// Chunks are decoded incrementally: a multi-byte character split across two
/// reads is held back until its remaining bytes arrive, so chunk boundaries
/// never corrupt the text handed to the parsers.
fn sift_reader<R: Read>(
    mut reader: R,
    pipeline: &mut OutputPipeline,
    sink: &mut dyn TaskSink,
    as_stderr: bool,
    chunk_size: usize,
    metrics: &Metrics,
) -> Result<()> {
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut carry: Vec<u8> = Vec::new();

    loop {
        let n = reader.read(&mut buf).context("Failed to read input")?;
        if n == 0 {
            break;
        }
        metrics.record_chunk(n);
        carry.extend_from_slice(&buf[..n]);

        // Defer only a trailing incomplete character; anything else decodes
        // now, with replacement characters for hard junk.
        let take = match std::str::from_utf8(&carry) {
            Ok(_) => carry.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => carry.len(),
        };
        if take > 0 {
            let text = String::from_utf8_lossy(&carry[..take]);
            if as_stderr {
                pipeline.handle_stderr(&text, sink);
            } else {
                pipeline.handle_stdout(&text, sink);
            }
            carry.drain(..take);
        }
    }

    // An incomplete character at end of input decodes as a replacement char.
    if !carry.is_empty() {
        let text = String::from_utf8_lossy(&carry).into_owned();
        if as_stderr {
            pipeline.handle_stderr(&text, sink);
        } else {
            pipeline.handle_stdout(&text, sink);
        }
    }

    pipeline.flush(sink);
    Ok(())
}

/// Main entry point for the outsift CLI
///
/// # Returns
///
/// - `ExitCode::SUCCESS` when the sift ran and no error-severity tasks surfaced
/// - `ExitCode::FAILURE` when error tasks were extracted
/// - `Err(_)` if initialization or input reading failed
///
/// # Errors
///
/// This function can fail if:
/// - Logging initialization fails (disk space, permissions)
/// - Configuration files exist but contain invalid YAML
/// - The pipeline cannot be assembled (unknown parser or profile name)
/// - The log file cannot be opened or read
fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // The guard must live until exit so buffered log lines reach the file
    let _guard =
        outsift::logging::setup_logging_with_console("logs", APP_NAME, cli.debug, cli.debug)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let profiles = config_manager.load_profiles()?;
    let settings = config_manager.load_settings()?;

    if cli.list_profiles {
        for (name, profile) in &profiles.profiles {
            println!("{}: {}", name, profile.parsers.join(", "));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut pipeline = build_pipeline(&cli, &profiles, &settings)?;

    if !cli.keep_ansi {
        pipeline.add_filter(ansi_filter());
    }
    for dir in &cli.search_dirs {
        pipeline.add_search_dir(dir);
    }
    if cli.echo {
        pipeline.set_line_observer(Box::new(|line, category| {
            let tag = match category {
                LineCategory::Stdout => "out",
                LineCategory::Stderr => "err",
            };
            eprint!("[{}] {}", tag, line);
            if !line.ends_with('\n') {
                eprintln!();
            }
        }));
    }

    let metrics = Metrics::new();
    let mut sink = ReportSink::new(cli.json, &metrics);
    let chunk_size = settings.settings.chunk_size;

    let started = Instant::now();
    match &cli.log_file {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open log file: {}", path))?;
            tracing::info!("Sifting {}", path);
            sift_reader(file, &mut pipeline, &mut sink, cli.stderr, chunk_size, &metrics)?;
        }
        None => {
            tracing::info!("Sifting stdin");
            let stdin = std::io::stdin();
            sift_reader(
                stdin.lock(),
                &mut pipeline,
                &mut sink,
                cli.stderr,
                chunk_size,
                &metrics,
            )?;
        }
    }
    metrics.record_run(started.elapsed());

    if cli.json {
        let json =
            serde_json::to_string_pretty(&sink.tasks).context("Failed to serialize tasks")?;
        println!("{}", json);
    }

    tracing::info!(
        "Sifted {} lines into {} tasks",
        pipeline.lines_processed(),
        sink.tally.total()
    );

    if pipeline.has_fatal_errors() {
        tracing::warn!("A fatal error was reported; output past it may be incomplete");
    }

    if settings.settings.stat_logging {
        metrics.log_summary();
    }

    if !cli.json {
        eprintln!("{}", sink.tally.summary());
    }

    if sink.tally.errors > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
