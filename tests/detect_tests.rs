//! Integration tests for tool detection and profile-driven assembly
//!
//! These tests verify:
//! - Tool detection from realistic command lines
//! - Pipelines assembled from the built-in default profiles
//! - Profile options (search dirs, redirection detector) taking effect

use std::cell::RefCell;
use std::rc::Rc;

use camino::Utf8PathBuf;
use outsift::models::{LineCategory, Severity, ToolProfile};
use outsift::parser::{
    build_profile_pipeline, detect_tool_from_command_line, parser_for_tool, pipeline_for_profile,
    ProfileError, TaskCollector,
};
use outsift::ConfigManager;
use tempfile::TempDir;

#[test]
fn test_detected_tool_feeds_parser_lookup() {
    let commands = [
        "gcc -c main.c -o main.o",
        "/usr/lib/ccache/g++-12 -O2 -c app.cpp",
        "arm-none-eabi-gcc -mcpu=cortex-m4 -c boot.c",
        "mingw32-make -j4 all",
        "clang++ -std=c++20 -fsyntax-only x.cpp",
    ];

    for command in commands {
        let tool = detect_tool_from_command_line(command)
            .unwrap_or_else(|| panic!("no tool detected in: {}", command));
        // Every detected name must map to a parser
        assert!(parser_for_tool(&tool).is_ok(), "no parser for {}", tool);
    }

    assert_eq!(detect_tool_from_command_line("cl.exe /W4 main.cpp"), None);
}

#[test]
fn test_default_profile_sifts_a_mixed_build_log() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    let manager = ConfigManager::new(&config_path).unwrap();
    let profiles = manager.load_profiles().unwrap();

    let mut pipeline = pipeline_for_profile(&profiles, "gcc-make").unwrap();
    let mut sink = TaskCollector::new();

    let log = "make[1]: Entering directory '/home/user/proj'\n\
               gcc -c -o main.o main.c\n\
               main.c:12:5: error: unused variable 'x'\n\
               make[1]: *** [Makefile:8: main.o] Error 1\n\
               make[1]: Leaving directory '/home/user/proj'\n";
    pipeline.handle_stdout(log, &mut sink);
    pipeline.flush(&mut sink);

    assert_eq!(sink.tasks.len(), 2);
    assert_eq!(sink.tasks[0].severity, Severity::Error);
    assert_eq!(sink.tasks[0].message, "unused variable 'x'");
    assert_eq!(sink.tasks[1].line, Some(8));
    assert!(!pipeline.has_fatal_errors());
}

#[test]
fn test_profile_redirection_detector_takes_effect() {
    let profile = ToolProfile {
        parsers: vec!["gcc".to_string(), "make".to_string()],
        search_dirs: Vec::new(),
        redirection_detector: Some("gcc".to_string()),
    };
    let mut pipeline = build_profile_pipeline(&profile).unwrap();

    let categories = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&categories);
    pipeline.set_line_observer(Box::new(move |_line, category| {
        seen.borrow_mut().push(category);
    }));

    let mut sink = TaskCollector::new();
    pipeline.handle_stdout("x.c:1:1: error: boom\n", &mut sink);
    pipeline.handle_stdout("all errors now\n", &mut sink);

    assert_eq!(
        *categories.borrow(),
        vec![LineCategory::Stdout, LineCategory::Stderr]
    );
}

#[test]
fn test_profile_search_dirs_resolve_diagnostics() {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    std::fs::write(root.join("widget.c"), "int w;\n").unwrap();

    let profile = ToolProfile {
        parsers: vec!["gcc".to_string()],
        search_dirs: vec![root.to_string()],
        redirection_detector: None,
    };
    let mut pipeline = build_profile_pipeline(&profile).unwrap();
    let mut sink = TaskCollector::new();

    pipeline.handle_stderr("widget.c:2:1: warning: unused\n", &mut sink);
    pipeline.flush(&mut sink);

    assert_eq!(
        sink.tasks[0].file.as_deref(),
        Some(root.join("widget.c").as_path())
    );
}

#[test]
fn test_assembly_errors() {
    let profile = ToolProfile {
        parsers: vec!["msvc".to_string()],
        ..Default::default()
    };
    assert!(matches!(
        build_profile_pipeline(&profile),
        Err(ProfileError::UnknownParser(_))
    ));

    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    let manager = ConfigManager::new(&config_path).unwrap();
    let profiles = manager.load_profiles().unwrap();
    assert!(matches!(
        pipeline_for_profile(&profiles, "no-such-profile"),
        Err(ProfileError::ProfileNotFound(_))
    ));
}
