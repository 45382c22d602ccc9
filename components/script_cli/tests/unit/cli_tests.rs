//! Argument parsing

use clap::Parser;
use interpreter::ClassRedefinition;
use script_cli::{Cli, CliError};
use std::path::PathBuf;

#[test]
fn test_parse_chunk_only() {
    let cli = Cli::try_parse_from(["hatch-script", "game.hbc"]).unwrap();
    assert_eq!(cli.chunk, PathBuf::from("game.hbc"));
    assert!(!cli.disassemble);
    assert!(cli.entry.is_none());
    assert_eq!(cli.frames, 1);
    assert!(!cli.stats);
}

#[test]
fn test_parse_missing_chunk_fails() {
    assert!(Cli::try_parse_from(["hatch-script"]).is_err());
}

#[test]
fn test_parse_entry_and_frames() {
    let cli = Cli::try_parse_from([
        "hatch-script",
        "game.hbc",
        "--entry",
        "update",
        "--frames",
        "60",
        "--stats",
        "-d",
    ])
    .unwrap();
    assert_eq!(cli.entry.as_deref(), Some("update"));
    assert_eq!(cli.frames, 60);
    assert!(cli.stats);
    assert!(cli.disassemble);
}

#[test]
fn test_frames_must_be_numeric() {
    assert!(Cli::try_parse_from(["hatch-script", "a.hbc", "--frames", "many"]).is_err());
}

#[test]
fn test_flags_override_defaults() {
    let cli = Cli::try_parse_from([
        "hatch-script",
        "a.hbc",
        "--gc-threshold",
        "4096",
        "--growth-factor",
        "1.5",
        "--max-call-depth",
        "32",
        "--stress-gc",
    ])
    .unwrap();
    let config = cli.runtime_config().unwrap();
    assert_eq!(config.gc.initial_threshold, 4096);
    assert_eq!(config.gc.growth_factor, 1.5);
    assert_eq!(config.max_call_depth, 32);
    assert!(config.gc.stress);
}

#[test]
fn test_config_file_then_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runtime.json");
    std::fs::write(
        &path,
        r#"{ "max_call_depth": 16, "class_redefinition": "replace" }"#,
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "hatch-script",
        "a.hbc",
        "--config",
        path.to_str().unwrap(),
        "--max-call-depth",
        "8",
    ])
    .unwrap();
    let config = cli.runtime_config().unwrap();
    assert_eq!(config.max_call_depth, 8);
    assert_eq!(config.class_redefinition, ClassRedefinition::Replace);
}

#[test]
fn test_bad_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runtime.json");
    std::fs::write(&path, "{ not json").unwrap();

    let cli =
        Cli::try_parse_from(["hatch-script", "a.hbc", "--config", path.to_str().unwrap()])
            .unwrap();
    assert!(matches!(cli.runtime_config(), Err(CliError::Config { .. })));
}

#[test]
fn test_missing_config_file() {
    let cli = Cli::try_parse_from(["hatch-script", "a.hbc", "--config", "/nonexistent/x.json"])
        .unwrap();
    assert!(matches!(cli.runtime_config(), Err(CliError::Io { .. })));
}
