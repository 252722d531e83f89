//! End-to-end tests through command dispatch

use std::path::PathBuf;

use clap::Parser;
use tempfile::TempDir;

use currtree::cli::args::Cli;
use currtree::cli::commands::execute_command;
use currtree::cli::CliError;
use currtree::exitcode;

const BROKEN: &str = r#"
[[nodes]]
id = 1
name = "Math"
type = "subject"

[[nodes]]
id = 2
name = "Orphaned Unit"
type = "unit"
parent_id = 404
"#;

const NESTED: &str = r#"
[[nodes]]
id = 1
name = "Math"
type = "subject"

[[nodes]]
id = 2
name = "Algebra"
type = "unit"
parent_id = 1

[[nodes]]
id = 3
name = "Linear Equations"
type = "topic"
parent_id = 2
"#;

fn create_node_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write node file");
    path
}

fn run(args: &[&str]) -> Result<(), CliError> {
    let mut argv = vec!["currtree", "--no-color"];
    argv.extend_from_slice(args);
    execute_command(&Cli::parse_from(argv))
}

#[test]
fn given_orphan_when_check_strict_then_fails_with_dataerr() {
    let temp = TempDir::new().unwrap();
    let file = create_node_file(&temp, "math.toml", BROKEN);
    let path = file.to_str().unwrap();

    assert!(run(&["check", path]).is_ok());

    let err = run(&["check", path, "--strict"]).unwrap_err();
    assert!(matches!(err, CliError::Defects(1)));
    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_unknown_selection_when_tree_then_exit_noinput() {
    let temp = TempDir::new().unwrap();
    let file = create_node_file(&temp, "math.toml", BROKEN);

    let err = run(&["tree", file.to_str().unwrap(), "--select", "99"]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_student_role_when_move_then_exit_noperm() {
    let temp = TempDir::new().unwrap();
    let file = create_node_file(&temp, "math.toml", BROKEN);

    let err = run(&[
        "--role",
        "student",
        "move",
        file.to_str().unwrap(),
        "2",
        "--parent",
        "1",
    ])
    .unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOPERM);
}

#[test]
fn given_toggle_without_state_flag_when_run_then_state_saved_next_to_nodes() {
    let temp = TempDir::new().unwrap();
    let file = create_node_file(&temp, "math.toml", NESTED);

    run(&["toggle", file.to_str().unwrap(), "2"]).unwrap();

    assert!(temp.path().join(".currtree-state.toml").exists());
}

#[test]
fn given_leaf_when_toggle_then_succeeds_without_saving_state() {
    let temp = TempDir::new().unwrap();
    let file = create_node_file(&temp, "math.toml", NESTED);

    run(&["toggle", file.to_str().unwrap(), "3"]).unwrap();

    assert!(!temp.path().join(".currtree-state.toml").exists());
}

#[test]
fn given_blank_id_when_path_then_usage_error() {
    let temp = TempDir::new().unwrap();
    let file = create_node_file(&temp, "math.toml", BROKEN);

    let err = run(&["path", file.to_str().unwrap(), " "]).unwrap_err();

    assert!(matches!(err, CliError::InvalidArgs(_)));
    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_existing_local_config_when_init_then_refuses() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().to_str().unwrap();

    run(&["config", "init", "--local", dir]).unwrap();
    assert!(temp.path().join(".currtree.toml").exists());

    let err = run(&["config", "init", "--local", dir]).unwrap_err();
    assert!(matches!(err, CliError::Usage(_)));
}
