use std::path::Path;
use std::process::{Command, Output};

fn minish(script: &str, dir: Option<&Path>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_minish"));
    cmd.args(["--no-history", "--log-level", "off", "-c", script]);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    cmd.output().expect("failed to run minish")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn and_or_list_runs_all_three() {
    let output = minish("true && false || echo ok", None);
    assert_eq!(stdout(&output), "ok\n");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn short_circuit_skips_rest_of_list() {
    let output = minish("false && echo a || echo b", None);
    assert_eq!(stdout(&output), "");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn statements_and_negation() {
    let output = minish("echo one; ! true; echo two", None);
    assert_eq!(stdout(&output), "one\ntwo\n");
    assert_eq!(output.status.code(), Some(0));

    assert_eq!(minish("! true", None).status.code(), Some(1));
    assert_eq!(minish("! ! true", None).status.code(), Some(0));
    assert_eq!(minish("false;", None).status.code(), Some(1));
}

#[test]
fn exit_status_is_reduced_modulo_256() {
    assert_eq!(minish("exit 257", None).status.code(), Some(1));
    assert_eq!(minish("exit -1", None).status.code(), Some(255));
    assert_eq!(minish("exit", None).status.code(), Some(0));
}

#[test]
fn exit_stops_the_script() {
    let output = minish("echo before; exit 4; echo after\necho later", None);
    assert_eq!(stdout(&output), "before\n");
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn exit_usage_errors_keep_running() {
    let output = minish("exit abc; exit 1 2; echo alive", None);
    assert_eq!(
        stdout(&output),
        "exit: invalid argument\nexit: too many arguments\nalive\n"
    );
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn subshell_does_not_change_parent_directory() {
    let parent = tempfile::tempdir().unwrap();
    let child = tempfile::tempdir().unwrap();
    let parent_dir = parent.path().canonicalize().unwrap();
    let child_dir = child.path().canonicalize().unwrap();

    let script = format!("(cd {}; pwd -P); pwd -P", child_dir.display());
    let output = minish(&script, Some(&parent_dir));
    assert_eq!(
        stdout(&output),
        format!("{}\n{}\n", child_dir.display(), parent_dir.display())
    );
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn cd_changes_directory_for_later_commands() {
    let base = tempfile::tempdir().unwrap();
    let base_dir = base.path().canonicalize().unwrap();
    std::fs::create_dir(base_dir.join("sub")).unwrap();

    let output = minish("cd sub && pwd -P", Some(&base_dir));
    assert_eq!(stdout(&output), format!("{}\n", base_dir.join("sub").display()));
}

#[test]
fn subshell_status_and_exit() {
    let output = minish("(exit 3) || echo failed", None);
    assert_eq!(stdout(&output), "failed\n");
    assert_eq!(output.status.code(), Some(0));

    let output = minish("(echo inner; exit 5); echo outer", None);
    assert_eq!(stdout(&output), "inner\nouter\n");
    assert_eq!(output.status.code(), Some(0));

    assert_eq!(minish("(false)", None).status.code(), Some(1));
    assert_eq!(minish("((true) && (exit 7))", None).status.code(), Some(7));
}

#[test]
fn unmatched_paren_is_a_syntax_error() {
    let output = minish(")", None);
    assert_eq!(
        stderr(&output),
        "col 0: syntax error (expected command, not ')')\n"
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn syntax_error_does_not_run_the_line() {
    let output = minish("echo a && || echo b\necho next", None);
    assert_eq!(stdout(&output), "next\n");
    assert!(stderr(&output).contains("syntax error"));
}

#[test]
fn missing_command_reports_and_continues() {
    let output = minish("no-such-command-5e1d; echo next", None);
    assert_eq!(
        stdout(&output),
        "no-such-command-5e1d: No such file or directory\nnext\n"
    );
    assert_eq!(output.status.code(), Some(0));

    let output = minish("no-such-command-5e1d", None);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn continuation_lines_complete_the_list() {
    let output = minish("echo a &&\necho b ||\necho c", None);
    assert_eq!(stdout(&output), "a\nb\n");
    assert_eq!(output.status.code(), Some(0));

    let output = minish("(echo x &&\necho y) && echo z", None);
    assert_eq!(stdout(&output), "x\ny\nz\n");
}

#[test]
fn dangling_operator_at_end_of_script() {
    let output = minish("echo a &&", None);
    assert_eq!(stdout(&output), "");
    assert_eq!(
        stderr(&output),
        "col 9: syntax error (expected command, not '')\n"
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn exec_replaces_the_shell() {
    let output = minish("exec echo hi; echo never", None);
    assert_eq!(stdout(&output), "hi\n");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn exec_failure_exits_with_one() {
    let output = minish("exec no-such-command-5e1d; echo never", None);
    assert_eq!(
        stdout(&output),
        "no-such-command-5e1d: No such file or directory\n"
    );
    assert_eq!(output.status.code(), Some(1));
}
