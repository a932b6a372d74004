use assert_cmd::Command;
use predicates::prelude::*;

fn ember() -> Command {
    Command::cargo_bin("ember-cli").unwrap()
}

#[test]
fn interactive_session_lowers_each_statement() {
    ember()
        .write_stdin("define double(x) x*2;\ndouble(4);\n=exit\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("define @double(%x)")
                .and(predicate::str::contains("call @double(4)"))
                .and(predicate::str::contains("; module main")),
        );
}

#[test]
fn errors_are_prefixed_and_the_session_continues() {
    ember()
        .write_stdin("bar(1);\n1+1;\n=exit\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Error: Unknown function 'bar'")
                .and(predicate::str::contains("ret 2")),
        );
}

#[test]
fn a_statement_may_span_several_lines() {
    ember()
        .write_stdin("define f(x)\nx*2;\n=exit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("define @f(%x)"));
}

#[test]
fn session_ends_at_end_of_input_without_the_sentinel() {
    ember()
        .write_stdin("extern sin(x);\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("declare @sin(%x)"));
}

#[test]
fn inline_eval_lowers_and_dumps_the_module() {
    ember()
        .args(["-e", "define foo(x) x+1; foo(2);"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("define @foo(%x)")
                .and(predicate::str::contains("call @foo(2)")),
        );
}

#[test]
fn inline_eval_failure_sets_the_exit_code() {
    ember()
        .args(["-e", "bar();"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error: Unknown function 'bar'"));
}

#[test]
fn lex_errors_report_the_offending_character() {
    ember()
        .write_stdin("1 $ 2;\n=exit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Error: [1:3] Unknown character '$'"));
}

#[test]
fn file_mode_reads_a_script() {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("ember_cli_test_{}.ember", std::process::id()));
    std::fs::write(&path, "define triple(x) x*3;\n").unwrap();

    ember()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("define @triple(%x)"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn missing_file_reports_an_error() {
    ember()
        .arg("definitely_missing.ember")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error reading"));
}
