//! End-to-end tests for the notelink CLI commands.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin for tests

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Create a temporary directory with a test notebook.
struct TestNotebook {
    _temp_dir: TempDir,
    notebook_path: PathBuf,
}

impl TestNotebook {
    fn new(source: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let notebook_path = temp_dir.path().join("notebook.py");
        fs::write(&notebook_path, source).expect("Failed to write notebook");

        Self {
            _temp_dir: temp_dir,
            notebook_path,
        }
    }

    fn path(&self) -> &PathBuf {
        &self.notebook_path
    }

    fn min_path(&self) -> PathBuf {
        self.notebook_path.with_file_name("notebook.min.py")
    }
}

fn notelink() -> Command {
    Command::cargo_bin("notelink").expect("binary should build")
}

fn chain_notebook() -> String {
    r#"import marimo

app = marimo.App()


@app.cell
def a():
    x = 1
    return (x,)


@app.cell
def b(x):
    y = x + 1
    return (y,)


@app.cell
def c():
    z = 10
    return (z,)


if __name__ == "__main__":
    app.run()
"#
    .to_string()
}

#[test]
fn minify_to_file_prunes_to_the_whitelist_closure() {
    let nb = TestNotebook::new(&chain_notebook());

    notelink()
        .arg("minify-to-file")
        .arg(nb.path())
        .arg("--whitelist")
        .arg("y")
        .assert()
        .success()
        .stdout(predicate::str::contains("notebook.min.py"));

    let minified = fs::read_to_string(nb.min_path()).expect("minified file should exist");
    assert!(minified.contains("def a()"));
    assert!(minified.contains("def b(x)"));
    assert!(!minified.contains("def c()"));
    assert!(minified.contains("import marimo"));
    assert!(minified.ends_with("if __name__ == \"__main__\":\n    app.run()\n"));
}

#[test]
fn minify_to_file_without_whitelist_keeps_every_cell() {
    let nb = TestNotebook::new(&chain_notebook());

    notelink()
        .arg("minify-to-file")
        .arg(nb.path())
        .assert()
        .success();

    let minified = fs::read_to_string(nb.min_path()).unwrap();
    for def in ["def a()", "def b(x)", "def c()"] {
        assert!(minified.contains(def), "missing {def}");
    }
}

#[test]
fn minify_to_file_honors_explicit_out_path() {
    let nb = TestNotebook::new(&chain_notebook());
    let out = nb.path().with_file_name("shared.py");

    notelink()
        .arg("minify-to-file")
        .arg(nb.path())
        .arg("--whitelist")
        .arg("x")
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("shared.py"));

    assert!(out.exists());
}

#[test]
fn minify_to_url_prints_a_decodable_share_link() {
    let nb = TestNotebook::new(&chain_notebook());

    let assert = notelink()
        .arg("minify-to-url")
        .arg(nb.path())
        .arg("--whitelist")
        .arg("y")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("https://marimo.app/#code/v1."));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let token = stdout
        .trim()
        .strip_prefix("https://marimo.app/#code/")
        .unwrap();
    let text = notelink_core::decode(token).expect("token should decode");
    assert!(text.contains("def b(x)"));
    assert!(!text.contains("def c()"));
}

#[test]
fn minify_to_url_read_only_variant() {
    let nb = TestNotebook::new(&chain_notebook());

    notelink()
        .arg("minify-to-url")
        .arg(nb.path())
        .arg("--read-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("mode=read"));
}

#[test]
fn oversized_artifact_fails_with_its_size() {
    let nb = TestNotebook::new(&chain_notebook());

    notelink()
        .arg("minify-to-url")
        .arg(nb.path())
        .arg("--max-size")
        .arg("8")
        .assert()
        .failure()
        .stderr(predicate::str::contains("artifact too large"));
}

#[test]
fn duplicate_producer_exits_nonzero() {
    let nb = TestNotebook::new(
        r#"import marimo
app = marimo.App()

@app.cell
def a():
    x = 1
    return (x,)

@app.cell
def b():
    x = 2
    return (x,)

if __name__ == "__main__":
    app.run()
"#,
    );

    notelink()
        .arg("minify-to-file")
        .arg(nb.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate producer for 'x'"));
}

#[test]
fn unresolved_reference_exits_nonzero_unless_external() {
    let source = r#"import marimo
app = marimo.App()

@app.cell
def a(mo):
    x = mo
    return (x,)

if __name__ == "__main__":
    app.run()
"#;
    let nb = TestNotebook::new(source);

    notelink()
        .arg("minify-to-file")
        .arg(nb.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unresolved reference"));

    notelink()
        .arg("minify-to-file")
        .arg(nb.path())
        .arg("--external")
        .arg("mo")
        .assert()
        .success();
}

#[test]
fn unknown_whitelist_name_exits_nonzero() {
    let nb = TestNotebook::new(&chain_notebook());

    notelink()
        .arg("minify-to-file")
        .arg(nb.path())
        .arg("--whitelist")
        .arg("bogus")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid whitelist"));
}

#[test]
fn cyclic_notebook_exits_nonzero() {
    let nb = TestNotebook::new(
        r#"import marimo
app = marimo.App()

@app.cell
def a(y):
    x = y + 1
    return (x,)

@app.cell
def b(x):
    y = x + 1
    return (y,)

if __name__ == "__main__":
    app.run()
"#,
    );

    notelink()
        .arg("minify-to-file")
        .arg(nb.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cyclic dependency"));
}

#[test]
fn file_without_cells_exits_nonzero() {
    let nb = TestNotebook::new("import marimo\napp = marimo.App()\n");

    notelink()
        .arg("minify-to-file")
        .arg(nb.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no cells found"));
}

#[test]
fn help_and_version_succeed() {
    notelink().arg("--help").assert().success();
    notelink().arg("--version").assert().success();
    notelink()
        .arg("minify-to-file")
        .arg("--help")
        .assert()
        .success();
}
