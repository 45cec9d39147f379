use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn codemap(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("codemap").expect("binary");
    cmd.arg("--root").arg(root).arg("--quiet");
    cmd
}

fn setup_repo() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("pkg")).unwrap();
    fs::write(
        root.join("pkg/a.py"),
        "def helper():\n    \"\"\"Format the greeting.\"\"\"\n    return 'hi'\n",
    )
    .unwrap();
    fs::write(
        root.join("main.py"),
        "from pkg.a import helper\n\ndef main():\n    print(helper())\n\nif __name__ == '__main__':\n    main()\n",
    )
    .unwrap();
    temp
}

fn indexed_repo() -> tempfile::TempDir {
    let temp = setup_repo();
    codemap(temp.path()).arg("index").assert().success();
    temp
}

#[test]
fn queries_before_indexing_fail_with_guidance() {
    let temp = setup_repo();
    codemap(temp.path())
        .args(["search", "helper"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Run `codemap index` first."));
}

#[test]
fn index_reports_counts_and_writes_artifacts() {
    let temp = setup_repo();
    let output = codemap(temp.path())
        .args(["index", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(report["indexing"]["files"], 2);
    assert_eq!(report["linking"]["dropped_builtins"], 1);

    for artifact in ["ingested.json", "graph.json", "dependency_map.json", "keyword_index.json"] {
        assert!(temp.path().join(".codemap").join(artifact).is_file(), "{artifact}");
    }
}

#[test]
fn search_and_lookup_print_node_ids() {
    let temp = indexed_repo();

    codemap(temp.path())
        .args(["search", "greeting"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. pkg.a.helper"));

    let output = codemap(temp.path())
        .args(["search", "greeting", "--json"])
        .output()
        .unwrap();
    let hits: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(hits[0]["id"], "pkg.a.helper");

    codemap(temp.path())
        .args(["lookup", "frobnicate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No exact matches found for 'frobnicate'."));

    codemap(temp.path())
        .args(["search", " "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Query is empty."));
}

#[test]
fn expand_accepts_path_style_ids() {
    let temp = indexed_repo();

    codemap(temp.path())
        .args(["expand", "pkg/a.py::helper"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# pkg.a.helper (function)"))
        .stdout(predicate::str::contains("Triggered by: main"));

    codemap(temp.path())
        .args(["expand", "pkg.missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Node 'pkg.missing' not found in graph."));
}

#[test]
fn trace_and_diagrams() {
    let temp = indexed_repo();

    codemap(temp.path())
        .args(["trace"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Function **main** calls -> helper"));

    codemap(temp.path())
        .args(["trace", "--mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph TD\n"))
        .stdout(predicate::str::contains("class A entryPoint"));

    codemap(temp.path())
        .args(["diagram", "main.main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main_main --> pkg_a_helper"));

    codemap(temp.path()).arg("diagram").assert().failure();
}

#[test]
fn node_and_overview() {
    let temp = indexed_repo();

    codemap(temp.path())
        .args(["node", "pkg.a.helper"])
        .assert()
        .success()
        .stdout(predicate::str::contains("file: pkg/a.py"))
        .stdout(predicate::str::contains("main.main"));

    codemap(temp.path())
        .args(["overview"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CORE FILES (Most heavily referenced):"))
        .stdout(predicate::str::contains("Entry point: main.py (starts at main.main)"))
        .stdout(predicate::str::contains("PROJECT FILE TREE:\n"))
        .stdout(predicate::str::contains("        a.py"));
}

#[test]
fn read_prints_numbered_lines() {
    let temp = indexed_repo();

    codemap(temp.path())
        .args(["read", "pkg/a.py", "--start", "2", "--end", "3"])
        .assert()
        .success()
        .stdout("   2 |     \"\"\"Format the greeting.\"\"\"\n   3 |     return 'hi'\n");

    codemap(temp.path())
        .args(["read", "pkg/a.py", "-s", "3", "-e", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid line range"));
}

#[test]
fn stub_vectors_can_be_selected() {
    let temp = indexed_repo();

    codemap(temp.path())
        .args(["--vector", "stub", "search", "greeting helper"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pkg.a.helper"));
}
