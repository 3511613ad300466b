use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SETTINGS: &str = r#"---
search_recursively: false
file_path_filter_regexp: '.*\.log$'
sort_by_date_modified: false
code_page_read: utf-8
code_page_write: utf-8
output_file_extension: .csv
column_separator_character_integer: 44
---
field_names: [level]
regexp_pattern: '\[(\w+)\] '
---
- table_name: errors
  key_substring: ERROR
  field_names: [message]
  regexp_pattern: '(.*)'
"#;

fn write_settings(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("settings.yaml");
    fs::write(&path, content).unwrap();
    path
}

fn seqgrep() -> Command {
    Command::cargo_bin("seqgrep").unwrap()
}

#[test]
fn grep_writes_tables_and_log() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    let output = work.path().join("out");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("app.log"), "[ERROR] disk full\n[INFO] ok\n").unwrap();
    let settings = write_settings(work.path(), SETTINGS);

    seqgrep()
        .args(["-g", "-q", "-y"])
        .arg(&settings)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let table = fs::read_to_string(output.join("errors.csv")).unwrap();
    assert_eq!(table, "row_id,line_id,level,message\n0,0,ERROR,disk full\n");
    assert!(output.join("log.yaml").exists());
}

#[test]
fn grep_with_mismatch_still_succeeds() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    let output = work.path().join("out");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("app.log"), "[ERROR]disk full\n").unwrap();
    let settings = write_settings(work.path(), SETTINGS);

    seqgrep()
        .args(["-g", "--no-log-file", "-y"])
        .arg(&settings)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("[ERROR]disk full"));

    assert!(!output.join("log.yaml").exists());
}

#[test]
fn grep_with_undecodable_line_exits_with_diagnostics_code() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    let output = work.path().join("out");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("app.log"), b"[ERROR] \xff\xfe\n[ERROR] ok\n".as_slice()).unwrap();
    let settings = write_settings(work.path(), SETTINGS);

    seqgrep()
        .args(["-g", "-q", "-y"])
        .arg(&settings)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .code(2);

    let table = fs::read_to_string(output.join("errors.csv")).unwrap();
    assert_eq!(table, "row_id,line_id,level,message\n0,0,ERROR,ok\n");
}

#[test]
fn missing_mode_is_rejected() {
    let work = TempDir::new().unwrap();
    let settings = write_settings(work.path(), SETTINGS);

    seqgrep()
        .arg("-y")
        .arg(&settings)
        .args(["-i", ".", "-o", "."])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Select either -g or -c"));
}

#[test]
fn invalid_regex_is_configuration_error() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    let output = work.path().join("out");
    fs::create_dir(&input).unwrap();
    let settings = write_settings(work.path(), &SETTINGS.replace("'(.*)'", "'(.*'"));

    seqgrep()
        .args(["-g", "-y"])
        .arg(&settings)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .code(3);

    assert!(!output.exists());
}

#[test]
fn concatenate_combines_tables() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("tables");
    let output = work.path().join("combined");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("a.csv"), "row_id,line_id,x\n0,3,foo\n").unwrap();
    fs::write(input.join("b.csv"), "row_id,line_id,y\n0,5,bar\n").unwrap();
    let settings = write_settings(work.path(), SETTINGS);

    seqgrep()
        .args(["-c", "-q", "-y"])
        .arg(&settings)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let combined = fs::read_to_string(output.join("a~b.csv")).unwrap();
    assert_eq!(
        combined,
        "source_table,row_id,line_id,x,y\na,0,3,foo,\nb,0,5,,bar\n"
    );
}

#[test]
fn concatenate_without_tables_fails() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("empty");
    fs::create_dir(&input).unwrap();
    let settings = write_settings(work.path(), SETTINGS);

    seqgrep()
        .args(["-c", "-q", "-y"])
        .arg(&settings)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(work.path().join("out"))
        .assert()
        .code(5);
}

#[test]
fn generate_config_writes_loadable_settings() {
    let work = TempDir::new().unwrap();
    let path = work.path().join("sample.yaml");

    seqgrep()
        .arg("--generate-config")
        .arg("-y")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated sample settings file"));

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("table_name"));
}
