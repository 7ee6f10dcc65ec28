use std::fs;

use predicates::prelude::*;
use tempfile::tempdir;

fn cargo_bin() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("markdown-edit").unwrap()
}

const DOC: &str = "# Intro\n\nWelcome text.\n\n## Details\n\nSome details here.\n";

#[test]
fn analyze_prints_toc_json_with_sids() {
    let dir = tempdir().unwrap();
    let doc = dir.path().join("doc.md");
    fs::write(&doc, DOC).unwrap();

    let mut cmd = cargo_bin();
    cmd.arg("analyze").arg(&doc);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"sid\": \"/intro\""))
        .stdout(predicate::str::contains("\"sid\": \"/intro/details\""));
}

#[test]
fn analyze_trimmed_omits_content_classification_fields() {
    let dir = tempdir().unwrap();
    let doc = dir.path().join("doc.md");
    fs::write(&doc, DOC).unwrap();

    let mut cmd = cargo_bin();
    cmd.arg("analyze").arg(&doc).arg("--trimmed");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"sid\""))
        .stdout(predicate::str::contains("wordCount").not());
}

#[test]
fn apply_replaces_section_content_and_writes_backup() {
    let dir = tempdir().unwrap();
    let doc = dir.path().join("doc.md");
    fs::write(&doc, DOC).unwrap();

    let batch = dir.path().join("batch.json");
    fs::write(
        &batch,
        r#"{
            "targetFile": "doc.md",
            "intents": [
                {
                    "type": "replace_section_content_only",
                    "target": { "sid": "/intro/details" },
                    "content": "Replaced details body.",
                    "reason": "test",
                    "priority": 0
                }
            ]
        }"#,
    )
    .unwrap();

    let mut cmd = cargo_bin();
    cmd.arg("apply")
        .arg("doc.md")
        .arg("--batch")
        .arg(&batch)
        .arg("--project-root")
        .arg(dir.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"));

    let updated = fs::read_to_string(&doc).unwrap();
    assert!(updated.contains("Replaced details body."));
    assert!(dir.path().join("doc.bak").exists());
}

#[test]
fn apply_no_backup_skips_bak_file() {
    let dir = tempdir().unwrap();
    let doc = dir.path().join("doc.md");
    fs::write(&doc, DOC).unwrap();

    let batch = dir.path().join("batch.json");
    fs::write(
        &batch,
        r#"{
            "targetFile": "doc.md",
            "intents": [
                {
                    "type": "replace_section_content_only",
                    "target": { "sid": "/intro/details" },
                    "content": "x"
                }
            ]
        }"#,
    )
    .unwrap();

    let mut cmd = cargo_bin();
    cmd.arg("apply")
        .arg("doc.md")
        .arg("--batch")
        .arg(&batch)
        .arg("--project-root")
        .arg(dir.path())
        .arg("--no-backup");

    cmd.assert().success();
    assert!(!dir.path().join("doc.bak").exists());
}

#[test]
fn apply_unknown_sid_fails_and_leaves_document_untouched() {
    let dir = tempdir().unwrap();
    let doc = dir.path().join("doc.md");
    fs::write(&doc, DOC).unwrap();

    let batch = dir.path().join("batch.json");
    fs::write(
        &batch,
        r#"{
            "targetFile": "doc.md",
            "intents": [
                { "type": "replace_section_content_only", "target": { "sid": "/does-not-exist" }, "content": "x" }
            ]
        }"#,
    )
    .unwrap();

    let mut cmd = cargo_bin();
    cmd.arg("apply")
        .arg("doc.md")
        .arg("--batch")
        .arg(&batch)
        .arg("--project-root")
        .arg(dir.path());

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("\"success\": false"))
        .stdout(predicate::str::contains("SECTION_NOT_FOUND"));

    assert_eq!(fs::read_to_string(&doc).unwrap(), DOC);
}

#[test]
fn apply_without_project_root_and_relative_target_fails_fast() {
    let dir = tempdir().unwrap();
    let batch = dir.path().join("batch.json");
    fs::write(&batch, r#"{"targetFile": "doc.md", "intents": []}"#).unwrap();

    let mut cmd = cargo_bin();
    cmd.current_dir(dir.path())
        .arg("apply")
        .arg("doc.md")
        .arg("--batch")
        .arg("batch.json");

    // relative path with no --project-root/--workspace-root and no cwd
    // fallback: the CLI only resolves relative to an explicit root.
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("neither --project-root nor --workspace-root"));
}
