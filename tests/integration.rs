//! Integration tests for the bizcard show, save and qr commands

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

const CARD: &str = "BEGIN:VCARD\r\n\
VERSION:3.0\r\n\
FN:Julian Ramirez\r\n\
ORG:Womo Solutions\r\n\
TITLE:Ingeniero de Software\r\n\
TEL:+57 300 123 4567\r\n\
EMAIL:julian@example.com\r\n\
ADR;TYPE=home:;;Cali - Colombia;;;;\r\n\
NOTE:Hola\\nBienvenido\r\n\
X-SCHOOL:Universidad del Valle\r\n\
URL:https://linkedin.com/in/julian\r\n\
URL:https://github.com/julian\r\n\
X-CREDENCIAL:Engineer\r\n\
X-LICENCIA:Lic123\r\n\
END:VCARD\r\n";

/// Test environment with an isolated config file and a vCard fixture
struct TestEnv {
    temp_dir: TempDir,
    config_path: PathBuf,
    card_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_config("")
    }

    fn with_config(config: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let card_path = temp_dir.path().join("card.vcf");
        fs::write(&config_path, config).unwrap();
        fs::write(&card_path, CARD).unwrap();

        Self {
            temp_dir,
            config_path,
            card_path,
        }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Run bizcard with this test env's config
    fn bizcard(&self) -> AssertCommand {
        let mut cmd = bizcard_cmd();
        cmd.args(["--config", self.config_path.to_str().unwrap()]);
        cmd.env_remove("BIZCARD_LOG");
        cmd
    }
}

fn bizcard_cmd() -> AssertCommand {
    AssertCommand::cargo_bin("bizcard").unwrap()
}

// =============================================================================
// Show Tests
// =============================================================================

#[test]
fn test_show_text() {
    let env = TestEnv::new();

    env.bizcard()
        .args(["show", env.card_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Julian Ramirez | Womo Solutions"))
        .stdout(predicate::str::contains("Address: Cali - Colombia"))
        .stdout(predicate::str::contains("Phone: https://wa.me/573001234567"))
        .stdout(predicate::str::contains("Email: mailto:julian@example.com"))
        .stdout(predicate::str::contains("linkedin: https://linkedin.com/in/julian"))
        .stdout(predicate::str::contains("Credential: Engineer"))
        .stdout(predicate::str::contains("Hola\nBienvenido\n"));
}

#[test]
fn test_show_json_record() {
    let env = TestEnv::new();

    let output = env
        .bizcard()
        .args(["show", "--format", "json", env.card_path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let record = &value["record"];
    assert_eq!(record["full_name"], "Julian Ramirez");
    assert_eq!(record["address"], "Cali - Colombia");
    assert_eq!(record["note"], "Hola\\nBienvenido");
    assert_eq!(record["credential"], "Engineer");
    assert_eq!(
        record["urls"],
        serde_json::json!(["https://linkedin.com/in/julian", "https://github.com/julian"])
    );
    assert_eq!(value["card"]["download_name"], "Julian_Ramirez.vcf");
}

#[test]
fn test_show_html() {
    let env = TestEnv::new();

    env.bizcard()
        .args(["show", "--format", "html", env.card_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Julian Ramirez</h1>"))
        .stdout(predicate::str::contains("<p>Hola<br>Bienvenido</p>"))
        .stdout(predicate::str::contains(
            "<a class=\"instagram\" href=\"#\"></a>",
        ));
}

#[test]
fn test_show_uses_source_from_config() {
    let temp = TestEnv::new();
    let config = format!("source = \"{}\"\n", temp.card_path.display());
    let env = TestEnv::with_config(&config);

    env.bizcard()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Julian Ramirez"));
}

#[test]
fn test_show_custom_link_slots() {
    let env = TestEnv::with_config("[links]\ncode = [\"gitlab\", \"github\"]\n");

    env.bizcard()
        .args(["show", env.card_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("code: https://github.com/julian"))
        .stdout(predicate::str::contains("linkedin:").not());
}

#[test]
fn test_show_empty_file_renders_nothing() {
    let env = TestEnv::new();
    let empty = env.path().join("empty.vcf");
    fs::write(&empty, "").unwrap();

    env.bizcard()
        .args(["show", empty.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_show_missing_file_is_load_error() {
    let env = TestEnv::new();
    let missing = env.path().join("missing.vcf");

    env.bizcard()
        .args(["show", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("error loading vCard data"));
}

#[test]
fn test_show_without_source_fails() {
    let env = TestEnv::new();

    env.bizcard()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no vCard source given"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let env = TestEnv::new();
    let missing = env.path().join("nope.toml");

    bizcard_cmd()
        .args(["--config", missing.to_str().unwrap()])
        .args(["show", env.card_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

// =============================================================================
// Save Tests
// =============================================================================

#[test]
fn test_save_writes_named_copy() {
    let env = TestEnv::new();
    let out_dir = env.path().join("out");

    env.bizcard()
        .args([
            "save",
            env.card_path.to_str().unwrap(),
            "--out-dir",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Julian_Ramirez.vcf"));

    let saved = fs::read_to_string(out_dir.join("Julian_Ramirez.vcf")).unwrap();
    assert_eq!(saved, CARD);
}

#[test]
fn test_save_without_name_uses_fallback() {
    let env = TestEnv::with_config("[contact]\nfallback_file_stem = \"card\"\n");
    let nameless = env.path().join("nameless.vcf");
    fs::write(&nameless, "BEGIN:VCARD\nEMAIL:x@example.com\nEND:VCARD\n").unwrap();

    env.bizcard()
        .args([
            "save",
            nameless.to_str().unwrap(),
            "--out-dir",
            env.path().to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(env.path().join("card.vcf").exists());
}

#[test]
fn test_save_keeps_hostile_name_inside_out_dir() {
    let env = TestEnv::new();
    let out_dir = env.path().join("out");
    let hostile = env.path().join("hostile.vcf");
    fs::write(&hostile, "BEGIN:VCARD\nFN:../escaped\nEND:VCARD\n").unwrap();

    env.bizcard()
        .args([
            "save",
            hostile.to_str().unwrap(),
            "--out-dir",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(out_dir.join("_escaped.vcf").exists());
    assert!(!env.path().join("escaped.vcf").exists());
}

#[test]
fn test_show_latin1_card_still_renders() {
    let env = TestEnv::new();
    let latin1 = env.path().join("latin1.vcf");
    fs::write(&latin1, b"FN:Juli\xe1n Ram\xedrez\nORG:Womo\nEMAIL:j@example.com\n").unwrap();

    env.bizcard()
        .args(["show", latin1.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Juli\u{FFFD}n Ram\u{FFFD}rez | Womo"))
        .stdout(predicate::str::contains("Email: mailto:j@example.com"))
        .stderr(predicate::str::contains("not valid UTF-8"));
}

// =============================================================================
// QR Tests
// =============================================================================

#[test]
fn test_qr_writes_png() {
    let env = TestEnv::new();
    let output = env.path().join("qr").join("QR.png");

    env.bizcard()
        .args([
            "qr",
            "https://example.com/vcard/",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("QR generated"));

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[test]
fn test_qr_terminal() {
    let env = TestEnv::new();

    env.bizcard()
        .args(["qr", "https://example.com/vcard/", "--terminal"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_qr_missing_logo_fails() {
    let env = TestEnv::new();
    let logo = env.path().join("logo.png");
    let output = env.path().join("QR.png");

    env.bizcard()
        .args([
            "qr",
            "https://example.com/vcard/",
            "--logo",
            logo.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("logo not found"));
    assert!(!output.exists());
}

#[test]
fn test_qr_oversized_config_fails_cleanly() {
    let env = TestEnv::with_config("[qr]\nborder = 3000000000\n");
    let output = env.path().join("QR.png");

    env.bizcard()
        .args(["qr", "https://example.com/vcard/", "--output", output.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pixels per side"));
    assert!(!output.exists());
}

#[test]
fn test_qr_without_data_fails() {
    let env = TestEnv::new();

    env.bizcard()
        .arg("qr")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no QR data given"));
}
