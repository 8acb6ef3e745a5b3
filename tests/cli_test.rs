use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn mailroute() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("mailroute"));
    cmd.env_remove("MAILROUTE_CONFIG");
    cmd
}

const FALLBACK_CONFIG: &str = r#"{
    "providers": [
        { "name": "ses", "from_email": "noreply@example.com", "behavior": "rate_limit" },
        { "name": "sendgrid", "from_email": "noreply@example.com", "behavior": "unavailable" },
        { "name": "smtp", "from_email": "noreply@example.com" }
    ]
}"#;

#[test]
fn test_providers_lists_in_order() {
    let config = write_config(FALLBACK_CONFIG);

    mailroute()
        .arg("--config")
        .arg(config.path())
        .arg("providers")
        .assert()
        .success()
        .stdout("ses\nsendgrid\nsmtp\n");
}

#[test]
fn test_config_from_env() {
    let config = write_config(FALLBACK_CONFIG);

    mailroute()
        .env("MAILROUTE_CONFIG", config.path())
        .arg("providers")
        .assert()
        .success()
        .stdout(predicate::str::contains("sendgrid"));
}

#[test]
fn test_send_falls_back() {
    let config = write_config(FALLBACK_CONFIG);

    let output = mailroute()
        .arg("--config")
        .arg(config.path())
        .args(["send", "--to", "user@example.com", "--to", "broken"])
        .args(["--subject", "Fallback test", "--html", "<p>hi</p>"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(response["provider"], "smtp");
    assert_eq!(response["accepted"], serde_json::json!(["user@example.com"]));
    assert_eq!(response["rejected"], serde_json::json!(["broken"]));
    assert!(response["message_id"].as_str().unwrap().starts_with("smtp_"));
}

#[test]
fn test_send_reports_aggregate_failure() {
    let config = write_config(
        r#"{ "providers": [
            { "name": "ses", "from_email": "noreply@example.com", "behavior": "rate_limit" },
            { "name": "smtp", "from_email": "noreply@example.com", "behavior": "unavailable" }
        ] }"#,
    );

    mailroute()
        .arg("--config")
        .arg(config.path())
        .args(["send", "--to", "user@example.com", "--subject", "Hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ALL_PROVIDERS_FAILED"))
        .stderr(predicate::str::contains("ses: ses rate limit reached [RATE_LIMIT]"))
        .stderr(predicate::str::contains("smtp: smtp service unavailable"));
}

#[test]
fn test_send_named_unknown_provider() {
    let config = write_config(FALLBACK_CONFIG);

    mailroute()
        .arg("--config")
        .arg(config.path())
        .args(["send", "--to", "user@example.com", "--subject", "Hi"])
        .args(["--provider", "postmark"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "No provider available for selection: postmark",
        ));
}

#[test]
fn test_invalid_provider_config_fails() {
    let config = write_config(r#"{ "providers": [ { "name": "ses", "from_email": "" } ] }"#);

    mailroute()
        .arg("--config")
        .arg(config.path())
        .arg("providers")
        .assert()
        .failure()
        .stderr(predicate::str::contains("from_email"));
}

#[test]
fn test_missing_config_file_fails() {
    mailroute()
        .args(["--config", "/nonexistent/mailroute.json", "providers"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}
