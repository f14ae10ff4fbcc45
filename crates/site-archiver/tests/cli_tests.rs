use assert_cmd::Command;

#[test]
fn test_cli_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("site-archiver")?;

    let output = cmd.arg("--help").assert().success().get_output().stdout.clone();
    let help = String::from_utf8(output)?;
    assert!(help.contains("--no-compress"));
    assert!(help.contains("--include-sources"));

    Ok(())
}

#[test]
fn test_cli_missing_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("site-archiver")?;

    cmd.arg("--config")
        .arg("/definitely/not/here.toml")
        .assert()
        .failure();

    Ok(())
}

#[test]
fn test_cli_rejects_non_base_url() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("site-archiver")?;

    cmd.arg("mailto:someone@example.com").assert().failure();

    Ok(())
}

#[test]
fn test_cli_rejects_malformed_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("archive.toml");
    std::fs::write(&config, "[crawl]\nmax-pages = \"lots\"\n")?;

    let mut cmd = Command::cargo_bin("site-archiver")?;
    cmd.arg("--config").arg(&config).assert().failure();

    Ok(())
}

#[test]
fn test_cli_json_logs_go_to_stderr() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;

    let mut cmd = Command::cargo_bin("site-archiver")?;
    let output = cmd
        .env_remove("RUST_LOG")
        .args(["--log-format", "json", "-W", "ws://127.0.0.1:9/devtools/browser/none"])
        .arg("--output")
        .arg(dir.path().join("site.pdf"))
        .assert()
        .failure()
        .get_output()
        .clone();

    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains(r#""level":"INFO""#));
    assert!(stderr.contains("Archiving"));

    Ok(())
}
