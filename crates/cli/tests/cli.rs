use assert_cmd::Command;
use predicates::prelude::*;

fn cli(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("bookshelf-cli").unwrap();
    cmd.current_dir(config_dir)
        .env("BOOKSHELF_CONFIG_DIR", config_dir)
        .env_remove("BOOKSHELF_ENV")
        .env_remove("MONGO_URI")
        .env_remove("PORT");
    cmd
}

#[test]
fn config_prints_defaults() {
    let dir = tempfile::tempdir().unwrap();

    cli(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"port\": 5000"))
        .stdout(predicate::str::contains("mongodb://127.0.0.1:27017"));
}

#[test]
fn config_applies_file_and_env_overrides() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("base.toml"),
        "[database]\nname = \"library\"\n",
    )
    .unwrap();

    cli(dir.path())
        .env("PORT", "8088")
        .env("MONGO_URI", "mongodb://db.internal:27017")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"port\": 8088"))
        .stdout(predicate::str::contains("\"name\": \"library\""))
        .stdout(predicate::str::contains("mongodb://db.internal:27017"));
}

#[test]
fn unknown_environment_fails() {
    let dir = tempfile::tempdir().unwrap();

    cli(dir.path())
        .env("BOOKSHELF_ENV", "qa")
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported environment"));
}

#[test]
fn ping_logs_and_fails_when_database_is_unreachable() {
    let dir = tempfile::tempdir().unwrap();

    cli(dir.path())
        .env("MONGO_URI", "mongodb://127.0.0.1:1/bookshelf")
        .env("BOOKSHELF_DATABASE__SERVER_SELECTION_TIMEOUT_MS", "200")
        .env("RUST_LOG", "info")
        .arg("ping")
        .assert()
        .failure()
        .stdout(predicate::str::contains("database ping failed"))
        .stderr(predicate::str::contains("is unreachable"));
}
