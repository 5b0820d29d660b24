//! Integration tests for the Tally CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get the tally binary
#[allow(deprecated)]
fn tally_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.env_remove("TALLY_DATABASE_URL").env_remove("RUST_LOG");
    cmd
}

/// Write a project with a `tally.toml` and the given scripts under `migrations/core`.
fn project(scripts: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("tally.toml"),
        r#"
[[groups]]
name = "core"
directory = "migrations/core"
"#,
    )
    .unwrap();

    let core = dir.path().join("migrations").join("core");
    fs::create_dir_all(&core).unwrap();
    for (name, sql) in scripts {
        fs::write(core.join(name), sql).unwrap();
    }
    dir
}

#[test]
fn test_help_command() {
    tally_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tally CLI"))
        .stdout(predicate::str::contains("Usage: tally [OPTIONS] <COMMAND>"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_version_command() {
    tally_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("Version"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_migrate_help() {
    tally_cmd()
        .args(["migrate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--database-url"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_check_valid_project() {
    let dir = project(&[
        ("001_users.sql", "CREATE TABLE users (id BIGINT);\n"),
        (
            "002_email.sql",
            "-- add email\nALTER TABLE users ADD email TEXT;\nCREATE INDEX users_email ON users (email);",
        ),
    ]);

    tally_cmd()
        .current_dir(dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("001_users.sql"))
        .stdout(predicate::str::contains("(2 statements"))
        .stdout(predicate::str::contains("2 migrations in 1 groups are valid"));
}

#[test]
fn test_check_with_explicit_config_path() {
    let dir = project(&[("001_users.sql", "CREATE TABLE users (id BIGINT);")]);
    let config = dir.path().join("tally.toml");

    tally_cmd()
        .args(["check", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 migrations in 1 groups are valid"));
}

#[test]
fn test_check_unterminated_statement() {
    let dir = project(&[("001_users.sql", "CREATE TABLE users (id BIGINT)")]);

    tally_cmd()
        .current_dir(dir.path())
        .arg("check")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("non terminated sql statement"));
}

#[test]
fn test_check_duplicate_versions() {
    let dir = project(&[
        ("1_users.sql", "CREATE TABLE users (id BIGINT);"),
        ("v1_accounts.sql", "CREATE TABLE accounts (id BIGINT);"),
    ]);

    tally_cmd()
        .current_dir(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("the version must be >=0 and unique"));
}

#[test]
fn test_check_missing_config() {
    let dir = TempDir::new().unwrap();

    tally_cmd()
        .current_dir(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read tally.toml"));
}

#[test]
fn test_migrate_requires_database_url() {
    let dir = project(&[("001_users.sql", "CREATE TABLE users (id BIGINT);")]);

    tally_cmd()
        .current_dir(dir.path())
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no database URL"));
}

#[test]
fn test_migrate_rejects_unknown_scheme() {
    let dir = project(&[("001_users.sql", "CREATE TABLE users (id BIGINT);")]);

    tally_cmd()
        .current_dir(dir.path())
        .args(["migrate", "--database-url", "sqlite://app.db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported database scheme 'sqlite'"));
}
