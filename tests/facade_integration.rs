//! Integration tests for the `tally` facade crate.

use std::fs;

use pretty_assertions::assert_eq;
use tally::migrate::{MigrationPlan, checksum};
use tally::prelude::*;
use tempfile::TempDir;

#[tokio::test]
async fn test_load_and_plan_groups() {
    let dir = TempDir::new().unwrap();
    for (group, name, sql) in [
        ("core", "002_email.sql", "ALTER TABLE users ADD email TEXT;"),
        ("core", "001_users.sql", "CREATE TABLE users (id BIGINT);"),
        ("audit", "001_log.sql", "CREATE TABLE audit_log (id BIGINT);"),
    ] {
        let path = dir.path().join(group);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(name), sql).unwrap();
    }

    let sources = [
        GroupSource::new("core", "core"),
        GroupSource::new("audit", "audit"),
    ];
    let migrations = load_groups(&sources, dir.path()).await.unwrap();
    let plan = MigrationPlan::build(&[], &migrations).unwrap();

    assert_eq!(plan.pending_count(), 3);
    let groups: Vec<&str> = plan.pending.keys().map(String::as_str).collect();
    assert_eq!(groups, vec!["audit", "core"]);
    let core: Vec<i64> = plan.pending["core"].iter().map(|m| m.version).collect();
    assert_eq!(core, vec![1, 2]);
}

#[test]
fn test_checksum_is_stable() {
    let migration = Migration::new("core", 1, ["CREATE TABLE users (id BIGINT)"], "001.sql");
    assert_eq!(migration.checksum(), checksum(&migration.statements));
    assert_eq!(migration.checksum().len(), 64);
}
