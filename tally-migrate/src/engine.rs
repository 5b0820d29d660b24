//! Migration engine implementation.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::connection::{Connection, Transaction};
use crate::dialect::Dialect;
use crate::error::{MigrateResult, MigrationError};
use crate::history::{self, HistoryEntry, MigrationStatus, MigrationType};
use crate::migration::Migration;

/// Pending work computed from the supplied migrations and the history table.
#[derive(Debug, Default)]
pub struct MigrationPlan {
    /// Pending migrations per group, groups in name order, versions ascending.
    pub pending: BTreeMap<String, Vec<Migration>>,
    /// Number of supplied migrations that already have a `success` row.
    pub already_applied: usize,
}

impl MigrationPlan {
    /// Diff supplied migrations against the history.
    ///
    /// Fails if any history row is not `success`, if an applied migration's
    /// checksum changed, or if the pending versions of a group are negative
    /// or not strictly increasing.
    pub fn build(entries: &[HistoryEntry], migrations: &[Migration]) -> MigrateResult<Self> {
        if let Some(entry) = entries
            .iter()
            .find(|e| e.status != MigrationStatus::Success)
        {
            return Err(MigrationError::Dirty {
                group: entry.group.clone(),
                version: entry.version,
                status: entry.status.to_string(),
            });
        }

        let mut plan = Self::default();

        for migration in migrations {
            match entries
                .iter()
                .find(|e| e.is(&migration.group, migration.version))
            {
                Some(entry) => {
                    let actual = migration.checksum();
                    if actual != entry.checksum {
                        return Err(MigrationError::ChecksumMismatch {
                            group: migration.group.clone(),
                            version: migration.version,
                            expected: entry.checksum.clone(),
                            actual,
                        });
                    }
                    debug!(migration = %migration, "Migration already applied");
                    plan.already_applied += 1;
                }
                None => plan
                    .pending
                    .entry(migration.group.clone())
                    .or_default()
                    .push(migration.clone()),
            }
        }

        for candidates in plan.pending.values_mut() {
            candidates.sort_by_key(|m| m.version);

            let mut previous: Option<i64> = None;
            for m in candidates.iter() {
                if m.version < 0 || previous.is_some_and(|p| m.version <= p) {
                    return Err(MigrationError::InvalidVersion {
                        group: m.group.clone(),
                        version: m.version,
                        script: m.script_name.clone(),
                    });
                }
                previous = Some(m.version);
            }
        }

        Ok(plan)
    }

    /// Total number of pending migrations across groups.
    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Check if there's anything to apply.
    pub fn is_empty(&self) -> bool {
        self.pending_count() == 0
    }
}

/// A migration executed by [`Migrator::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    /// Migration group.
    pub group: String,
    /// Migration version.
    pub version: i64,
    /// Script name.
    pub script: String,
    /// Time spent executing the statements.
    pub duration: Duration,
}

/// Result of a successful [`Migrator::apply`] call.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    /// Migrations executed by this call, in execution order.
    pub applied: Vec<AppliedMigration>,
    /// Supplied migrations that were skipped because they had been applied before.
    pub already_applied: usize,
    /// Wall time of the whole call.
    pub duration: Duration,
}

impl ApplyReport {
    /// Number of migrations executed.
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Check if any migration was executed.
    pub fn has_changes(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Get a summary of the result.
    pub fn summary(&self) -> String {
        if self.applied.is_empty() {
            format!(
                "No migrations applied ({} already applied)",
                self.already_applied
            )
        } else {
            format!(
                "{} applied, {} already applied in {}ms",
                self.applied.len(),
                self.already_applied,
                self.duration.as_millis()
            )
        }
    }
}

/// Lock shared by every migrator built with [`Migrator::new`].
static PROCESS_LOCK: LazyLock<Arc<Mutex<()>>> = LazyLock::new(|| Arc::new(Mutex::new(())));

/// Applies migrations and records them in the history table.
///
/// Calls to [`apply`](Self::apply) and
/// [`apply_in_transaction`](Self::apply_in_transaction) are serialized by a
/// lock. Migrators from [`new`](Self::new) share one lock for the whole
/// process; [`with_own_lock`](Self::with_own_lock) gives a migrator (and its
/// clones) a separate one. The lock is process-local: running migrations
/// against the same database from several processes at once is not supported
/// and has to be prevented by the deployment (run them from a single
/// instance).
#[derive(Debug, Clone)]
pub struct Migrator {
    lock: Arc<Mutex<()>>,
}

impl Default for Migrator {
    fn default() -> Self {
        Self {
            lock: Arc::clone(&PROCESS_LOCK),
        }
    }
}

impl Migrator {
    /// Create a migrator using the process-wide lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a migrator whose lock is shared only with its clones.
    pub fn with_own_lock() -> Self {
        Self {
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Apply every migration that has no history row yet.
    ///
    /// The engine opens no transaction of its own; statements run in whatever
    /// context `conn` represents. Run bare, every statement and history write
    /// is committed as it happens, so a broken migration leaves its `failed`
    /// row behind for inspection. Use
    /// [`apply_in_transaction`](Self::apply_in_transaction) to make the whole
    /// batch atomic instead.
    pub async fn apply<C>(
        &self,
        conn: &mut C,
        migrations: &[Migration],
    ) -> MigrateResult<ApplyReport>
    where
        C: Connection + ?Sized,
    {
        let _guard = self.lock.lock().await;
        apply_pending(conn, migrations).await
    }

    /// Apply pending migrations inside `txn`.
    ///
    /// Commits when every migration succeeded. On any error the transaction
    /// is rolled back and the engine's error is returned; a failed rollback
    /// is only logged.
    pub async fn apply_in_transaction<T>(
        &self,
        mut txn: T,
        migrations: &[Migration],
    ) -> MigrateResult<ApplyReport>
    where
        T: Transaction,
    {
        let _guard = self.lock.lock().await;

        match apply_pending(&mut txn, migrations).await {
            Ok(report) => {
                txn.commit()
                    .await
                    .map_err(|e| e.context("cannot commit migrations"))?;
                debug!(applied = report.applied_count(), "Committed migrations");
                Ok(report)
            }
            Err(err) => {
                if let Err(e) = txn.rollback().await {
                    warn!(error = %e, "Could not roll back migrations");
                }
                Err(err)
            }
        }
    }

    /// Load the history table.
    pub async fn history<C>(&self, conn: &mut C) -> MigrateResult<Vec<HistoryEntry>>
    where
        C: Connection + ?Sized,
    {
        history::load_history(conn).await
    }

    /// Create the history table if it does not exist.
    pub async fn create_table<C>(&self, conn: &mut C) -> MigrateResult<()>
    where
        C: Connection + ?Sized,
    {
        history::create_table(conn).await
    }
}

async fn apply_pending<C>(conn: &mut C, migrations: &[Migration]) -> MigrateResult<ApplyReport>
where
    C: Connection + ?Sized,
{
    let start = Instant::now();

    let dialect = Dialect::detect(conn)
        .await
        .map_err(|e| e.context("unknown database type"))?;

    history::create_table(conn)
        .await
        .map_err(|e| e.context("cannot create migration table"))?;

    let entries = history::load_history(conn)
        .await
        .map_err(|e| e.context("cannot get history"))?;

    let plan = MigrationPlan::build(&entries, migrations)?;
    info!(
        dialect = %dialect,
        pending = plan.pending_count(),
        already_applied = plan.already_applied,
        "Applying migrations"
    );

    let mut report = ApplyReport {
        already_applied: plan.already_applied,
        ..Default::default()
    };

    for migration in plan.pending.values().flatten() {
        let applied = run_migration(dialect, conn, migration).await?;
        report.applied.push(applied);
    }

    report.duration = start.elapsed();
    Ok(report)
}

async fn run_migration<C>(
    dialect: Dialect,
    conn: &mut C,
    migration: &Migration,
) -> MigrateResult<AppliedMigration>
where
    C: Connection + ?Sized,
{
    let mut entry = HistoryEntry {
        group: migration.group.clone(),
        version: migration.version,
        script: migration.script_name.clone(),
        kind: MigrationType::Sql,
        checksum: migration.checksum(),
        applied_at: Utc::now(),
        execution_duration: Duration::ZERO,
        status: MigrationStatus::Executing,
        log: String::new(),
    };

    let start = Instant::now();
    history::insert(dialect, conn, &entry)
        .await
        .map_err(|e| e.context("failed to insert history entry"))?;

    if let Err(message) = execute_statements(conn, migration).await {
        entry.status = MigrationStatus::Failed;
        entry.log = message.clone();
        if let Err(e) = history::update(dialect, conn, &entry).await {
            warn!(migration = %migration, error = %e, "Could not mark migration as failed");
        }
        return Err(MigrationError::Execution {
            group: migration.group.clone(),
            version: migration.version,
            message,
        });
    }

    entry.status = MigrationStatus::Success;
    entry.execution_duration = start.elapsed();
    history::update(dialect, conn, &entry)
        .await
        .map_err(|e| e.context("failed to update history migration"))?;

    info!(
        migration = %migration,
        duration_ms = entry.execution_duration.as_millis() as u64,
        "Applied migration"
    );

    Ok(AppliedMigration {
        group: entry.group,
        version: entry.version,
        script: entry.script,
        duration: entry.execution_duration,
    })
}

/// Run the statements in order, stopping at the first failure.
async fn execute_statements<C>(conn: &mut C, migration: &Migration) -> Result<(), String>
where
    C: Connection + ?Sized,
{
    for stmt in &migration.statements {
        debug!(migration = %migration, sql = %stmt, "Executing migration statement");
        if let Err(e) = conn.execute(stmt, &[]).await {
            let cause = match e {
                MigrationError::Database(msg) => msg,
                other => other.to_string(),
            };
            return Err(format!("failed to execute statement '{}': {}", stmt, cause));
        }
    }
    Ok(())
}
