use anyhow::{Context, Result};
use rusqlite::Connection;

/// Ordered schema steps. Step `n` (1-based) brings `user_version` to `n`.
const MIGRATIONS: &[(&str, &str)] = &[("initial", include_str!("migrations/001_initial.sql"))];

/// Bring the database up to the latest schema. Safe to call on every open.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current = schema_version(conn)?;

    for (step, (name, sql)) in MIGRATIONS.iter().enumerate().skip(current) {
        let version = step + 1;
        tracing::info!(version, name, "Applying migration");

        conn.execute_batch(&format!(
            "BEGIN; {} PRAGMA user_version = {}; COMMIT;",
            sql, version
        ))
        .with_context(|| format!("Failed to apply migration {} ({})", version, name))?;
    }

    Ok(())
}

fn schema_version(conn: &Connection) -> Result<usize> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("Failed to read schema version")?;
    Ok(usize::try_from(version).unwrap_or(0))
}
