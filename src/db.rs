use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

pub fn open_ro<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("open {} read-only", path.display()))?;
    // Wait a bit for locks to clear when a writer holds the DB
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(conn)
}

pub fn open_rw<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    let mut conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    create_tables(&mut conn)?;
    Ok(conn)
}

pub fn with_tx<T, F: FnOnce(&Transaction) -> Result<T>>(conn: &mut Connection, f: F) -> Result<T> {
    // IMMEDIATE to take the write lock up-front
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}

pub fn create_tables(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sections (
          section_id INTEGER NOT NULL,
          x          INTEGER NOT NULL,
          y          INTEGER NOT NULL,
          plane      INTEGER NOT NULL,
          PRIMARY KEY (x, y, plane)
        );

        CREATE INDEX IF NOT EXISTS idx_sections_id ON sections(section_id);

        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );
    "#,
    )?;
    Ok(())
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(exists.is_some())
}

pub fn set_meta(tx: &Transaction, key: &str, value: &str) -> Result<()> {
    tx.execute(
        "INSERT INTO meta(key, value) VALUES(?1, ?2) ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [key, value],
    )?;
    Ok(())
}

pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM meta WHERE key=?1", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn open_rw_creates_schema_and_meta_round_trips() -> Result<()> {
        let tmp = NamedTempFile::new()?;
        let mut conn = open_rw(tmp.path())?;
        for t in ["sections", "meta"] {
            assert!(table_exists(&conn, t)?, "expected table {} to exist", t);
        }

        with_tx(&mut conn, |tx| set_meta(tx, "section_count", "3"))?;
        with_tx(&mut conn, |tx| set_meta(tx, "section_count", "4"))?;
        assert_eq!(get_meta(&conn, "section_count")?.as_deref(), Some("4"));
        assert_eq!(get_meta(&conn, "missing")?, None);
        Ok(())
    }
}
