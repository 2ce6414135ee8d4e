//! Connection PRAGMAs shared by every SQLite connection the crate opens

use rusqlite::Connection;

/// WAL + NORMAL sync, in-memory temp tables, 1000-page autocheckpoint
pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "wal_autocheckpoint", 1000)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(())
}
