//! Schema migrations, embedded from `sql/` and applied in filename order
//!
//! Every file uses `IF NOT EXISTS`, so running the set again is a no-op.

use rusqlite::Connection;

const MIGRATIONS: &[(&str, &str)] = &[
    ("01_selections.sql", include_str!("../../sql/01_selections.sql")),
    ("02_events.sql", include_str!("../../sql/02_events.sql")),
    (
        "03_performance_categories.sql",
        include_str!("../../sql/03_performance_categories.sql"),
    ),
    ("04_players.sql", include_str!("../../sql/04_players.sql")),
    ("05_fact_rows.sql", include_str!("../../sql/05_fact_rows.sql")),
];

pub fn run_schema_migrations(conn: &Connection) -> rusqlite::Result<()> {
    log::debug!("🔧 Running {} schema migrations", MIGRATIONS.len());

    for (name, sql) in MIGRATIONS {
        conn.execute_batch(sql)?;
        log::debug!("   └─ ✅ {}", name);
    }

    Ok(())
}
