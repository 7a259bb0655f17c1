//! SQLite PRAGMA configuration for recorder connections.
//!
//! Must be called on every connection immediately after opening.

use rusqlite::Connection;

use hearth_core::InspectResult;

use crate::to_query_err;

/// Configure a read-only connection to the recorder database.
///
/// The journal mode is left as the recorder set it; `query_only` rejects any
/// statement that would write.
pub fn configure_readonly_connection(conn: &Connection, busy_timeout_ms: u32) -> InspectResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA cache_size = -8000;
        PRAGMA mmap_size = 268435456;
        PRAGMA temp_store = MEMORY;
        PRAGMA query_only = ON;
        "
    ))
    .map_err(to_query_err("configure connection"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_busy_timeout() {
        let conn = Connection::open_in_memory().unwrap();
        configure_readonly_connection(&conn, 1234).unwrap();

        let timeout: i64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 1234);
    }

    #[test]
    fn rejects_writes() {
        let conn = Connection::open_in_memory().unwrap();
        configure_readonly_connection(&conn, 5000).unwrap();

        let query_only: i64 = conn
            .pragma_query_value(None, "query_only", |row| row.get(0))
            .unwrap();
        assert_eq!(query_only, 1);
        assert!(conn.execute_batch("CREATE TABLE t (x INTEGER)").is_err());
    }
}
