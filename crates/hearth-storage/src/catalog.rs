//! Catalog introspection: which tables the store actually has.

use std::collections::BTreeSet;
use std::fmt;

use rusqlite::Connection;

use hearth_core::{InspectError, InspectResult};

use crate::to_query_err;

/// Table names present in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    tables: BTreeSet<String>,
}

/// A table name proven to exist in a [`Catalog`].
///
/// The only way to get one is [`Catalog::validate`], so free-form input can
/// never reach query text unchecked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted identifier, safe to splice into SQL.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0.replace('"', "\"\""))
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Catalog {
    /// Read table and view names from `sqlite_master`.
    pub fn load(conn: &Connection) -> InspectResult<Self> {
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .map_err(to_query_err("list tables"))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(to_query_err("list tables"))?;

        let mut tables = BTreeSet::new();
        for row in rows {
            tables.insert(row.map_err(to_query_err("list tables"))?);
        }
        Ok(Self { tables })
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(String::as_str)
    }

    /// Exact-match lookup; anything else is `UnknownTable`.
    pub fn validate(&self, name: &str) -> InspectResult<TableName> {
        if self.contains(name) {
            Ok(TableName(name.to_string()))
        } else {
            Err(InspectError::UnknownTable {
                name: name.to_string(),
            })
        }
    }
}
