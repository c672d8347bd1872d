/*!
 * MySQL capability provider
 *
 * Feeds the completion catalog from a live server. MySQL has no level above
 * schemas ("databases" in MySQL terms are schemas), so the catalog is built
 * schema-first and database listing stays empty.
 */

use crate::completion::provider::{backtick_quote, backtick_unquote};
use crate::completion::CapabilityProvider;
use anyhow::Result;
use mysql::prelude::*;
use mysql::{Opts, Pool, PooledConn, Row};
use sqlparser::dialect::{Dialect, MySqlDialect};
use tracing::trace;

pub struct MySqlProvider {
    pool: Pool,
}

impl MySqlProvider {
    pub fn new(opts: Opts) -> Result<Self> {
        Ok(Self {
            pool: Pool::new(opts)?,
        })
    }

    fn conn(&self) -> Result<PooledConn> {
        Ok(self.pool.get_conn()?)
    }

    /// Names from the first column of every row.
    fn first_column(&self, query: String) -> Result<Vec<String>> {
        trace!(%query, "catalog query");
        let rows: Vec<Row> = self.conn()?.query(query)?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get_opt::<String, _>(0).and_then(|v| v.ok()))
            .collect())
    }
}

/// Skipped when listing schemas; browsing them usually needs extra grants.
fn is_system_schema(name: &str) -> bool {
    matches!(
        name,
        "information_schema" | "mysql" | "performance_schema" | "sys"
    )
}

/// Backtick-quote an identifier for use inside SQL text.
fn ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

impl CapabilityProvider for MySqlProvider {
    fn fetch_schemas(&self, _db: Option<&str>) -> Result<Vec<String>> {
        let schemas = self.first_column("SHOW DATABASES".to_string())?;
        Ok(schemas
            .into_iter()
            .filter(|s| !is_system_schema(s))
            .collect())
    }

    fn fetch_tables(&self, schema: &str, _db: Option<&str>) -> Result<Vec<String>> {
        self.first_column(format!("SHOW TABLES FROM {}", ident(schema)))
    }

    fn fetch_columns(&self, table: &str, schema: &str, _db: Option<&str>) -> Result<Vec<String>> {
        self.first_column(format!("SHOW COLUMNS FROM {}.{}", ident(schema), ident(table)))
    }

    /// One row per indexed column; collapsed to one name per index.
    fn fetch_indexes(&self, table: &str, schema: &str, _db: Option<&str>) -> Result<Vec<String>> {
        let query = format!("SHOW INDEX FROM {}.{}", ident(schema), ident(table));
        trace!(%query, "catalog query");
        let rows: Vec<Row> = self.conn()?.query(query)?;

        let mut indexes: Vec<String> = Vec::new();
        let names = rows
            .into_iter()
            .filter_map(|row| row.get_opt::<String, _>("Key_name").and_then(|v| v.ok()));
        for name in names {
            if !indexes.contains(&name) {
                indexes.push(name);
            }
        }
        Ok(indexes)
    }

    fn fetch_users(&self) -> Result<Vec<String>> {
        self.first_column("SELECT DISTINCT user FROM mysql.user".to_string())
    }

    fn quote_name(&self, name: &str) -> String {
        backtick_quote(name)
    }

    fn unquote_name(&self, name: &str) -> String {
        backtick_unquote(name)
    }

    fn sql_dialect(&self) -> Box<dyn Dialect> {
        Box::new(MySqlDialect {})
    }
}
