/*!
 * Dialect capability hooks
 *
 * Everything the completion engine needs to know about a concrete SQL
 * dialect lives behind this trait:
 * - catalog fetch hooks (databases, schemas, tables, columns, indexes, users)
 * - identifier quoting rules
 * - the tokenizer dialect
 */

use anyhow::Result;
use sqlparser::dialect::{Dialect, GenericDialect};

/// Dialect-supplied catalog access and quoting rules.
///
/// Every fetch hook defaults to an empty list, which the loader treats as
/// "no children". Retries and caching are the implementor's business; the
/// engine calls each hook once per load.
pub trait CapabilityProvider: Send + Sync {
    fn fetch_databases(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn fetch_schemas(&self, _db: Option<&str>) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn fetch_tables(&self, _schema: &str, _db: Option<&str>) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn fetch_columns(&self, _table: &str, _schema: &str, _db: Option<&str>) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn fetch_indexes(&self, _table: &str, _schema: &str, _db: Option<&str>) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Not used by the loader; exposed for callers.
    fn fetch_users(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn quote_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn unquote_name(&self, name: &str) -> String {
        name.to_string()
    }

    /// Dialect handed to the tokenizer when classifying input.
    fn sql_dialect(&self) -> Box<dyn Dialect> {
        Box::new(GenericDialect {})
    }
}

/// Backtick quoting as used by MySQL.
pub fn backtick_quote(name: &str) -> String {
    if !name.starts_with('`') && !name.ends_with('`') {
        format!("`{}`", name)
    } else {
        name.to_string()
    }
}

pub fn backtick_unquote(name: &str) -> String {
    name.trim_matches('`').to_string()
}
