use crate::database::{Connection, QueryResult};
use anyhow::Result;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use std::time::Instant;
use tracing::debug;

pub struct QueryExecutor;

/// Statements after which the completion catalog is stale.
pub fn changes_catalog(query: &str) -> bool {
    let first = query
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase();
    matches!(first.as_str(), "CREATE" | "DROP" | "ALTER" | "RENAME")
}

impl QueryExecutor {
    pub fn new() -> Self {
        QueryExecutor
    }

    /// Run `query` and print its outcome. Returns whether it succeeded;
    /// server errors are printed, not propagated.
    pub fn execute(&self, connection: &mut Connection, query: &str) -> Result<bool> {
        if query.trim().is_empty() {
            return Ok(false);
        }

        let start_time = Instant::now();
        let result = match connection.execute_query(query) {
            Ok(result) => result,
            Err(e) => {
                debug!(error = %e, "query failed");
                println!("ERROR: {}", e);
                return Ok(false);
            }
        };
        let secs = start_time.elapsed().as_secs_f64();

        if result.columns.is_empty() {
            println!(
                "Query OK, {} {} affected ({:.3} sec)",
                result.affected_rows,
                plural(result.affected_rows as usize),
                secs
            );
        } else {
            println!("{}", render(&result));
            let count = result.rows.len();
            println!("{} {} in set ({:.3} sec)", count, plural(count), secs);
        }

        Ok(true)
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "row"
    } else {
        "rows"
    }
}

fn render(result: &QueryResult) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        result
            .columns
            .iter()
            .map(|c| Cell::new(c).add_attribute(Attribute::Bold)),
    );
    for row in &result.rows {
        table.add_row(row.iter().map(Cell::new));
    }
    table
}

/// Print a single-column listing, e.g. users.
pub fn print_list(header: &str, items: &[String]) {
    let result = QueryResult {
        columns: vec![header.to_string()],
        rows: items.iter().map(|i| vec![i.clone()]).collect(),
        affected_rows: 0,
    };
    println!("{}", render(&result));
    println!("{} {} in set", items.len(), plural(items.len()));
}
