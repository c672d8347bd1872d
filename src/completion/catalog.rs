/*!
 * Catalog snapshot
 *
 * Immutable tree of the database objects known to the completer:
 * - `Database -> Schema -> Table` when the dialect lists databases
 * - `Schema -> Table` when it does not
 *
 * Tables are leaves carrying their column and index names.
 */

use indexmap::IndexMap;
use std::sync::Arc;

/// Child nodes keyed by name, in fetch order.
pub type Children = IndexMap<String, CatalogNode>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogNode {
    Database(Children),
    Schema(Children),
    Table(TableInfo),
}

/// Column and index names of a single table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableInfo {
    pub columns: Vec<String>,
    pub indexes: Vec<String>,
}

/// Node counts, used for load logging
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub databases: usize,
    pub schemas: usize,
    pub tables: usize,
    pub columns: usize,
    pub indexes: usize,
}

/// A complete catalog snapshot. Never mutated once published.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    db_support: bool,
    entries: Children,
}

impl Catalog {
    pub fn new(db_support: bool, entries: Children) -> Self {
        Self {
            db_support,
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the top level holds databases rather than schemas.
    pub fn db_support(&self) -> bool {
        self.db_support
    }

    pub fn entries(&self) -> &Children {
        &self.entries
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats::default();
        for node in self.entries.values() {
            node.count(&mut stats);
        }
        stats
    }
}

impl CatalogNode {
    /// Children of a container node; tables have none.
    pub fn children(&self) -> Option<&Children> {
        match self {
            CatalogNode::Database(children) | CatalogNode::Schema(children) => Some(children),
            CatalogNode::Table(_) => None,
        }
    }

    fn count(&self, stats: &mut CatalogStats) {
        match self {
            CatalogNode::Database(children) => {
                stats.databases += 1;
                children.values().for_each(|c| c.count(stats));
            }
            CatalogNode::Schema(children) => {
                stats.schemas += 1;
                children.values().for_each(|c| c.count(stats));
            }
            CatalogNode::Table(info) => {
                stats.tables += 1;
                stats.columns += info.columns.len();
                stats.indexes += info.indexes.len();
            }
        }
    }
}

/// A container being walked: its index path from the top level (empty for
/// the top level itself) and the next child or leaf to visit.
#[derive(Debug)]
struct Frame {
    path: Vec<usize>,
    next: usize,
    /// Emitting prefix matches, as opposed to still looking for `key`.
    collecting: bool,
}

enum Step {
    Pop,
    Skip,
    Emit(String),
    Descend { path: Vec<usize>, collecting: bool, emit: Option<String> },
}

/// Lazy pre-order walk over the names in a snapshot.
///
/// Owns its snapshot, so the stream can outlive the request that started it.
/// Names are produced in fetch order: a container's key, then everything
/// below it, then its next sibling.
#[derive(Debug, Default)]
pub struct Names {
    catalog: Arc<Catalog>,
    stack: Vec<Frame>,
    key: String,
    prefix: String,
}

impl Names {
    /// Every name whose lower-cased form starts with `prefix`. Container keys
    /// match on their own and are always descended into.
    pub fn matching(catalog: Arc<Catalog>, prefix: &str) -> Self {
        Self::start(catalog, vec![Vec::new()], true, "", prefix)
    }

    /// Names matching `prefix` below any container keyed `key`, searched at
    /// every depth. The key itself is not emitted.
    pub fn under(catalog: Arc<Catalog>, key: &str, prefix: &str) -> Self {
        Self::start(catalog, vec![Vec::new()], false, key, prefix)
    }

    /// Like [`Names::under`], restricted to the top-level entries keyed `db`.
    pub fn under_database(catalog: Arc<Catalog>, db: &str, key: &str, prefix: &str) -> Self {
        let db = db.to_lowercase();
        let roots = catalog
            .entries
            .keys()
            .enumerate()
            .filter(|(_, name)| name.to_lowercase() == db)
            .map(|(index, _)| vec![index])
            .collect();
        Self::start(catalog, roots, false, key, prefix)
    }

    fn start(
        catalog: Arc<Catalog>,
        roots: Vec<Vec<usize>>,
        collecting: bool,
        key: &str,
        prefix: &str,
    ) -> Self {
        let stack = roots
            .into_iter()
            .rev()
            .map(|path| Frame {
                path,
                next: 0,
                collecting,
            })
            .collect();
        Self {
            catalog,
            stack,
            key: key.to_lowercase(),
            prefix: prefix.to_lowercase(),
        }
    }

    fn step(&mut self) -> Option<Step> {
        let frame = self.stack.last_mut()?;

        let mut node: Option<&CatalogNode> = None;
        for &index in &frame.path {
            let children = match node {
                None => &self.catalog.entries,
                Some(parent) => match parent.children() {
                    Some(children) => children,
                    None => return Some(Step::Pop),
                },
            };
            match children.get_index(index) {
                Some((_, child)) => node = Some(child),
                None => return Some(Step::Pop),
            }
        }

        let children = match node {
            None => &self.catalog.entries,
            Some(CatalogNode::Database(children)) | Some(CatalogNode::Schema(children)) => {
                children
            }
            Some(CatalogNode::Table(info)) => {
                if !frame.collecting {
                    return Some(Step::Pop);
                }
                let index = frame.next;
                frame.next += 1;
                let leaf = match info.columns.get(index) {
                    Some(column) => Some(column),
                    None => info.indexes.get(index - info.columns.len()),
                };
                return Some(match leaf {
                    Some(name) if name.to_lowercase().starts_with(&self.prefix) => {
                        Step::Emit(name.clone())
                    }
                    Some(_) => Step::Skip,
                    None => Step::Pop,
                });
            }
        };

        let Some((name, _)) = children.get_index(frame.next) else {
            return Some(Step::Pop);
        };
        let mut path = frame.path.clone();
        path.push(frame.next);
        frame.next += 1;

        Some(if frame.collecting {
            let emit = name
                .to_lowercase()
                .starts_with(&self.prefix)
                .then(|| name.clone());
            Step::Descend {
                path,
                collecting: true,
                emit,
            }
        } else {
            Step::Descend {
                path,
                collecting: name.to_lowercase() == self.key,
                emit: None,
            }
        })
    }
}

impl Iterator for Names {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            match self.step()? {
                Step::Pop => {
                    self.stack.pop();
                }
                Step::Skip => {}
                Step::Emit(name) => return Some(name),
                Step::Descend {
                    path,
                    collecting,
                    emit,
                } => {
                    self.stack.push(Frame {
                        path,
                        next: 0,
                        collecting,
                    });
                    if emit.is_some() {
                        return emit;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn table(columns: &[&str], indexes: &[&str]) -> CatalogNode {
        CatalogNode::Table(TableInfo {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            indexes: indexes.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn children(items: Vec<(&str, CatalogNode)>) -> Children {
        items
            .into_iter()
            .map(|(name, node)| (name.to_string(), node))
            .collect()
    }

    /// `{testdb: {public: {users: {columns: [id, name], indexes: [users_pkey]}}}}`
    pub fn testdb() -> Catalog {
        let users = table(&["id", "name"], &["users_pkey"]);
        let public = CatalogNode::Schema(children(vec![("users", users)]));
        let testdb = CatalogNode::Database(children(vec![("public", public)]));
        Catalog::new(true, children(vec![("testdb", testdb)]))
    }
}
