/*!
 * Catalog loading
 *
 * Builds catalog snapshots from a `CapabilityProvider` and publishes them
 * through an `ArcSwap`, so readers always see one complete snapshot.
 * Builds are serialized by a reload guard; reads never take it.
 */

use super::catalog::{Catalog, CatalogNode, Children, TableInfo};
use super::error::CompletionError;
use super::provider::CapabilityProvider;
use anyhow::Result;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use tracing::{debug, info, warn};

pub struct CatalogLoader {
    provider: Arc<dyn CapabilityProvider>,
    snapshot: ArcSwap<Catalog>,
    /// Decided by the first successful database listing, then frozen.
    db_support: OnceLock<bool>,
    reload_guard: Mutex<()>,
    background_finished: AtomicBool,
    /// Set by the first request that retries after an empty background load.
    fallback_attempted: AtomicBool,
}

impl CatalogLoader {
    pub fn new(provider: Arc<dyn CapabilityProvider>) -> Self {
        Self {
            provider,
            snapshot: ArcSwap::from_pointee(Catalog::default()),
            db_support: OnceLock::new(),
            reload_guard: Mutex::new(()),
            background_finished: AtomicBool::new(false),
            fallback_attempted: AtomicBool::new(false),
        }
    }

    pub fn provider(&self) -> &dyn CapabilityProvider {
        self.provider.as_ref()
    }

    /// `None` until a load has listed databases.
    pub fn db_support(&self) -> Option<bool> {
        self.db_support.get().copied()
    }

    /// Latest published snapshot, without any fallback.
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.snapshot.load_full()
    }

    pub fn background_finished(&self) -> bool {
        self.background_finished.load(Ordering::Acquire)
    }

    /// Start the initial load on a detached worker thread.
    pub fn spawn_background(self: &Arc<Self>) {
        let loader = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("catalog-loader".to_string())
            .spawn(move || {
                if let Err(e) = loader.load(false) {
                    warn!(error = %e, "background catalog load failed");
                }
                loader.background_finished.store(true, Ordering::Release);
            });

        if let Err(e) = spawned {
            warn!(error = %e, "could not start catalog loader thread");
            self.background_finished.store(true, Ordering::Release);
        }
    }

    /// Snapshot for a completion request.
    ///
    /// While the background load runs this is whatever is published (empty
    /// at first). Once it has finished with nothing to show, the first
    /// request retries the load synchronously on the calling thread. Later
    /// requests get the snapshot as is; only a forced reload rebuilds it.
    pub fn current(&self) -> Arc<Catalog> {
        let snapshot = self.snapshot();
        if !snapshot.is_empty() || !self.background_finished() {
            return snapshot;
        }
        if self.fallback_attempted.swap(true, Ordering::AcqRel) {
            return snapshot;
        }

        match self.load(false) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "catalog fallback load failed");
                snapshot
            }
        }
    }

    /// Build and publish a catalog. Without `force`, an existing non-empty
    /// snapshot is returned as is.
    pub fn load(&self, force: bool) -> Result<Arc<Catalog>, CompletionError> {
        let _guard = self.reload_guard.lock();

        let current = self.snapshot();
        if !force && !current.is_empty() {
            return Ok(current);
        }

        debug!(force, "loading catalog");
        let catalog = Arc::new(self.build().map_err(CompletionError::CatalogUnavailable)?);

        let stats = catalog.stats();
        info!(
            db_support = catalog.db_support(),
            databases = stats.databases,
            schemas = stats.schemas,
            tables = stats.tables,
            columns = stats.columns,
            indexes = stats.indexes,
            "catalog loaded"
        );

        self.snapshot.store(Arc::clone(&catalog));
        Ok(catalog)
    }

    fn build(&self) -> Result<Catalog> {
        let databases = self.provider.fetch_databases()?;
        let db_support = *self.db_support.get_or_init(|| !databases.is_empty());

        let entries = if db_support {
            let mut entries = Children::new();
            for db in databases {
                let schemas = self.schemas(Some(&db))?;
                entries.insert(db, CatalogNode::Database(schemas));
            }
            entries
        } else {
            self.schemas(None)?
        };

        Ok(Catalog::new(db_support, entries))
    }

    fn schemas(&self, db: Option<&str>) -> Result<Children> {
        let mut schemas = Children::new();
        for schema in self.provider.fetch_schemas(db)? {
            let tables = self.tables(&schema, db)?;
            schemas.insert(schema, CatalogNode::Schema(tables));
        }
        Ok(schemas)
    }

    /// One round trip per table for columns and another for indexes.
    fn tables(&self, schema: &str, db: Option<&str>) -> Result<Children> {
        let mut tables = Children::new();
        for table in self.provider.fetch_tables(schema, db)? {
            let info = TableInfo {
                columns: self.provider.fetch_columns(&table, schema, db)?,
                indexes: self.provider.fetch_indexes(&table, schema, db)?,
            };
            tables.insert(table, CatalogNode::Table(info));
        }
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use parking_lot::Mutex as PlMutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    /// Provider whose database listing can change between loads.
    struct Scripted {
        databases: PlMutex<Vec<Vec<String>>>,
        calls: PlMutex<Vec<String>>,
    }

    impl Scripted {
        fn new(listings: Vec<Vec<&str>>) -> Self {
            Self {
                databases: PlMutex::new(
                    listings
                        .into_iter()
                        .map(|l| l.into_iter().map(String::from).collect())
                        .collect(),
                ),
                calls: PlMutex::new(Vec::new()),
            }
        }
    }

    impl CapabilityProvider for Scripted {
        fn fetch_databases(&self) -> Result<Vec<String>> {
            let mut listings = self.databases.lock();
            if listings.len() > 1 {
                Ok(listings.remove(0))
            } else {
                Ok(listings.first().cloned().unwrap_or_default())
            }
        }

        fn fetch_schemas(&self, db: Option<&str>) -> Result<Vec<String>> {
            self.calls.lock().push(format!("schemas {:?}", db));
            Ok(vec!["public".to_string()])
        }

        fn fetch_tables(&self, schema: &str, db: Option<&str>) -> Result<Vec<String>> {
            self.calls.lock().push(format!("tables {} {:?}", schema, db));
            Ok(vec!["users".to_string(), "orders".to_string()])
        }

        fn fetch_columns(&self, table: &str, schema: &str, db: Option<&str>) -> Result<Vec<String>> {
            self.calls.lock().push(format!("columns {} {} {:?}", table, schema, db));
            Ok(vec![format!("{}_id", table)])
        }

        fn fetch_indexes(&self, table: &str, schema: &str, db: Option<&str>) -> Result<Vec<String>> {
            self.calls.lock().push(format!("indexes {} {} {:?}", table, schema, db));
            Ok(Vec::new())
        }
    }

    struct Failing;

    impl CapabilityProvider for Failing {
        fn fetch_databases(&self) -> Result<Vec<String>> {
            bail!("connection refused")
        }
    }

    /// Lists databases successfully, then fails on the schema listing.
    struct BrokenSchemas;

    impl CapabilityProvider for BrokenSchemas {
        fn fetch_databases(&self) -> Result<Vec<String>> {
            Ok(vec!["testdb".to_string()])
        }

        fn fetch_schemas(&self, _db: Option<&str>) -> Result<Vec<String>> {
            bail!("permission denied")
        }
    }

    /// A dialect with nothing in it that counts its listings.
    #[derive(Default)]
    struct Empty {
        listings: AtomicUsize,
    }

    impl CapabilityProvider for Empty {
        fn fetch_databases(&self) -> Result<Vec<String>> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    /// Holds every `fetch_tables` call until the test releases it. Each load
    /// lists one more table than the one before.
    struct Gated {
        loads: AtomicUsize,
        entered: PlMutex<mpsc::Sender<()>>,
        release: PlMutex<mpsc::Receiver<()>>,
    }

    impl Gated {
        fn new() -> (Self, mpsc::Receiver<()>, mpsc::Sender<()>) {
            let (entered_tx, entered_rx) = mpsc::channel();
            let (release_tx, release_rx) = mpsc::channel();
            let provider = Self {
                loads: AtomicUsize::new(0),
                entered: PlMutex::new(entered_tx),
                release: PlMutex::new(release_rx),
            };
            (provider, entered_rx, release_tx)
        }
    }

    impl CapabilityProvider for Gated {
        fn fetch_schemas(&self, _db: Option<&str>) -> Result<Vec<String>> {
            Ok(vec!["public".to_string()])
        }

        fn fetch_tables(&self, _schema: &str, _db: Option<&str>) -> Result<Vec<String>> {
            let _ = self.entered.lock().send(());
            let _ = self.release.lock().recv();
            let loads = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((0..loads).map(|i| format!("t{}", i)).collect())
        }

        fn fetch_columns(&self, _table: &str, _schema: &str, _db: Option<&str>) -> Result<Vec<String>> {
            Ok(vec!["id".to_string()])
        }
    }

    #[test]
    fn test_schema_only_shape() {
        let loader = CatalogLoader::new(Arc::new(Scripted::new(vec![vec![]])));
        let catalog = loader.load(false).unwrap();

        assert!(!catalog.db_support());
        assert_eq!(loader.db_support(), Some(false));
        let public = &catalog.entries()["public"];
        assert!(matches!(public, CatalogNode::Schema(_)));
        let users = &public.children().unwrap()["users"];
        assert_eq!(
            users,
            &CatalogNode::Table(TableInfo {
                columns: vec!["users_id".to_string()],
                indexes: vec![],
            })
        );
    }

    #[test]
    fn test_database_shape_passes_db_to_hooks() {
        let provider = Arc::new(Scripted::new(vec![vec!["testdb"]]));
        let loader = CatalogLoader::new(provider.clone());
        let catalog = loader.load(false).unwrap();

        assert!(catalog.db_support());
        assert!(matches!(catalog.entries()["testdb"], CatalogNode::Database(_)));
        let calls = provider.calls.lock();
        assert!(calls.contains(&"columns users public Some(\"testdb\")".to_string()));
        assert!(calls.contains(&"indexes orders public Some(\"testdb\")".to_string()));
    }

    #[test]
    fn test_non_forced_load_keeps_snapshot() {
        let provider = Arc::new(Scripted::new(vec![vec![]]));
        let loader = CatalogLoader::new(provider.clone());
        let first = loader.load(false).unwrap();
        let calls = provider.calls.lock().len();

        let second = loader.load(false).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls.lock().len(), calls);

        let third = loader.load(true).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn test_db_support_frozen_after_first_listing() {
        let loader = CatalogLoader::new(Arc::new(Scripted::new(vec![vec![], vec!["late_db"]])));
        assert!(!loader.load(false).unwrap().db_support());

        let reloaded = loader.load(true).unwrap();
        assert!(!reloaded.db_support());
        assert_eq!(loader.db_support(), Some(false));
        assert!(reloaded.entries().contains_key("public"));
        assert!(!reloaded.entries().contains_key("late_db"));
    }

    #[test]
    fn test_failed_load_keeps_empty_snapshot() {
        let loader = CatalogLoader::new(Arc::new(Failing));
        let err = loader.load(false).unwrap_err();
        assert!(matches!(err, CompletionError::CatalogUnavailable(_)));
        assert!(loader.snapshot().is_empty());
        assert_eq!(loader.db_support(), None);
    }

    #[test]
    fn test_current_falls_back_after_background_finished() {
        let loader = CatalogLoader::new(Arc::new(Scripted::new(vec![vec![]])));
        assert!(loader.current().is_empty());

        loader.background_finished.store(true, Ordering::Release);
        assert!(!loader.current().is_empty());
    }

    #[test]
    fn test_fallback_runs_once() {
        let provider = Arc::new(Empty::default());
        let loader = CatalogLoader::new(provider.clone());
        loader.background_finished.store(true, Ordering::Release);

        for _ in 0..10 {
            assert!(loader.current().is_empty());
        }
        assert_eq!(provider.listings.load(Ordering::SeqCst), 1);

        assert!(loader.load(true).unwrap().is_empty());
        assert_eq!(provider.listings.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_db_support_frozen_by_listing_even_if_load_fails() {
        let loader = CatalogLoader::new(Arc::new(BrokenSchemas));
        let err = loader.load(false).unwrap_err();

        assert!(matches!(err, CompletionError::CatalogUnavailable(_)));
        assert_eq!(loader.db_support(), Some(true));
        assert!(loader.snapshot().is_empty());
    }

    #[test]
    fn test_readers_never_see_a_partial_reload() {
        let (provider, entered, release) = Gated::new();
        let loader = Arc::new(CatalogLoader::new(Arc::new(provider)));

        release.send(()).unwrap();
        let old = loader.load(false).unwrap();
        entered.recv().unwrap();
        assert_eq!(old.stats().tables, 1);

        let reader = {
            let loader = Arc::clone(&loader);
            let old = Arc::clone(&old);
            thread::spawn(move || {
                let mut seen = vec![Arc::clone(&old)];
                loop {
                    let snapshot = loader.snapshot();
                    if let Some(last) = seen.last() {
                        if !Arc::ptr_eq(last, &snapshot) {
                            seen.push(Arc::clone(&snapshot));
                        }
                    }
                    if !Arc::ptr_eq(&snapshot, &old) {
                        return seen;
                    }
                    thread::yield_now();
                }
            })
        };
        let reloader = {
            let loader = Arc::clone(&loader);
            thread::spawn(move || loader.load(true))
        };

        entered.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(Arc::ptr_eq(&loader.snapshot(), &old));
        release.send(()).unwrap();

        let new = reloader.join().unwrap().unwrap();
        let seen = reader.join().unwrap();
        assert_eq!(new.stats().tables, 2);
        assert_eq!(seen.len(), 2);
        for snapshot in &seen {
            assert!(**snapshot == *old || **snapshot == *new);
        }
        assert!(Arc::ptr_eq(&loader.snapshot(), &new));
    }
}
