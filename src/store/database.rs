//! Database handle
//!
//! Single writer, snapshot readers:
//! - The committed state is an `Arc<Snapshot>` swapped atomically on commit
//! - Readers clone the current `Arc` and never block the writer for longer
//!   than that clone
//! - At most one write transaction exists at a time (writer lock); a thread
//!   that already holds it is refused instead of waiting on itself

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::thread::{self, ThreadId};

use uuid::Uuid;

use super::snapshot::Snapshot;
use super::transaction::WriteTransaction;
use crate::config::DatabaseConfig;
use crate::errors::{DbError, DbResult};
use crate::observability::{Logger, QueryMetrics, Severity};
use crate::query::{Query, Results};
use crate::schema::SchemaRegistry;

struct Shared {
    id: Uuid,
    config: DatabaseConfig,
    schema: Arc<SchemaRegistry>,
    committed: RwLock<Arc<Snapshot>>,
    writer: WriterLock,
    metrics: QueryMetrics,
}

/// Writer lock plus the thread currently holding it
#[derive(Debug)]
struct WriterLock {
    lock: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
}

impl WriterLock {
    fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            owner: Mutex::new(None),
        }
    }

    fn owner(&self) -> DbResult<MutexGuard<'_, Option<ThreadId>>> {
        self.owner
            .lock()
            .map_err(|_| DbError::invalid_state("Writer lock poisoned"))
    }

    fn acquire(&self) -> DbResult<WriterGuard<'_>> {
        let current = thread::current().id();
        if *self.owner()? == Some(current) {
            return Err(DbError::invalid_state(
                "A write transaction is already open on this thread",
            ));
        }
        let guard = self
            .lock
            .lock()
            .map_err(|_| DbError::invalid_state("Writer lock poisoned"))?;
        *self.owner()? = Some(current);
        Ok(WriterGuard {
            writer: self,
            _guard: guard,
        })
    }
}

/// Held by the active write transaction; releases ownership before the lock
#[derive(Debug)]
pub(crate) struct WriterGuard<'db> {
    writer: &'db WriterLock,
    _guard: MutexGuard<'db, ()>,
}

impl Drop for WriterGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut owner) = self.writer.owner.lock() {
            *owner = None;
        }
    }
}

/// Cheaply cloneable handle to one open database
#[derive(Clone)]
pub struct Database {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("id", &self.shared.id)
            .field("name", &self.shared.config.name)
            .finish()
    }
}

impl Database {
    /// Opens an empty in-memory database for a validated schema
    pub fn open(config: DatabaseConfig, schema: SchemaRegistry) -> DbResult<Self> {
        config
            .validate()
            .map_err(|e| DbError::invalid_argument(e.to_string()))?;
        schema.validate()?;

        let schema = Arc::new(schema);
        let snapshot = Snapshot::empty(Arc::clone(&schema));
        let db = Self {
            shared: Arc::new(Shared {
                id: Uuid::new_v4(),
                config,
                schema,
                committed: RwLock::new(Arc::new(snapshot)),
                writer: WriterLock::new(),
                metrics: QueryMetrics::new(),
            }),
        };

        let tables = db.shared.schema.len().to_string();
        db.log(
            Severity::Info,
            "DATABASE_OPEN",
            &[("name", db.name()), ("tables", &tables)],
        );
        Ok(db)
    }

    /// Instance identity, part of object equality
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.shared.config
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.shared.schema
    }

    pub(crate) fn schema_arc(&self) -> Arc<SchemaRegistry> {
        Arc::clone(&self.shared.schema)
    }

    pub fn metrics(&self) -> &QueryMetrics {
        &self.shared.metrics
    }

    /// Current committed snapshot
    pub fn snapshot(&self) -> DbResult<Arc<Snapshot>> {
        let guard = self
            .shared
            .committed
            .read()
            .map_err(|_| DbError::invalid_state("Snapshot lock poisoned"))?;
        Ok(Arc::clone(&guard))
    }

    /// Starts the single write transaction, waiting for one held by another
    /// thread. Fails with InvalidState if this thread already holds one.
    pub fn begin_write(&self) -> DbResult<WriteTransaction<'_>> {
        let guard = self.shared.writer.acquire()?;
        let staged = Snapshot::clone(&*self.snapshot()?);
        Ok(WriteTransaction::new(self, guard, staged))
    }

    /// Starts a query over every row of `table`
    pub fn query(&self, table: &str) -> DbResult<Query> {
        Query::new(self.clone(), table)
    }

    /// Every row of `table`, in table order
    pub fn all_objects(&self, table: &str) -> DbResult<Results> {
        self.query(table)?.find_all()
    }

    /// Publishes a staged snapshot, returning its version
    pub(crate) fn publish(&self, mut staged: Snapshot) -> DbResult<u64> {
        let mut guard = self
            .shared
            .committed
            .write()
            .map_err(|_| DbError::invalid_state("Snapshot lock poisoned"))?;
        let version = guard.version() + 1;
        staged.set_version(version);
        *guard = Arc::new(staged);
        Ok(version)
    }

    pub(crate) fn same_instance(&self, id: Uuid) -> bool {
        self.shared.id == id
    }

    /// Emits a structured event when event logging is enabled
    pub(crate) fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if self.shared.config.log_events {
            Logger::log(severity, event, fields);
        }
    }
}
