//! Deadline-bounded SQLite connection pool.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections and configure their pragmas.
//! - Run schema migrations once, before any connection is handed out.
//! - Lend connections to store calls, bounded by a per-call timeout.
//!
//! # Invariants
//! - In-memory pools hold exactly one connection (each in-memory connection
//!   is its own database).
//! - While a call holds a connection, SQLite busy waits and statement
//!   execution are both bounded by the call deadline.
//! - The progress handler is cleared before a connection returns to the pool.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::os::raw::c_int;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

/// Default number of connections for file-backed pools.
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Sleep between full scans of the pool while every slot is busy.
const ACQUIRE_BACKOFF: Duration = Duration::from_millis(2);
/// SQLite VM steps between deadline checks.
const PROGRESS_CHECK_STEPS: c_int = 1_000;

/// Where the pool's connections point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolMode {
    File(PathBuf),
    Memory,
}

impl PoolMode {
    fn label(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

/// Fixed-size pool of SQLite connections shared across request handlers.
///
/// Callers hold the pool behind an `Arc` and pass `&DbPool` into the store;
/// there is no process-global handle.
pub struct DbPool {
    mode: PoolMode,
    slots: Vec<Mutex<Connection>>,
    next_slot: AtomicUsize,
}

impl DbPool {
    /// Opens `size` connections to a SQLite file and applies pending
    /// migrations through the first one.
    ///
    /// # Side effects
    /// - Creates the database file when missing.
    /// - Switches the file to WAL journaling.
    /// - Emits `db_open` logging events with duration and status.
    pub fn open(path: impl AsRef<Path>, size: usize) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        let size = size.max(1);
        Self::open_with(PoolMode::File(path.clone()), size, || {
            Connection::open(&path)
        })
    }

    /// Opens a single-connection in-memory pool with migrations applied.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open_with(PoolMode::Memory, 1, Connection::open_in_memory)
    }

    fn open_with(
        mode: PoolMode,
        size: usize,
        connect: impl Fn() -> rusqlite::Result<Connection>,
    ) -> DbResult<Self> {
        let started_at = Instant::now();
        info!(
            "event=db_open module=db status=start mode={} pool_size={}",
            mode.label(),
            size
        );

        let result = (0..size)
            .map(|index| -> DbResult<Mutex<Connection>> {
                let mut conn = connect()?;
                bootstrap_connection(&mut conn, &mode, index == 0)?;
                Ok(Mutex::new(conn))
            })
            .collect::<DbResult<Vec<_>>>();

        match result {
            Ok(slots) => {
                info!(
                    "event=db_open module=db status=ok mode={} pool_size={} duration_ms={}",
                    mode.label(),
                    size,
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    mode,
                    slots,
                    next_slot: AtomicUsize::new(0),
                })
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                    mode.label(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Returns where this pool's connections point.
    pub fn mode(&self) -> &PoolMode {
        &self.mode
    }

    /// Returns the number of pooled connections.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Runs `op` on a pooled connection, bounded by `timeout`.
    ///
    /// The deadline covers waiting for a free connection, SQLite busy waits,
    /// and statement execution. Any of these running past it surfaces as
    /// `DbError::Timeout`. Errors `op` raises should be classified with
    /// `DbError::from_call_error`.
    pub fn with_connection<T, E>(
        &self,
        timeout: Duration,
        op: impl FnOnce(&Connection) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let deadline = Instant::now() + timeout;
        let conn = self.acquire(deadline)?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(DbError::Timeout.into());
        }
        conn.busy_timeout(remaining).map_err(DbError::from_call_error)?;
        conn.progress_handler(
            PROGRESS_CHECK_STEPS,
            Some(move || Instant::now() >= deadline),
        );

        let result = op(&*conn);

        conn.progress_handler(0, None::<fn() -> bool>);
        result
    }

    fn acquire(&self, deadline: Instant) -> DbResult<MutexGuard<'_, Connection>> {
        let len = self.slots.len();
        let start = self.next_slot.fetch_add(1, Ordering::Relaxed);

        loop {
            for offset in 0..len {
                match self.slots[(start + offset) % len].try_lock() {
                    Ok(guard) => return Ok(guard),
                    // A panic mid-call leaves the connection itself usable.
                    Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
                    Err(TryLockError::WouldBlock) => {}
                }
            }

            if Instant::now() >= deadline {
                return Err(DbError::Timeout);
            }
            std::thread::sleep(ACQUIRE_BACKOFF);
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, mode: &PoolMode, migrate: bool) -> DbResult<()> {
    if let PoolMode::File(_) = mode {
        // `journal_mode` returns a row, so it cannot go through execute_batch.
        let _: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    }
    conn.busy_timeout(Duration::from_secs(5))?;
    if migrate {
        apply_migrations(conn)?;
    }
    Ok(())
}
