//! Memoized backend selection.
//!
//! # Responsibility
//! - Attempt to open the structured backend exactly once per selector.
//! - Fall back to the document store when SQLite cannot be used.
//!
//! # Invariants
//! - Concurrent first callers trigger a single open attempt; every caller
//!   observes the same resolved backend.
//! - Selection never fails: an unavailable structured backend resolves to
//!   `StoreHandle::Fallback`.
//! - The selector is an owned value; there is no process-global handle.

use super::{DocumentItemStore, ItemStore, SqliteItemStore};
use crate::config::CoreConfig;
use crate::db::{DbError, DbResult};
use log::{info, warn};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Resolved backend handle.
#[derive(Clone)]
pub enum StoreHandle {
    Structured(Arc<SqliteItemStore>),
    /// Sentinel meaning "use the document fallback".
    Fallback,
}

impl StoreHandle {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Structured(_) => BackendKind::Structured,
            Self::Fallback => BackendKind::Fallback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Structured,
    Fallback,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "sqlite",
            Self::Fallback => "document",
        }
    }
}

struct ResolvedBackend {
    handle: StoreHandle,
    store: Arc<dyn ItemStore>,
}

/// Lazily resolves the item store once and hands out shared references.
pub struct BackendSelector {
    db_path: Option<PathBuf>,
    fallback_dir: PathBuf,
    open_attempts: AtomicUsize,
    resolved: OnceCell<ResolvedBackend>,
}

impl BackendSelector {
    /// `db_path = None` means the platform lacks the structured backend.
    pub fn new(db_path: Option<PathBuf>, fallback_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_path,
            fallback_dir: fallback_dir.into(),
            open_attempts: AtomicUsize::new(0),
            resolved: OnceCell::new(),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.resolved_db_path(), config.data_dir.clone())
    }

    /// Returns the structured handle, or `Fallback`. Never fails.
    pub fn acquire_store(&self) -> StoreHandle {
        self.resolve().handle.clone()
    }

    /// Returns the item store for whichever backend was selected.
    pub fn item_store(&self) -> Arc<dyn ItemStore> {
        Arc::clone(&self.resolve().store)
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.resolve().handle.kind()
    }

    /// Number of structured-backend open attempts made so far.
    pub fn open_attempts(&self) -> usize {
        self.open_attempts.load(Ordering::SeqCst)
    }

    fn resolve(&self) -> &ResolvedBackend {
        self.resolved.get_or_init(|| self.select_backend())
    }

    fn select_backend(&self) -> ResolvedBackend {
        let started_at = Instant::now();
        match self.open_structured() {
            Ok(store) => {
                info!(
                    "event=backend_select module=store status=ok backend=sqlite duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                let store = Arc::new(store);
                ResolvedBackend {
                    handle: StoreHandle::Structured(Arc::clone(&store)),
                    store,
                }
            }
            Err(err) => {
                warn!(
                    "event=backend_select module=store status=fallback backend=document dir={} duration_ms={} reason={}",
                    self.fallback_dir.display(),
                    started_at.elapsed().as_millis(),
                    err
                );
                ResolvedBackend {
                    handle: StoreHandle::Fallback,
                    store: Arc::new(DocumentItemStore::new(self.fallback_dir.clone())),
                }
            }
        }
    }

    fn open_structured(&self) -> DbResult<SqliteItemStore> {
        let Some(path) = self.db_path.as_ref() else {
            return Err(DbError::BackendUnavailable(
                "no database path configured".to_string(),
            ));
        };
        self.open_attempts.fetch_add(1, Ordering::SeqCst);
        SqliteItemStore::open(path)
    }
}
