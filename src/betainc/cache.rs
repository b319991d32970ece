//! Process-lifetime holder for a lookup table.

use std::io;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use ndarray::{Array, ArrayBase, Data, Dimension};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::config::TableConfig;
use super::table::BetaIncInvTable;
use super::{validate_dims, DimsArg};
use crate::error::{Error, FormatError, Result};
use crate::special::inverse_regularized_incomplete_beta;

/// Exact inverse `reference(p, a, b) = I⁻¹_p(a, b)` used when building.
pub type Reference = fn(f64, f64, f64) -> f64;

/// Lazily initialised slot holding at most one [`BetaIncInvTable`].
///
/// The first lookup fills the slot: from `config.persist_path` when a
/// compatible table is stored there, otherwise by building one (and then
/// persisting it). The slot stays filled until [`reset`](Self::reset).
///
/// Initialisation runs under the slot lock, so concurrent first lookups
/// build once. Lookups clone an `Arc` to the table and interpolate outside
/// the lock.
#[derive(Debug)]
pub struct BetaIncInvCache {
    config: TableConfig,
    reference: Reference,
    slot: Mutex<Option<Arc<BetaIncInvTable>>>,
}

impl BetaIncInvCache {
    /// An empty cache using the bundled reference inverse.
    pub fn new(config: TableConfig) -> Self {
        Self::with_reference(config, inverse_regularized_incomplete_beta)
    }

    /// An empty cache that builds with `reference`.
    pub fn with_reference(config: TableConfig, reference: Reference) -> Self {
        Self {
            config,
            reference,
            slot: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Whether a table is currently held.
    pub fn is_resident(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Drops the held table; the next lookup initialises a fresh one.
    ///
    /// Returns `true` if a table was held.
    pub fn reset(&self) -> bool {
        let dropped = self.slot.lock().take().is_some();
        if dropped {
            debug!("betaincinv cache reset");
        }
        dropped
    }

    /// The held table, initialising the slot first if it is empty.
    ///
    /// # Errors
    /// Returns `Err` if the configuration is invalid or the reference
    /// misbehaves while building. Unusable persisted tables and persist
    /// failures are logged and do not fail initialisation.
    pub fn table(&self) -> Result<Arc<BetaIncInvTable>> {
        let mut slot = self.slot.lock();
        if let Some(table) = slot.as_ref() {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(self.initialize()?);
        *slot = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Builds a fresh table from the configuration and holds it, replacing
    /// any held table. Persists to `config.persist_path` when set.
    ///
    /// # Errors
    /// Returns `Err` if building or persisting fails; the slot is then left
    /// unchanged.
    pub fn build(&self) -> Result<Arc<BetaIncInvTable>> {
        let mut slot = self.slot.lock();
        let table = Arc::new(BetaIncInvTable::build_with(&self.config, self.reference)?);
        *slot = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Loads a table from `path` and holds it, replacing any held table.
    ///
    /// The loaded table is used as-is, even if its axes differ from the
    /// configuration.
    ///
    /// # Errors
    /// Returns [`Error::Format`] if the file is missing or invalid; the slot
    /// is then left unchanged.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<BetaIncInvTable>> {
        let table = Arc::new(BetaIncInvTable::load(path)?);
        *self.slot.lock() = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Holds `table`, replacing any held table.
    pub fn insert(&self, table: BetaIncInvTable) -> Arc<BetaIncInvTable> {
        let table = Arc::new(table);
        *self.slot.lock() = Some(Arc::clone(&table));
        table
    }

    /// Approximates `I⁻¹_x(dims/2, 1/2)` elementwise; see
    /// [`BetaIncInvTable::lookup`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidDims`] before touching the slot if `dims` is
    /// not an integer >= 1, or an initialisation error from
    /// [`table`](Self::table).
    pub fn lookup<D, S, Dim>(&self, dims: D, x: &ArrayBase<S, Dim>) -> Result<Array<f64, Dim>>
    where
        D: DimsArg,
        S: Data<Elem = f64>,
        Dim: Dimension,
    {
        let dims = validate_dims(dims)?;
        self.table()?.lookup(dims, x)
    }

    pub fn lookup_slice<D: DimsArg>(&self, dims: D, x: &[f64]) -> Result<Vec<f64>> {
        let dims = validate_dims(dims)?;
        self.table()?.lookup_slice(dims, x)
    }

    pub fn lookup_scalar<D: DimsArg>(&self, dims: D, x: f64) -> Result<f64> {
        let dims = validate_dims(dims)?;
        self.table()?.lookup_scalar(dims, x)
    }

    fn initialize(&self) -> Result<BetaIncInvTable> {
        if let Some(path) = &self.config.persist_path {
            match BetaIncInvTable::load(path) {
                Ok(table) if table.matches(&self.config) => {
                    debug!("betaincinv cache filled from {}", path.display());
                    return Ok(table);
                }
                Ok(_) => warn!(
                    "persisted betaincinv table at {} was built with different parameters, rebuilding",
                    path.display()
                ),
                Err(Error::Format(FormatError::Unreadable { source, .. }))
                    if source.kind() == io::ErrorKind::NotFound =>
                {
                    info!("no persisted betaincinv table at {}, building", path.display());
                }
                Err(e) => warn!("ignoring persisted betaincinv table: {}, rebuilding", e),
            }
        }

        let table = BetaIncInvTable::compute(&self.config, self.reference)?;
        if let Some(path) = &self.config.persist_path {
            if let Err(e) = table.save(path) {
                warn!(
                    "failed to persist betaincinv table to {}: {}",
                    path.display(),
                    e
                );
            }
        }
        Ok(table)
    }
}

// ============================================================================
// Process-wide instance
// ============================================================================

static GLOBAL: OnceLock<BetaIncInvCache> = OnceLock::new();

/// The process-wide cache, configured by [`TableConfig::from_env`] on first
/// use.
pub fn global() -> &'static BetaIncInvCache {
    GLOBAL.get_or_init(|| BetaIncInvCache::new(TableConfig::from_env()))
}

/// [`BetaIncInvCache::lookup`] on the process-wide cache.
///
/// # Examples
/// ```
/// use ndarray::array;
/// use u_simnum::betainc;
///
/// let y = betainc::lookup(3, &array![0.1, 0.5, 0.9]).unwrap();
/// assert!(y[0] < y[1] && y[1] < y[2]);
/// assert!(betainc::lookup(2.2, &array![0.5]).is_err());
/// ```
pub fn lookup<D, S, Dim>(dims: D, x: &ArrayBase<S, Dim>) -> Result<Array<f64, Dim>>
where
    D: DimsArg,
    S: Data<Elem = f64>,
    Dim: Dimension,
{
    global().lookup(dims, x)
}
