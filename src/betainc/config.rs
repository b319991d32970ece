//! Lookup-table configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming the persisted table used by [`super::global`].
pub const TABLE_PATH_ENV: &str = "U_SIMNUM_BETAINC_TABLE";

/// Table resolution and persistence settings.
///
/// # Examples
/// ```
/// use u_simnum::betainc::TableConfig;
///
/// let config = TableConfig::new(200, 50, 4096.0).with_persist_path("/tmp/betainc.bin");
/// assert!(config.validate().is_ok());
/// assert!(TableConfig::new(1, 50, 4096.0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Number of samples along the `x` axis. Default: 256.
    pub n_interp: usize,
    /// Number of samples along the `dims` axis. Default: 64.
    pub n_dims: usize,
    /// Largest tabulated dimension; larger ones are extrapolated. Default: 4096.
    pub dims_max: f64,
    /// Where to persist the table after building and to load it from.
    /// Default: `None` (in-memory only).
    pub persist_path: Option<PathBuf>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            n_interp: 256,
            n_dims: 64,
            dims_max: 4096.0,
            persist_path: None,
        }
    }
}

impl TableConfig {
    /// In-memory configuration with the given resolution.
    pub fn new(n_interp: usize, n_dims: usize, dims_max: f64) -> Self {
        Self {
            n_interp,
            n_dims,
            dims_max,
            persist_path: None,
        }
    }

    pub fn with_persist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_path = Some(path.into());
        self
    }

    /// Default resolution, persisted at `$U_SIMNUM_BETAINC_TABLE` when set.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var_os(TABLE_PATH_ENV) {
            Some(path) if !path.is_empty() => config.with_persist_path(path),
            _ => config,
        }
    }

    /// Checks the resolution parameters.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] if `n_interp < 2`, `n_dims < 1`, or
    /// `dims_max` is not a finite value >= 1.
    pub fn validate(&self) -> Result<()> {
        if self.n_interp < 2 {
            return Err(Error::InvalidConfig {
                message: format!("n_interp must be >= 2, got {}", self.n_interp),
            });
        }
        if self.n_dims < 1 {
            return Err(Error::InvalidConfig {
                message: "n_dims must be >= 1, got 0".to_string(),
            });
        }
        if !self.dims_max.is_finite() || self.dims_max < 1.0 {
            return Err(Error::InvalidConfig {
                message: format!("dims_max must be finite and >= 1, got {}", self.dims_max),
            });
        }
        Ok(())
    }
}
