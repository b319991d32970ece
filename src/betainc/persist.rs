//! On-disk format for lookup tables.
//!
//! File format:
//! - Header: magic bytes `b"BIT2"`, version `u8`
//! - Body: bincode-serialized `{ dims: Vec<f64>, x: Vec<f64>, values: Vec<f64> }`,
//!   values in row-major order
//! - Footer: xxhash64 checksum of all preceding bytes, little endian
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! reader never observes a half-written table.

use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::table::BetaIncInvTable;
use crate::error::{Error, FormatError, Result};

/// Magic bytes opening every table file.
pub const TABLE_MAGIC: [u8; 4] = *b"BIT2";

/// Current format version.
pub const TABLE_VERSION: u8 = 1;

const HEADER_LEN: usize = TABLE_MAGIC.len() + 1;
const FOOTER_LEN: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
struct TableFile {
    dims: Vec<f64>,
    x: Vec<f64>,
    values: Vec<f64>,
}

fn encode(file: &TableFile) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.extend_from_slice(&TABLE_MAGIC);
    data.push(TABLE_VERSION);

    let body = bincode::serialize(file).map_err(|e| {
        error!("betaincinv table serialization failed: {}", e);
        Error::Serialization {
            message: format!("bincode serialization failed: {}", e),
        }
    })?;
    data.extend_from_slice(&body);

    let checksum = xxhash_rust::xxh64::xxh64(&data, 0);
    data.extend_from_slice(&checksum.to_le_bytes());
    Ok(data)
}

impl BetaIncInvTable {
    /// Serializes the table into the persisted file format.
    ///
    /// # Errors
    /// Returns [`Error::Serialization`] if bincode fails to encode the body.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(&TableFile {
            dims: self.dims.clone(),
            x: self.x.clone(),
            values: self.values.iter().copied().collect(),
        })
    }

    /// Parses and validates a table from the persisted file format.
    ///
    /// # Errors
    /// Returns [`Error::Format`] if the bytes are truncated, carry the wrong
    /// magic or version, fail the checksum, or describe an inconsistent table.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let min_len = HEADER_LEN + FOOTER_LEN;
        if data.len() < min_len {
            return Err(FormatError::Truncated {
                needed: min_len,
                available: data.len(),
            }
            .into());
        }
        if data[..TABLE_MAGIC.len()] != TABLE_MAGIC {
            return Err(FormatError::BadMagic.into());
        }
        let version = data[TABLE_MAGIC.len()];
        if version != TABLE_VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: version,
                supported: TABLE_VERSION,
            }
            .into());
        }

        let checksum_offset = data.len() - FOOTER_LEN;
        let mut footer = [0u8; FOOTER_LEN];
        footer.copy_from_slice(&data[checksum_offset..]);
        let stored = u64::from_le_bytes(footer);
        let computed = xxhash_rust::xxh64::xxh64(&data[..checksum_offset], 0);
        if stored != computed {
            return Err(FormatError::ChecksumMismatch { stored, computed }.into());
        }

        let file: TableFile = bincode::deserialize(&data[HEADER_LEN..checksum_offset])
            .map_err(|e| FormatError::Decode(e.to_string()))?;

        let (n_dims, n_interp) = (file.dims.len(), file.x.len());
        let actual = file.values.len();
        let values = Array2::from_shape_vec((n_dims, n_interp), file.values).map_err(|_| {
            FormatError::ShapeMismatch {
                n_dims,
                n_interp,
                actual,
            }
        })?;
        Self::from_parts(file.dims, file.x, values)
    }

    /// Writes the table to `path` atomically, creating parent directories.
    ///
    /// # Errors
    /// Returns [`Error::Serialization`] if the table cannot be encoded, or
    /// [`Error::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = self.to_bytes()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &data).map_err(|e| {
            error!("betaincinv table write to {} failed: {}", temp_path.display(), e);
            e
        })?;
        fs::rename(&temp_path, path).map_err(|e| {
            error!("betaincinv table rename to {} failed: {}", path.display(), e);
            e
        })?;

        info!("saved betaincinv table ({} bytes) to {}", data.len(), path.display());
        Ok(())
    }

    /// Reads a table previously written by [`save`](Self::save).
    ///
    /// # Errors
    /// Returns [`Error::Format`] if the file is missing, unreadable,
    /// truncated, corrupted, or inconsistent.
    ///
    /// # Examples
    /// ```
    /// use u_simnum::betainc::{BetaIncInvTable, TableConfig};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let path = dir.path().join("betainc.bin");
    /// let config = TableConfig::new(32, 6, 64.0).with_persist_path(&path);
    /// let built = BetaIncInvTable::build(&config).unwrap();
    /// let loaded = BetaIncInvTable::load(&path).unwrap();
    /// assert_eq!(loaded, built);
    /// assert!(BetaIncInvTable::load(dir.path().join("missing.bin")).is_err());
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| FormatError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_bytes(&data)?;
        info!(
            "loaded betaincinv table ({} dims x {} x samples) from {}",
            table.dims.len(),
            table.x.len(),
            path.display()
        );
        Ok(table)
    }
}
