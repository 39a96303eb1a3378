//! I/O boundary traits for testability
//!
//! These traits abstract the part data source, allowing services
//! to be tested with in-memory implementations.

use std::fmt::Debug;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::domain::PartRecord;

/// Snapshot storage for part records.
pub trait BomStore: Send + Sync + Debug {
    /// Read every record. A store that was never written yields an empty list.
    fn load(&self) -> io::Result<Vec<PartRecord>>;

    /// Replace the stored snapshot with `records`.
    fn save(&self, records: &[PartRecord]) -> io::Result<()>;

    /// Human readable location for error messages.
    fn location(&self) -> String;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// JSON array of part records in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BomStore for JsonFileStore {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> io::Result<Vec<PartRecord>> {
        if !self.path.exists() {
            debug!("data file missing, starting empty");
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<PartRecord> = serde_json::from_str(&content)?;
        debug!("loaded {} records", records.len());
        Ok(records)
    }

    /// Write through a temp file in the same directory, then rename over the target.
    #[instrument(level = "debug", skip(self, records), fields(path = %self.path.display()))]
    fn save(&self, records: &[PartRecord]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, records)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!("saved {} records", records.len());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
