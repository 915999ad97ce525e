//! `;`-delimited record table keyed by member id.
//!
//! Rows are only ever appended. The whole table is rewritten on `persist()`
//! through a temp file + rename, so a crash leaves the previous version intact.

use crate::error::ScrapeError;
use crate::models::{COLUMNS, MemberId, MemberRecord, MemberRow};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DELIMITER: u8 = b';';

pub struct RecordStore {
    path: PathBuf,
    rows: Vec<MemberRow>,
    ids: HashSet<MemberId>,
}

impl RecordStore {
    /// Load the table at `path`, or start empty if it does not exist yet.
    pub fn open(path: &Path) -> Result<Self, ScrapeError> {
        let mut store = Self {
            path: path.to_path_buf(),
            rows: Vec::new(),
            ids: HashSet::new(),
        };

        if !path.exists() {
            info!("No record table at {:?}, starting empty", path);
            return Ok(store);
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(true)
            .from_path(path)?;

        for result in reader.deserialize::<MemberRow>() {
            let row = result?;
            if store.ids.insert(row.id.clone()) {
                store.rows.push(row);
            } else {
                debug!("Duplicate row for id {} in {:?}, keeping the first", row.id, path);
            }
        }

        info!("Loaded {} records from {:?}", store.rows.len(), path);
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: &MemberId) -> bool {
        self.ids.contains(id)
    }

    pub fn rows(&self) -> &[MemberRow] {
        &self.rows
    }

    /// Append a record. Returns `false` (and changes nothing) if its id is already stored.
    pub fn append(&mut self, record: &MemberRecord) -> bool {
        if self.ids.contains(record.id()) {
            info!("ID {} already in table, skipping", record.id());
            return false;
        }
        self.ids.insert(record.id().clone());
        self.rows.push(MemberRow::from(record));
        true
    }

    /// Write the full table, header first, in [`COLUMNS`] order.
    pub fn persist(&self) -> Result<(), ScrapeError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(DELIMITER)
                .has_headers(false)
                .from_path(&tmp)?;
            writer.write_record(COLUMNS)?;
            for row in &self.rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!("Saved {} records to {:?}", self.rows.len(), self.path);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
