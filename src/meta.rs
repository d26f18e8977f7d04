//! Run-level metadata store.
//!
//! Unlike the event store, entries here live for the whole run. It holds the
//! systematic-name list the calibrator chose at initialization (under
//! `taus_Syst<algo-name>`) and, when requested, a descriptive record of the
//! variation list for bookkeeping. Same collision discipline as the event
//! store: keys are never overwritten.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CalibError;

/// Descriptive record of the variations one algorithm ran with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystematicsRecord {
    pub algo: String,
    pub variations: Vec<String>,
}

/// Keyed name lists plus descriptive records, run lifetime.
#[derive(Debug, Default)]
pub struct MetaStore {
    names: HashMap<String, Vec<String>>,
    records: Vec<SystematicsRecord>,
}

impl MetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a name list; a key collision is an error.
    pub fn record_names(
        &mut self,
        key: impl Into<String>,
        names: Vec<String>,
    ) -> Result<(), CalibError> {
        let key = key.into();
        if self.names.contains_key(&key) {
            return Err(CalibError::KeyCollision(key));
        }
        self.names.insert(key, names);
        Ok(())
    }

    pub fn names(&self, key: &str) -> Option<&[String]> {
        self.names.get(key).map(Vec::as_slice)
    }

    pub fn add_record(&mut self, record: SystematicsRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[SystematicsRecord] {
        &self.records
    }
}
