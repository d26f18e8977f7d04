//! Event-scoped key-value store.
//!
//! Everything the calibrator publishes for one event lands here, keyed by
//! runtime-generated names (`<base><variation>`). Two rules keep the store
//! safe despite the dynamic keys:
//!
//! - values are a discriminated `StoreObject`, so a key can never be read
//!   back as the wrong kind silently
//! - `record` rejects key collisions instead of overwriting; uniqueness of
//!   the generated names is the correctness mechanism
//!
//! Lifetime of anything recorded is exactly one event; the driver calls
//! `clear` between events.

use std::collections::HashMap;

use crate::domain::{EventInfo, TauJet};
use crate::edm::{AuxStore, TauView};
use crate::error::CalibError;

/// The kinds of object an event store can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreObject {
    /// An owning collection of taus (input or shallow copy).
    Taus(Vec<TauJet>),
    /// Auxiliary store of a shallow-copied collection.
    Aux(AuxStore),
    /// Non-owning, index-based view into an owning collection.
    View(TauView),
    /// An ordered list of names (the per-event output manifest).
    Names(Vec<String>),
    /// Per-event bookkeeping record.
    Event(EventInfo),
}

impl StoreObject {
    fn kind(&self) -> &'static str {
        match self {
            StoreObject::Taus(_) => "tau collection",
            StoreObject::Aux(_) => "aux store",
            StoreObject::View(_) => "view",
            StoreObject::Names(_) => "name list",
            StoreObject::Event(_) => "event info",
        }
    }
}

/// Single-writer, event-scoped store.
#[derive(Debug, Default)]
pub struct EventStore {
    objects: HashMap<String, StoreObject>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an object under `key`. Ownership moves to the store.
    ///
    /// A key collision is an error; the existing object is left untouched.
    pub fn record(&mut self, key: impl Into<String>, obj: StoreObject) -> Result<(), CalibError> {
        let key = key.into();
        if self.objects.contains_key(&key) {
            return Err(CalibError::KeyCollision(key));
        }
        self.objects.insert(key, obj);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drop everything. Called between events.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Sorted key list, for diagnostics and store dumps.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.objects.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    fn get(&self, key: &str) -> Result<&StoreObject, CalibError> {
        self.objects
            .get(key)
            .ok_or_else(|| CalibError::MissingInput(key.to_string()))
    }

    fn wrong_kind(key: &str, expected: &'static str, found: &StoreObject) -> CalibError {
        CalibError::WrongKind {
            key: key.to_string(),
            expected,
            found: found.kind(),
        }
    }

    pub fn taus(&self, key: &str) -> Result<&[TauJet], CalibError> {
        match self.get(key)? {
            StoreObject::Taus(taus) => Ok(taus),
            other => Err(Self::wrong_kind(key, "tau collection", other)),
        }
    }

    pub fn aux(&self, key: &str) -> Result<&AuxStore, CalibError> {
        match self.get(key)? {
            StoreObject::Aux(aux) => Ok(aux),
            other => Err(Self::wrong_kind(key, "aux store", other)),
        }
    }

    pub fn view(&self, key: &str) -> Result<&TauView, CalibError> {
        match self.get(key)? {
            StoreObject::View(view) => Ok(view),
            other => Err(Self::wrong_kind(key, "view", other)),
        }
    }

    pub fn names(&self, key: &str) -> Result<&[String], CalibError> {
        match self.get(key)? {
            StoreObject::Names(names) => Ok(names),
            other => Err(Self::wrong_kind(key, "name list", other)),
        }
    }

    pub fn event_info(&self, key: &str) -> Result<EventInfo, CalibError> {
        match self.get(key)? {
            StoreObject::Event(info) => Ok(*info),
            other => Err(Self::wrong_kind(key, "event info", other)),
        }
    }
}
