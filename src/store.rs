//! Record storage.
//!
//! [`RecordStore`] is the only shared mutable state in the crate. Every write
//! is atomic with respect to readers: a record is either fully visible or not
//! there at all.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use serde_json::{Map, Value};

pub type RecordId = u64;

/// Field name → value. Always a JSON object.
pub type Fields = Map<String, Value>;

/// Equality filters: field name → expected value.
pub type Filters = BTreeMap<String, String>;

/// A stored entity. Serializes flat: `{"id": 1, "name": "John", …}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// The flat JSON object a client sees.
    pub fn to_json(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert("id".to_owned(), Value::from(self.id));
        object.extend(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Value::Object(object)
    }

    /// `true` when every filter names a field this record has with an equal
    /// value. Strings compare verbatim; numbers and booleans by their JSON
    /// text. `null` and missing fields never match.
    pub fn matches(&self, filters: &Filters) -> bool {
        filters.iter().all(|(field, expected)| {
            if field == "id" {
                return self.id.to_string() == *expected;
            }
            match self.fields.get(field) {
                Some(Value::String(s)) => s == expected,
                Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string() == *expected,
                _ => false,
            }
        })
    }
}

/// Persistence behind a resource.
///
/// Implementations must serialize conflicting writes. Iteration order is
/// insertion order.
pub trait RecordStore: Send + Sync + 'static {
    /// Stores `fields` under a fresh id.
    fn insert(&self, fields: Fields) -> Record;

    fn get(&self, id: RecordId) -> Option<Record>;

    /// Records matching every filter, in insertion order.
    fn filter(&self, filters: &Filters) -> Vec<Record>;

    /// Swaps the fields of an existing record. `None` if `id` is unknown.
    fn replace(&self, id: RecordId, fields: Fields) -> Option<Record>;

    /// Removes and returns a record. `None` if `id` is unknown.
    fn remove(&self, id: RecordId) -> Option<Record>;
}

/// In-process store backed by an ordered map under a `RwLock`.
///
/// Ids start at 1, grow monotonically, and are never reused, so map order
/// equals insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: RecordId,
    records: BTreeMap<RecordId, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read(|inner| inner.records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave a half-written record
    // behind (every write is a single map operation), so poisoning is ignored.
    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> T {
        f(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        f(&mut self.inner.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, fields: Fields) -> Record {
        self.write(|inner| {
            inner.last_id += 1;
            let record = Record { id: inner.last_id, fields };
            inner.records.insert(record.id, record.clone());
            record
        })
    }

    fn get(&self, id: RecordId) -> Option<Record> {
        self.read(|inner| inner.records.get(&id).cloned())
    }

    fn filter(&self, filters: &Filters) -> Vec<Record> {
        self.read(|inner| {
            inner
                .records
                .values()
                .filter(|r| r.matches(filters))
                .cloned()
                .collect()
        })
    }

    fn replace(&self, id: RecordId, fields: Fields) -> Option<Record> {
        self.write(|inner| {
            let record = inner.records.get_mut(&id)?;
            record.fields = fields;
            Some(record.clone())
        })
    }

    fn remove(&self, id: RecordId) -> Option<Record> {
        self.write(|inner| inner.records.remove(&id))
    }
}
