use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;

use super::{record_id, Record, RecordStore, StoreError};

/// Process-local table, used for local development and tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    table_name: String,
    records: Mutex<BTreeMap<String, Record>>,
}

impl InMemoryStore {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            records: Mutex::new(BTreeMap::new()),
        }
    }

    fn with_records<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, Record>) -> T,
    ) -> Result<T, StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&mut records))
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        self.with_records(|records| records.get(id).cloned())
    }

    async fn put(&self, record: Record) -> Result<(), StoreError> {
        let id = record_id(&record)?.to_string();
        self.with_records(|records| {
            records.insert(id, record);
        })
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.with_records(|records| records.remove(id).is_some())
    }

    async fn list(&self, limit: usize) -> Result<Vec<Record>, StoreError> {
        self.with_records(|records| records.values().take(limit).cloned().collect())
    }
}
