//! Table handle abstraction backing the record routes
//!
//! Records are schemaless JSON objects keyed by a string `id`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{StoreBackend, TableConfig};

pub mod dynamo;
pub mod memory;

pub use dynamo::DynamoTable;
pub use memory::InMemoryStore;

pub const PARTITION_KEY: &str = "id";

pub type Record = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table name must be 3-255 characters of [A-Za-z0-9_.-], got {0:?}")]
    InvalidTableName(String),
    #[error("region must be non-empty lowercase letters, digits and dashes, got {0:?}")]
    InvalidRegion(String),
    #[error("table {table} is unavailable: {message}")]
    Unavailable { table: String, message: String },
    #[error("{operation} on table {table} failed: {message}")]
    Request {
        operation: &'static str,
        table: String,
        message: String,
    },
    #[error("attribute {0} has a type that cannot be represented as JSON")]
    UnsupportedAttribute(String),
    #[error("record is missing a string id")]
    MissingId,
    #[error("record store lock poisoned")]
    LockPoisoned,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    fn table_name(&self) -> &str;

    async fn get(&self, id: &str) -> Result<Option<Record>, StoreError>;

    async fn put(&self, record: Record) -> Result<(), StoreError>;

    /// Returns `false` when no record with `id` existed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn list(&self, limit: usize) -> Result<Vec<Record>, StoreError>;
}

/// Acquires the table handle named by the configuration.
pub async fn connect(config: &TableConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
    validate_table_name(&config.name)?;
    validate_region(&config.region)?;

    match config.backend {
        StoreBackend::DynamoDb => Ok(Arc::new(DynamoTable::connect(config).await?)),
        StoreBackend::Memory => Ok(Arc::new(InMemoryStore::new(config.name.clone()))),
    }
}

pub fn record_id(record: &Record) -> Result<&str, StoreError> {
    record
        .get(PARTITION_KEY)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(StoreError::MissingId)
}

fn validate_table_name(name: &str) -> Result<(), StoreError> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if !(3..=255).contains(&name.len()) || !valid_chars {
        return Err(StoreError::InvalidTableName(name.to_string()));
    }
    Ok(())
}

fn validate_region(region: &str) -> Result<(), StoreError> {
    let valid = !region.is_empty()
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if !valid {
        return Err(StoreError::InvalidRegion(region.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn table(name: &str, region: &str) -> TableConfig {
        TableConfig {
            name: name.to_string(),
            region: region.to_string(),
            endpoint: None,
            backend: StoreBackend::Memory,
        }
    }

    #[tokio::test]
    async fn connect_memory_backend() {
        let store = connect(&table("animal-happiness-data", "us-east-1"))
            .await
            .expect("store should connect");
        assert_eq!(store.table_name(), "animal-happiness-data");
    }

    #[tokio::test]
    async fn connect_rejects_bad_table_name() {
        let err = connect(&table("a b", "us-east-1"))
            .await
            .err()
            .expect("expected invalid table name");
        assert!(matches!(err, StoreError::InvalidTableName(_)));

        let err = connect(&table("ab", "us-east-1"))
            .await
            .err()
            .expect("expected invalid table name");
        assert!(matches!(err, StoreError::InvalidTableName(_)));
    }

    #[tokio::test]
    async fn connect_rejects_bad_region() {
        let err = connect(&table("animal-happiness-data", "US East"))
            .await
            .err()
            .expect("expected invalid region");
        assert!(matches!(err, StoreError::InvalidRegion(_)));
    }

    #[test]
    fn record_id_requires_non_empty_string() {
        let record = json!({"id": "cat-1"}).as_object().cloned().expect("object");
        assert_eq!(record_id(&record).expect("id"), "cat-1");

        let record = json!({"id": 7}).as_object().cloned().expect("object");
        assert!(matches!(record_id(&record), Err(StoreError::MissingId)));

        let record = json!({"id": ""}).as_object().cloned().expect("object");
        assert!(matches!(record_id(&record), Err(StoreError::MissingId)));
    }
}
