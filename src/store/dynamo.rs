use std::{collections::HashMap, future::Future};

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::{
    config::Region,
    error::DisplayErrorContext,
    types::{AttributeValue, ReturnValue},
    Client,
};
use serde_json::{Number, Value};
use tracing::info;

use super::{record_id, Record, RecordStore, StoreError, PARTITION_KEY};
use crate::config::TableConfig;

type Item = HashMap<String, AttributeValue>;

pub struct DynamoTable {
    client: Client,
    table_name: String,
}

impl DynamoTable {
    /// Builds a client for the configured region and confirms the table exists.
    pub async fn connect(config: &TableConfig) -> Result<Self, StoreError> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        let client = Client::new(&sdk_config);

        let described = client
            .describe_table()
            .table_name(&config.name)
            .send()
            .await
            .map_err(|err| StoreError::Unavailable {
                table: config.name.clone(),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        let status = described
            .table()
            .and_then(|table| table.table_status())
            .map(|status| status.as_str().to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        info!(table = %config.name, region = %config.region, status = %status, "table handle acquired");

        Ok(Self {
            client,
            table_name: config.name.clone(),
        })
    }

    fn request_error(&self, operation: &'static str, message: String) -> StoreError {
        StoreError::Request {
            operation,
            table: self.table_name.clone(),
            message,
        }
    }
}

#[async_trait]
impl RecordStore for DynamoTable {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(PARTITION_KEY, AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|err| self.request_error("GetItem", DisplayErrorContext(&err).to_string()))?;

        output.item().map(item_to_record).transpose()
    }

    async fn put(&self, record: Record) -> Result<(), StoreError> {
        record_id(&record)?;
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .map_err(|err| self.request_error("PutItem", DisplayErrorContext(&err).to_string()))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(PARTITION_KEY, AttributeValue::S(id.to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|err| {
                self.request_error("DeleteItem", DisplayErrorContext(&err).to_string())
            })?;

        Ok(output.attributes().is_some_and(|old| !old.is_empty()))
    }

    async fn list(&self, limit: usize) -> Result<Vec<Record>, StoreError> {
        collect_pages(limit, move |remaining, start_key| {
            self.scan_page(remaining, start_key)
        })
        .await
    }
}

impl DynamoTable {
    async fn scan_page(
        &self,
        remaining: usize,
        start_key: Option<Item>,
    ) -> Result<ScanPage, StoreError> {
        let output = self
            .client
            .scan()
            .table_name(&self.table_name)
            .limit(i32::try_from(remaining).unwrap_or(i32::MAX))
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(|err| self.request_error("Scan", DisplayErrorContext(&err).to_string()))?;

        Ok(ScanPage {
            records: output
                .items()
                .iter()
                .map(item_to_record)
                .collect::<Result<_, _>>()?,
            last_key: output
                .last_evaluated_key()
                .filter(|key| !key.is_empty())
                .cloned(),
        })
    }
}

struct ScanPage {
    records: Vec<Record>,
    last_key: Option<Item>,
}

/// Follows `LastEvaluatedKey` until `limit` records are gathered; Scan stops early at 1 MB.
async fn collect_pages<F, Fut>(limit: usize, mut fetch: F) -> Result<Vec<Record>, StoreError>
where
    F: FnMut(usize, Option<Item>) -> Fut,
    Fut: Future<Output = Result<ScanPage, StoreError>>,
{
    let mut records = Vec::new();
    let mut start_key = None;

    while records.len() < limit {
        let page = fetch(limit - records.len(), start_key.take()).await?;
        records.extend(page.records);
        match page.last_key {
            Some(key) => start_key = Some(key),
            None => break,
        }
    }

    records.truncate(limit);
    Ok(records)
}

pub fn record_to_item(record: Record) -> Item {
    record
        .into_iter()
        .map(|(key, value)| (key, json_to_attribute(value)))
        .collect()
}

pub fn item_to_record(item: &Item) -> Result<Record, StoreError> {
    item.iter()
        .map(|(key, value)| Ok((key.clone(), attribute_to_json(key, value)?)))
        .collect()
}

fn json_to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(flag) => AttributeValue::Bool(flag),
        Value::Number(number) => AttributeValue::N(number.to_string()),
        Value::String(text) => AttributeValue::S(text),
        Value::Array(values) => {
            AttributeValue::L(values.into_iter().map(json_to_attribute).collect())
        }
        Value::Object(map) => AttributeValue::M(record_to_item(map)),
    }
}

fn attribute_to_json(key: &str, value: &AttributeValue) -> Result<Value, StoreError> {
    let converted = match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(flag) => Value::Bool(*flag),
        AttributeValue::S(text) => Value::String(text.clone()),
        AttributeValue::N(number) => Value::Number(parse_number(key, number)?),
        AttributeValue::Ss(texts) => texts.iter().cloned().map(Value::String).collect(),
        AttributeValue::Ns(numbers) => numbers
            .iter()
            .map(|number| parse_number(key, number).map(Value::Number))
            .collect::<Result<Value, _>>()?,
        AttributeValue::L(values) => values
            .iter()
            .map(|value| attribute_to_json(key, value))
            .collect::<Result<Value, _>>()?,
        AttributeValue::M(map) => Value::Object(item_to_record(map)?),
        _ => return Err(StoreError::UnsupportedAttribute(key.to_string())),
    };
    Ok(converted)
}

fn parse_number(key: &str, number: &str) -> Result<Number, StoreError> {
    number
        .parse::<Number>()
        .map_err(|_| StoreError::UnsupportedAttribute(key.to_string()))
}
