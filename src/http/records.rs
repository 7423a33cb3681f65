//! The `/animal/data` resource family
//!
//! Records pass through to the table handle untouched apart from the `id` key.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    auth,
    errors::AppError,
    store::{Record, PARTITION_KEY},
    AppState,
};

pub const RECORDS_PREFIX: &str = "/animal/data";
pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const MAX_LIST_LIMIT: usize = 1_000;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecordList {
    pub items: Vec<Record>,
    pub count: usize,
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(RECORDS_PREFIX, get(list_records).post(create_record))
        .route(
            &format!("{RECORDS_PREFIX}/{{id}}"),
            get(get_record).delete(delete_record),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_api_key,
        ))
}

pub async fn list_records(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<RecordList>, AppError> {
    let limit = params
        .ok()
        .map(|Query(params)| params.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .filter(|limit| (1..=MAX_LIST_LIMIT).contains(limit))
        .ok_or_else(|| {
            AppError::bad_request("invalid_limit", "limit must be between 1 and 1000")
        })?;

    let items = state.store.list(limit).await?;
    Ok(Json(RecordList {
        count: items.len(),
        items,
    }))
}

pub async fn create_record(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), AppError> {
    let Json(body) = body.map_err(|rejection| match rejection {
        JsonRejection::MissingJsonContentType(_) => AppError::unsupported_media_type(
            "invalid_content_type",
            "expected Content-Type: application/json",
        ),
        _ => AppError::bad_request("invalid_record", "request body must be valid JSON"),
    })?;
    let Value::Object(mut record) = body else {
        return Err(AppError::bad_request(
            "invalid_record",
            "record must be a JSON object",
        ));
    };

    match record.get(PARTITION_KEY) {
        None => {
            record.insert(
                PARTITION_KEY.to_string(),
                Value::String(Uuid::new_v4().to_string()),
            );
        }
        Some(Value::String(id)) if !id.is_empty() => {}
        Some(_) => {
            return Err(AppError::bad_request(
                "invalid_record",
                "id must be a non-empty string",
            ))
        }
    }

    state.store.put(record.clone()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record>, AppError> {
    state
        .store
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(record_not_found)
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.store.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(record_not_found())
    }
}

fn record_not_found() -> AppError {
    AppError::not_found("record_not_found", "record not found")
}
