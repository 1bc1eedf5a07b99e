//! HTTP handlers for `/health` and the `/v1/{collection}` record API.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::auth::error_response;
use super::config::AuthClient;
use super::storage::ServerStorageError;
use super::AppState;

const DEFAULT_OWNER_KEY: &str = "owner_id";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn storage_error(err: ServerStorageError) -> Response {
    if err.is_client_error() {
        error_response(StatusCode::BAD_REQUEST, "invalid_request", err.to_string())
    } else {
        tracing::error!(error = %err, "Storage failure");
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
            "Failed to access record storage",
        )
    }
}

/// `PUT /v1/{collection}/{id}`: insert or replace a record.
pub async fn put_record(
    State(state): State<AppState>,
    Extension(client): Extension<AuthClient>,
    Path((collection, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let record = match body {
        Ok(Json(Value::Object(record))) => record,
        Ok(Json(_)) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_body",
                "Request body must be a JSON object",
            );
        }
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text());
        }
    };

    match record.get("id").and_then(Value::as_str) {
        Some(body_id) if body_id == id => {}
        Some(body_id) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "id_mismatch",
                format!("Body id '{}' does not match path id '{}'", body_id, id),
            );
        }
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "id_mismatch",
                "Request body must carry the record id",
            );
        }
    }

    match state.storage.upsert(&collection, &id, record).await {
        Ok(stored) => {
            tracing::debug!(client = %client.name, collection = %collection, id = %id, "Upserted record");
            Json(Value::Object(stored)).into_response()
        }
        Err(e) => storage_error(e),
    }
}

/// `DELETE /v1/{collection}/{id}`: 204 when removed, 404 when absent.
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(client): Extension<AuthClient>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    match state.storage.delete(&collection, &id).await {
        Ok(true) => {
            tracing::debug!(client = %client.name, collection = %collection, id = %id, "Deleted record");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("No record '{}' in {}", id, collection),
        ),
        Err(e) => storage_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    owner_key: Option<String>,
    owner: Option<String>,
}

/// `GET /v1/{collection}?owner_key=&owner=`: records belonging to one owner.
pub async fn list_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> Response {
    let Some(owner) = query.owner else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "missing_owner",
            "Query parameter 'owner' is required",
        );
    };
    let owner_key = query.owner_key.as_deref().unwrap_or(DEFAULT_OWNER_KEY);

    match state
        .storage
        .query_by_owner(&collection, owner_key, &owner)
        .await
    {
        Ok(records) => Json(records).into_response(),
        Err(e) => storage_error(e),
    }
}
