use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use metrics::counter;
use serde_json::Value;
use tracing::instrument;

use crate::api::{IngestError, IngestResponse};
use crate::fingerprint::fingerprint;
use crate::router;
use crate::validation::is_valid_record;

/// `POST /add-data`: parse, validate, fingerprint, dedup-check, insert.
///
/// Terminal states map 1:1 to responses: 400 bad payload or fields, 200
/// redundant, 201 created, 500 storage failure. No retries at this layer.
#[instrument(skip_all, fields(fingerprint))]
pub async fn add_data(
    state: State<router::State>,
    body: Bytes,
) -> Result<(StatusCode, Json<IngestResponse>), IngestError> {
    counter!("dedup_requests_received_total").increment(1);

    let record: Value = serde_json::from_slice(&body).map_err(|err| {
        counter!("dedup_records_rejected_total", &[("reason", "bad_payload")]).increment(1);
        err
    })?;

    if !is_valid_record(&record) {
        counter!("dedup_records_rejected_total", &[("reason", "invalid_fields")]).increment(1);
        return Err(IngestError::InvalidRecord);
    }

    let hash = fingerprint(&record);
    tracing::Span::current().record("fingerprint", hash.as_str());

    if state.store.exists(&hash).await {
        tracing::debug!("record already present, nothing to do");
        counter!("dedup_records_redundant_total").increment(1);
        return Ok((StatusCode::OK, Json(IngestResponse::redundant())));
    }

    if !state.store.insert(&hash, &record).await {
        counter!("dedup_records_dropped_total").increment(1);
        return Err(IngestError::StorageFailure);
    }

    counter!("dedup_records_created_total").increment(1);
    Ok((StatusCode::CREATED, Json(IngestResponse::success(hash))))
}
