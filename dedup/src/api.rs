use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestResponseStatus {
    Success,
    Redundant,
    Error,
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct IngestResponse {
    pub status: IngestResponseStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl IngestResponse {
    pub fn success(hash: String) -> Self {
        IngestResponse {
            status: IngestResponseStatus::Success,
            message: String::from("Unique data has been successfully added."),
            hash: Some(hash),
        }
    }

    pub fn redundant() -> Self {
        IngestResponse {
            status: IngestResponseStatus::Redundant,
            message: String::from("This exact data already exists in the database."),
            hash: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to parse request: {0}")]
    RequestParsingError(#[from] serde_json::Error),
    #[error("invalid or missing data: 'name' and 'email' are required")]
    InvalidRecord,
    #[error("failed to add data to the database")]
    StorageFailure,
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = match self {
            IngestError::RequestParsingError(_) | IngestError::InvalidRecord => {
                StatusCode::BAD_REQUEST
            }
            IngestError::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = IngestResponse {
            status: IngestResponseStatus::Error,
            message: self.to_string(),
            hash: None,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_response_carries_hash() {
        let response = IngestResponse::success(String::from("abc123"));
        let serialized = serde_json::to_value(&response).unwrap();

        assert_eq!(serialized["status"], json!("success"));
        assert_eq!(serialized["hash"], json!("abc123"));
    }

    #[test]
    fn redundant_response_omits_hash() {
        let response = IngestResponse::redundant();
        let serialized = serde_json::to_value(&response).unwrap();

        assert_eq!(serialized["status"], json!("redundant"));
        assert!(serialized.get("hash").is_none());
    }
}
