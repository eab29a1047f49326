//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::analysis;
use crate::error::{RoasError, RoasResult};
use crate::ingest::{self, check_size, ColumnReport, SourceFormat};
use crate::types::{AnalysisResult, ComparisonMode};

use super::server::AppState;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
            error_kind: None,
        }
    }

    pub fn from_error(error: &RoasError) -> Self {
        Self {
            error_kind: Some(error.kind().to_string()),
            ..Self::err(error.to_string())
        }
    }
}

/// HTTP status for a failed request
pub fn status_for(error: &RoasError) -> StatusCode {
    match error {
        RoasError::Io(e) if e.kind() == ErrorKind::NotFound => StatusCode::NOT_FOUND,
        RoasError::Io(_) | RoasError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        RoasError::StructuralParse(_) | RoasError::Schema { .. } | RoasError::RowValue { .. } => {
            StatusCode::BAD_REQUEST
        }
        RoasError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RoasError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        RoasError::SourceTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
    }
}

fn respond<T: Serialize>(result: RoasResult<T>) -> (StatusCode, Json<ApiResponse<T>>) {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "request failed");
            (status_for(&e), Json(ApiResponse::from_error(&e)))
        }
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

impl EndpointInfo {
    fn new(method: &str, path: &str, description: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        }
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "RoasLens API Server".to_string(),
        version: state.version.clone(),
        description: "ROAS change analysis for ad-platform spreadsheet exports".to_string(),
        endpoints: vec![
            EndpointInfo::new("GET", "/health", "Health check endpoint"),
            EndpointInfo::new("GET", "/version", "Get server version"),
            EndpointInfo::new(
                "POST",
                "/api/v1/analyze",
                "Analyze a report on the server's filesystem",
            ),
            EndpointInfo::new(
                "POST",
                "/api/v1/analyze/upload",
                "Analyze a report sent as the request body",
            ),
            EndpointInfo::new(
                "POST",
                "/api/v1/columns",
                "Show the resolved column mapping of a report",
            ),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_message: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec![
            "analyze".to_string(),
            "upload".to_string(),
            "columns".to_string(),
        ],
    }))
}

/// Analyze request
#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub file_path: String,
    #[serde(default)]
    pub mode: ComparisonMode,
}

/// POST /api/v1/analyze - Analyze a report by path
pub async fn analyze(Json(req): Json<AnalyzeRequest>) -> impl IntoResponse {
    let path = PathBuf::from(&req.file_path);
    respond(analysis::analyze_file(&path, req.mode).await)
}

/// Upload query parameters
#[derive(Deserialize, Default)]
pub struct UploadQuery {
    #[serde(default)]
    pub mode: ComparisonMode,
    /// Original file name; its extension picks the format when present
    pub filename: Option<String>,
}

/// POST /api/v1/analyze/upload - Analyze a report sent as the raw body
pub async fn analyze_upload(Query(query): Query<UploadQuery>, body: Bytes) -> impl IntoResponse {
    respond(analyze_upload_body(&query, &body))
}

fn analyze_upload_body(query: &UploadQuery, body: &[u8]) -> RoasResult<AnalysisResult> {
    check_size(body.len() as u64)?;
    let format = match &query.filename {
        Some(name) => SourceFormat::from_path(Path::new(name))?,
        None => SourceFormat::sniff(body),
    };
    let data = ingest::ingest_bytes(body, format)?;
    analysis::analyze(&data.records, query.mode)
}

/// Columns request
#[derive(Deserialize)]
pub struct ColumnsRequest {
    pub file_path: String,
}

/// Columns response
#[derive(Serialize)]
pub struct ColumnsResponse {
    pub file_path: String,
    #[serde(flatten)]
    pub report: ColumnReport,
}

/// POST /api/v1/columns - Resolve the column mapping of a report
///
/// Only headers are matched; malformed data rows do not fail the request.
pub async fn columns(Json(req): Json<ColumnsRequest>) -> impl IntoResponse {
    let path = PathBuf::from(&req.file_path);
    let result = ingest::inspect_file(&path).await.map(|report| ColumnsResponse {
        file_path: req.file_path,
        report,
    });
    respond(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CanonicalField;

    // ==================== ApiResponse Tests ====================

    #[test]
    fn test_api_response_ok() {
        let response: ApiResponse<String> = ApiResponse::ok("data".to_string());

        assert!(response.success);
        assert_eq!(response.data.as_deref(), Some("data"));
        assert!(response.error.is_none());
        assert!(response.error_kind.is_none());
    }

    #[test]
    fn test_api_response_from_error_carries_kind() {
        let error = RoasError::Schema {
            missing: vec![CanonicalField::Clicks],
        };
        let response: ApiResponse<()> = ApiResponse::from_error(&error);

        assert!(!response.success);
        assert_eq!(response.error_kind.as_deref(), Some("schema"));
        assert_eq!(
            response.error.as_deref(),
            Some("Missing required columns: clicks")
        );
    }

    #[test]
    fn test_api_response_serialization_skips_empty_fields() {
        let response: ApiResponse<u32> = ApiResponse::ok(7);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["data"], 7);
        assert!(json.get("error").is_none());
        assert!(json.get("error_kind").is_none());
    }

    // ==================== Status Mapping Tests ====================

    #[test]
    fn test_status_for_input_errors() {
        assert_eq!(
            status_for(&RoasError::StructuralParse("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&RoasError::RowValue {
                row: 3,
                field: CanonicalField::AdSpend,
                message: "'abc' is not a number".to_string(),
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_status_for_other_errors() {
        let not_found = RoasError::Io(std::io::Error::new(ErrorKind::NotFound, "gone"));
        assert_eq!(status_for(&not_found), StatusCode::NOT_FOUND);

        let denied = RoasError::Io(std::io::Error::new(ErrorKind::PermissionDenied, "no"));
        assert_eq!(status_for(&denied), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            status_for(&RoasError::UnsupportedFormat(".pdf".to_string())),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            status_for(&RoasError::SourceTooLarge { size: 11, limit: 10 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_for(&RoasError::InsufficientData {
                mode: ComparisonMode::Day,
                current_dates: 1,
                previous_dates: 0,
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    // ==================== Request Deserialization Tests ====================

    #[test]
    fn test_analyze_request_mode_defaults_to_day() {
        let req: AnalyzeRequest = serde_json::from_str(r#"{"file_path": "report.xlsx"}"#).unwrap();
        assert_eq!(req.file_path, "report.xlsx");
        assert_eq!(req.mode, ComparisonMode::Day);
    }

    #[test]
    fn test_analyze_request_week_mode() {
        let req: AnalyzeRequest =
            serde_json::from_str(r#"{"file_path": "report.csv", "mode": "week"}"#).unwrap();
        assert_eq!(req.mode, ComparisonMode::Week);
    }

    // ==================== Upload Tests ====================

    #[test]
    fn test_upload_sniffs_csv_without_filename() {
        let body = b"date,cost,revenue,conversions,clicks\n2024-01-01,100,300,10,50\n2024-01-02,100,600,10,50\n";
        let result = analyze_upload_body(&UploadQuery::default(), body).unwrap();
        assert_eq!(result.comparison.current.roas, 6.0);
    }

    #[test]
    fn test_upload_rejects_unsupported_filename() {
        let query = UploadQuery {
            filename: Some("report.pdf".to_string()),
            ..UploadQuery::default()
        };
        let err = analyze_upload_body(&query, b"%PDF-1.4").unwrap_err();
        assert_eq!(err.kind(), "unsupported_format");
    }
}
