use axum::{http::StatusCode, response::IntoResponse};
use tutorbook_api::middleware::error_handling::AppError;
use tutorbook_core::errors::BookingError;

#[test]
fn test_not_found_maps_to_404() {
    let response =
        AppError(BookingError::NotFound("missing".to_string())).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_validation_maps_to_400() {
    let response =
        AppError(BookingError::Validation("bad input".to_string())).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_slot_unavailable_maps_to_409() {
    let response =
        AppError(BookingError::SlotUnavailable("retired".to_string())).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[test]
fn test_capacity_exceeded_maps_to_409() {
    let response =
        AppError(BookingError::CapacityExceeded("full".to_string())).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[test]
fn test_contention_maps_to_503() {
    let response =
        AppError(BookingError::Contention("lock timeout".to_string())).into_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn test_database_maps_to_500() {
    let response =
        AppError(BookingError::Database(eyre::eyre!("connection refused"))).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_error_body_carries_message_and_retryability() {
    let response =
        AppError(BookingError::Contention("lock timeout".to_string())).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body: serde_json::Value =
        serde_json::from_slice(&bytes).expect("Error body should be JSON");

    assert!(body["error"].as_str().unwrap().contains("lock timeout"));
    assert_eq!(body["retryable"], true);

    let response =
        AppError(BookingError::CapacityExceeded("full".to_string())).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body: serde_json::Value =
        serde_json::from_slice(&bytes).expect("Error body should be JSON");

    assert_eq!(body["retryable"], false);
}
