//! Tests for core_kernel error types

use core_kernel::error::CoreError;

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Date is required");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Date is required"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_unknown_sort_column() {
    let error = CoreError::unknown_sort_column("password");

    assert_eq!(error, CoreError::UnknownSortColumn("password".to_string()));
    assert!(error.to_string().contains("password"));
}

#[test]
fn test_core_error_not_found() {
    let error = CoreError::not_found("Forecast not found");

    match error {
        CoreError::NotFound(msg) => assert_eq!(msg, "Forecast not found"),
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_core_error_display() {
    let error = CoreError::validation("Test error");
    let display = format!("{}", error);

    assert!(display.contains("Validation error"));
}

#[test]
fn test_core_error_configuration() {
    let error = CoreError::Configuration("Missing config".to_string());

    match error {
        CoreError::Configuration(msg) => assert_eq!(msg, "Missing config"),
        _ => panic!("Expected Configuration error"),
    }
}
