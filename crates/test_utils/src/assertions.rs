//! Custom Test Assertions
//!
//! Assertion helpers that give more meaningful failure messages than plain
//! `assert_eq!` on whole entities.

use std::fmt::Debug;

use core_kernel::{Entity, PagedResult};
use domain_forecast::WeatherForecast;

/// Asserts two forecasts are equal apart from fields the server populates
///
/// Ignores the concurrency token, the creation and modification dates and
/// `temperature_f`, which is always re-derived on save.
pub fn assert_forecast_matches(actual: &WeatherForecast, expected: &WeatherForecast) {
    assert_eq!(actual.id, expected.id, "Forecast id mismatch");
    assert_eq!(actual.date, expected.date, "Forecast date mismatch for {}", actual.id);
    assert_eq!(
        actual.temperature_c, expected.temperature_c,
        "TemperatureC mismatch for {}",
        actual.id
    );
    assert_eq!(actual.summary, expected.summary, "Summary mismatch for {}", actual.id);
    assert_eq!(
        actual.audit.created_by, expected.audit.created_by,
        "CreatedBy mismatch for {}",
        actual.id
    );
}

/// Asserts the entity carries a token other than `previous`
pub fn assert_version_changed<E: Entity>(entity: &E, previous: uuid::Uuid) {
    assert_ne!(
        entity.version(),
        previous,
        "Expected {} '{}' to carry a new version",
        E::ENTITY_TYPE,
        entity.id()
    );
}

/// Asserts the page metadata
pub fn assert_page_shape<T>(page: &PagedResult<T>, items: usize, total_count: u64, total_pages: u64) {
    assert_eq!(page.items.len(), items, "Unexpected number of items on page");
    assert_eq!(page.total_count, total_count, "Unexpected total count");
    assert_eq!(page.total_pages(), total_pages, "Unexpected total pages");
}

/// Asserts the keys are non-increasing
pub fn assert_non_increasing<K: PartialOrd + Debug>(keys: &[K]) {
    for pair in keys.windows(2) {
        assert!(pair[0] >= pair[1], "Keys are not in descending order: {:?}", keys);
    }
}

/// Asserts the keys are non-decreasing
pub fn assert_non_decreasing<K: PartialOrd + Debug>(keys: &[K]) {
    for pair in keys.windows(2) {
        assert!(pair[0] <= pair[1], "Keys are not in ascending order: {:?}", keys);
    }
}
