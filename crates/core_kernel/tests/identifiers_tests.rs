//! Unit tests for the identifier newtypes
//!
//! Covers creation, parsing (with and without prefix), conversion and
//! display formatting.

use core_kernel::{ActivityId, CoreError, ForecastId};
use uuid::Uuid;

mod forecast_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = ForecastId::new();
        let id2 = ForecastId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = ForecastId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let id2 = ForecastId::new_v7();
        assert!(id1 < id2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = ForecastId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(ForecastId::prefix(), "FCST");
        assert_eq!(ActivityId::prefix(), "ACT");
    }

    #[test]
    fn test_display_matches_persisted_column_width() {
        let id: ForecastId = "38b7942a-8a8f-4a34-9744-e4dea6eaed78".parse().unwrap();
        assert_eq!(id.to_string(), "38b7942a-8a8f-4a34-9744-e4dea6eaed78");
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn test_from_str_with_prefix() {
        let id: ForecastId = "FCST-3db3a34a-9dcf-42e6-977f-d6bbb2329f16".parse().unwrap();
        assert_eq!(id.to_string(), "3db3a34a-9dcf-42e6-977f-d6bbb2329f16");
    }

    #[test]
    fn test_from_str_trims_whitespace() {
        let id: ForecastId = "  76d5e039-63b3-4c7f-bb8d-0847f729dcde ".parse().unwrap();
        assert_eq!(id.to_string(), "76d5e039-63b3-4c7f-bb8d-0847f729dcde");
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        let result: Result<ForecastId, _> = "not-a-forecast".parse();
        assert!(matches!(result, Err(CoreError::InvalidIdentifier(_))));
    }

    #[test]
    fn test_nil() {
        assert!(ForecastId::nil().is_nil());
        assert!(!ForecastId::new().is_nil());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = ForecastId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: ForecastId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
