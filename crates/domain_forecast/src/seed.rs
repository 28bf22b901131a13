//! Initial forecast rows
//!
//! The same five rows are inserted by the initial migration and by the
//! in-memory store at startup, so both backends begin from identical data.
//! Each row's concurrency token equals its identifier.

use chrono::{NaiveDate, NaiveTime};
use uuid::{uuid, Uuid};

use core_kernel::{AuditFields, ForecastId};

use crate::forecast::{celsius_to_fahrenheit, WeatherForecast};

const SEED_ROWS: [(Uuid, (i32, u32, u32), i32, &str); 5] = [
    (uuid!("38b7942a-8a8f-4a34-9744-e4dea6eaed78"), (2025, 1, 4), 25, "Hot"),
    (uuid!("3db3a34a-9dcf-42e6-977f-d6bbb2329f16"), (2025, 1, 7), 15, "Cool"),
    (uuid!("76d5e039-63b3-4c7f-bb8d-0847f729dcde"), (2025, 1, 9), 5, "Cold"),
    (uuid!("1130f076-1d75-4977-8a50-323a4ecf8f4e"), (2025, 1, 11), 35, "Hot"),
    (uuid!("2fa8d533-c8fd-45e6-8ee4-988e5b1d8d04"), (2025, 1, 20), 20, "Warm"),
];

/// Returns the seeded forecasts, ordered by date
pub fn seed_forecasts() -> Vec<WeatherForecast> {
    SEED_ROWS
        .iter()
        .filter_map(|(id, (y, m, d), temperature_c, summary)| {
            let date = NaiveDate::from_ymd_opt(*y, *m, *d)?;
            Some(WeatherForecast {
                id: ForecastId::from_uuid(*id),
                date,
                temperature_c: *temperature_c,
                temperature_f: celsius_to_fahrenheit(*temperature_c),
                summary: summary.to_string(),
                audit: AuditFields {
                    version: *id,
                    created_by: "System".to_string(),
                    created_date: date.and_time(NaiveTime::MIN).and_utc(),
                    modified_date: None,
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_rows() {
        let rows = seed_forecasts();
        assert_eq!(rows.len(), 5);
        for row in &rows {
            assert_eq!(row.id.as_uuid(), &row.audit.version);
            assert_eq!(row.temperature_f, celsius_to_fahrenheit(row.temperature_c));
        }
        assert_eq!(rows[0].temperature_f, 76);
    }
}
