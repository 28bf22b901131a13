//! User activity log entries
//!
//! One entry is written for every API request. Text fields are bounded by
//! their column widths; [`UserActivityLog::truncate_to_limits`] clips them so
//! that an oversized header blob never prevents the entry from being stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use core_kernel::{ActivityId, AuditFields, CoreError, Entity, SortColumn};

/// Width of most text columns
pub const TEXT_COLUMN_WIDTH: usize = 100;

/// Width of the request method column
pub const METHOD_COLUMN_WIDTH: usize = 10;

/// Width of the header and body columns
pub const PAYLOAD_COLUMN_WIDTH: usize = 4000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivityLog {
    pub id: ActivityId,
    pub source_name: Option<String>,
    pub os_version: Option<String>,
    pub host: Option<String>,
    pub username: Option<String>,
    pub domain_name: Option<String>,
    pub address: Option<String>,
    pub request_method: Option<String>,
    pub request_path: Option<String>,
    pub request_time: DateTime<Utc>,
    pub request_body: Option<String>,
    pub request_headers: Option<String>,
    pub response_headers: Option<String>,
    pub response_status_code: Option<i32>,
    pub response_body: Option<String>,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl UserActivityLog {
    /// Creates an entry for a request received at `request_time`
    pub fn new(request_time: DateTime<Utc>) -> Self {
        Self {
            id: ActivityId::new_v7(),
            source_name: None,
            os_version: None,
            host: None,
            username: None,
            domain_name: None,
            address: None,
            request_method: None,
            request_path: None,
            request_time,
            request_body: None,
            request_headers: None,
            response_headers: None,
            response_status_code: None,
            response_body: None,
            audit: AuditFields::default(),
        }
    }

    /// Clips every text field to its column width
    pub fn truncate_to_limits(&mut self) {
        for field in [
            &mut self.source_name,
            &mut self.os_version,
            &mut self.host,
            &mut self.username,
            &mut self.domain_name,
            &mut self.address,
            &mut self.request_path,
        ] {
            clip(field, TEXT_COLUMN_WIDTH);
        }
        clip(&mut self.request_method, METHOD_COLUMN_WIDTH);
        for field in [
            &mut self.request_body,
            &mut self.request_headers,
            &mut self.response_headers,
            &mut self.response_body,
        ] {
            clip(field, PAYLOAD_COLUMN_WIDTH);
        }
        if self.audit.created_by.chars().count() > TEXT_COLUMN_WIDTH {
            self.audit.created_by = self.audit.created_by.chars().take(TEXT_COLUMN_WIDTH).collect();
        }
    }
}

fn clip(field: &mut Option<String>, width: usize) {
    if let Some(value) = field {
        if value.chars().count() > width {
            *value = value.chars().take(width).collect();
        }
    }
}

impl Entity for UserActivityLog {
    type SortColumn = ActivitySortColumn;

    const ENTITY_TYPE: &'static str = "UserActivityLog";

    fn id(&self) -> String {
        self.id.to_string()
    }

    fn has_identity(&self) -> bool {
        !self.id.is_nil()
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [
            &self.request_path,
            &self.request_method,
            &self.username,
            &self.host,
        ]
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&term))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySortColumn {
    RequestTime,
    RequestPath,
    RequestMethod,
    ResponseStatusCode,
    CreatedDate,
}

impl FromStr for ActivitySortColumn {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "requesttime" => Ok(Self::RequestTime),
            "requestpath" => Ok(Self::RequestPath),
            "requestmethod" => Ok(Self::RequestMethod),
            "responsestatuscode" => Ok(Self::ResponseStatusCode),
            "createddate" => Ok(Self::CreatedDate),
            _ => Err(CoreError::unknown_sort_column(s)),
        }
    }
}

impl SortColumn<UserActivityLog> for ActivitySortColumn {
    fn column_name(&self) -> &'static str {
        match self {
            Self::RequestTime => "request_time",
            Self::RequestPath => "request_path",
            Self::RequestMethod => "request_method",
            Self::ResponseStatusCode => "response_status_code",
            Self::CreatedDate => "created_date",
        }
    }

    fn compare(&self, a: &UserActivityLog, b: &UserActivityLog) -> Ordering {
        match self {
            Self::RequestTime => a.request_time.cmp(&b.request_time),
            Self::RequestPath => a.request_path.cmp(&b.request_path),
            Self::RequestMethod => a.request_method.cmp(&b.request_method),
            Self::ResponseStatusCode => a.response_status_code.cmp(&b.response_status_code),
            Self::CreatedDate => a.audit.created_date.cmp(&b.audit.created_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_limits() {
        let mut entry = UserActivityLog::new(Utc::now());
        entry.request_method = Some("PROPFINDXYZ".to_string());
        entry.request_path = Some("x".repeat(250));
        entry.request_headers = Some("h".repeat(5000));

        entry.truncate_to_limits();

        assert_eq!(entry.request_method.as_deref(), Some("PROPFINDXY"));
        assert_eq!(entry.request_path.as_ref().map(String::len), Some(TEXT_COLUMN_WIDTH));
        assert_eq!(entry.request_headers.as_ref().map(String::len), Some(PAYLOAD_COLUMN_WIDTH));
    }

    #[test]
    fn test_search_matches_path_and_user() {
        let mut entry = UserActivityLog::new(Utc::now());
        entry.request_path = Some("/api/v1/WeatherForecast".to_string());
        entry.username = Some("alice".to_string());

        assert!(entry.matches_search("weatherforecast"));
        assert!(entry.matches_search("ALICE"));
        assert!(!entry.matches_search("healthchecks"));
    }
}
