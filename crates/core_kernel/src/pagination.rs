//! Pagination, searching and sorting value objects

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default page size
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Sort direction
///
/// Parsed case-insensitively; anything other than `desc` sorts ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Return the SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

impl Serialize for SortDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

impl<'de> Deserialize<'de> for SortDirection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Query parameters for pagination, sorting and searching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    /// Page number (1-based)
    #[serde(default = "default_page_number")]
    pub page_number: u32,
    /// Number of items per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Free-text search term
    #[serde(default)]
    pub search_term: Option<String>,
    /// Column to sort by; must be one of the entity's sortable columns
    #[serde(default)]
    pub sort_column: Option<String>,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

impl PaginationQuery {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn sorted_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_column = Some(column.into());
        self.sort_direction = direction;
        self
    }

    /// Page number clamped to at least 1
    pub fn page(&self) -> u32 {
        self.page_number.max(1)
    }

    /// Page size clamped to at least 1
    pub fn limit(&self) -> u32 {
        self.page_size.max(1)
    }

    /// Number of rows to skip
    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }

    /// The search term, if it contains anything besides whitespace
    pub fn search(&self) -> Option<&str> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// The sort column, if one was supplied
    pub fn sort(&self) -> Option<&str> {
        self.sort_column
            .as_deref()
            .map(str::trim)
            .filter(|column| !column.is_empty())
    }
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page_number: default_page_number(),
            page_size: default_page_size(),
            search_term: None,
            sort_column: None,
            sort_direction: SortDirection::Asc,
        }
    }
}

fn default_page_number() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// A bounded page of a larger result set
///
/// `total_pages` is derived from `total_count` and `page_size` and is only
/// materialized when serializing.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_size: u32,
    pub current_page: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: u64, current_page: u32, page_size: u32) -> Self {
        Self {
            items,
            total_count,
            page_size,
            current_page,
        }
    }

    /// `ceil(total_count / page_size)`, zero when the page size is zero
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.current_page) < self.total_pages()
    }

    /// Converts the items while keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_size: self.page_size,
            current_page: self.current_page,
        }
    }
}

impl<T: Serialize> Serialize for PagedResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PagedResult", 5)?;
        state.serialize_field("items", &self.items)?;
        state.serialize_field("totalCount", &self.total_count)?;
        state.serialize_field("pageSize", &self.page_size)?;
        state.serialize_field("currentPage", &self.current_page)?;
        state.serialize_field("totalPages", &self.total_pages())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = PaginationQuery::default();
        assert_eq!(query.page_number, 1);
        assert_eq!(query.page_size, 10);
        assert_eq!(query.sort_direction, SortDirection::Asc);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_offset_clamps_page_zero() {
        let query = PaginationQuery::new(0, 10);
        assert_eq!(query.page(), 1);
        assert_eq!(query.offset(), 0);

        let query = PaginationQuery::new(3, 10);
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn test_total_pages() {
        let page: PagedResult<u8> = PagedResult::new(vec![], 25, 1, 10);
        assert_eq!(page.total_pages(), 3);

        let page: PagedResult<u8> = PagedResult::new(vec![], 20, 1, 10);
        assert_eq!(page.total_pages(), 2);

        let page: PagedResult<u8> = PagedResult::new(vec![], 0, 1, 10);
        assert_eq!(page.total_pages(), 0);

        let page: PagedResult<u8> = PagedResult::new(vec![], 5, 1, 0);
        assert_eq!(page.total_pages(), 0);
    }

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!(SortDirection::parse("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::parse("asc"), SortDirection::Asc);
        assert_eq!(SortDirection::parse("sideways"), SortDirection::Asc);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = PaginationQuery::default().with_search("   ");
        assert_eq!(query.search(), None);
    }

    #[test]
    fn test_paged_result_serializes_total_pages() {
        let page = PagedResult::new(vec![1, 2], 12, 2, 5);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
    }
}
