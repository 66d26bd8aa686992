//! Raw and normalized list requests.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::filter::FilterBy;
use super::schema::ResourceSchema;
use crate::error::{ApiError, ApiResult};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Attribute reported when page or pageSize are malformed.
pub const PAGINATION_ATTRIBUTE: &str = "paginationRequest";

/// List parameters exactly as they arrived on the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListRequest {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub filter_by: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parses `asc`/`desc` case-insensitively; anything else is `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A list request with defaults applied and every parameter resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub page: u64,
    pub page_size: u64,
    pub search: Option<String>,
    /// Client-facing sort field name (always known to the schema).
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub filter_by: FilterBy,
}

impl ListRequest {
    /// Applies defaults and validates a raw request against a schema.
    ///
    /// # Errors
    ///
    /// Returns a validation error on `paginationRequest` when page or
    /// pageSize is non-numeric or not positive.
    pub fn normalize(raw: &RawListRequest, schema: &ResourceSchema) -> ApiResult<Self> {
        let page = parse_positive(raw.page.as_deref(), DEFAULT_PAGE, "page")?;
        let page_size = parse_positive(raw.page_size.as_deref(), DEFAULT_PAGE_SIZE, "pageSize")?;

        let sort_by = non_blank(raw.sort_by.as_deref())
            .filter(|field| schema.is_known_field(field))
            .unwrap_or(schema.default_sort)
            .to_string();

        let sort_order = non_blank(raw.sort_order.as_deref())
            .and_then(SortOrder::parse)
            .unwrap_or_default();

        let filter_by = non_blank(raw.filter_by.as_deref())
            .map(|f| FilterBy::parse(f, schema))
            .unwrap_or_default();

        Ok(Self {
            page,
            page_size,
            search: non_blank(raw.search.as_deref()).map(str::to_string),
            sort_by,
            sort_order,
            filter_by,
        })
    }

    /// Number of records preceding the requested page.
    #[must_use]
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_positive(raw: Option<&str>, default: u64, name: &str) -> ApiResult<u64> {
    let Some(raw) = non_blank(raw) else {
        return Ok(default);
    };
    raw.parse::<i64>()
        .ok()
        .and_then(|n| u64::try_from(n).ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            ApiError::validation(
                PAGINATION_ATTRIBUTE,
                format!("{name} must be a positive integer, got '{raw}'"),
            )
        })
}
