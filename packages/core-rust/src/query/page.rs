//! Paginated results and the `{ <resourceKey>: [...], metaData }` envelope.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::filter::FilterBy;
use super::request::{ListRequest, SortOrder};

/// `ceil(total_records / page_size)`; zero when `page_size` is zero.
#[must_use]
pub fn total_pages(total_records: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        0
    } else {
        total_records.div_ceil(page_size)
    }
}

/// Pagination metadata echoing the resolved request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub total_records: u64,
    pub page_size: u64,
    pub page: u64,
    pub total_pages: u64,
    pub sort_by: String,
    pub sort_order: SortOrder,
    #[serde(skip_serializing_if = "FilterBy::is_empty")]
    pub filter_by: FilterBy,
}

impl MetaData {
    #[must_use]
    pub fn new(request: &ListRequest, total_records: u64) -> Self {
        Self {
            total_records,
            page_size: request.page_size,
            page: request.page,
            total_pages: total_pages(total_records, request.page_size),
            sort_by: request.sort_by.clone(),
            sort_order: request.sort_order,
            filter_by: request.filter_by.clone(),
        }
    }
}

/// One page of records plus its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub records: Vec<T>,
    pub meta_data: MetaData,
}

impl<T> PageResult<T> {
    #[must_use]
    pub fn new(records: Vec<T>, meta_data: MetaData) -> Self {
        Self { records, meta_data }
    }

    /// Replaces the records, keeping the metadata (used after re-shaping).
    #[must_use]
    pub fn with_records<U>(self, records: Vec<U>) -> PageResult<U> {
        PageResult {
            records,
            meta_data: self.meta_data,
        }
    }

    /// Wraps the page for serialization under `resource_key`.
    #[must_use]
    pub fn into_envelope(self, resource_key: &'static str) -> ListEnvelope<T> {
        ListEnvelope {
            resource_key,
            page: self,
        }
    }
}

/// Serializes as `{ <resource_key>: [...records], "metaData": {...} }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEnvelope<T> {
    resource_key: &'static str,
    page: PageResult<T>,
}

impl<T> ListEnvelope<T> {
    #[must_use]
    pub fn resource_key(&self) -> &'static str {
        self.resource_key
    }

    #[must_use]
    pub fn page(&self) -> &PageResult<T> {
        &self.page
    }
}

impl<T: Serialize> Serialize for ListEnvelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.resource_key, &self.page.records)?;
        map.serialize_entry("metaData", &self.page.meta_data)?;
        map.end()
    }
}
