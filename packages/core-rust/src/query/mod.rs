//! Generic list/search/sort/filter/paginate pipeline.
//!
//! Normalize ([`ListRequest::normalize`]) -> parse filter ([`FilterBy`]) ->
//! build predicate ([`QueryDescriptor::build`]) -> count -> fetch page ->
//! assemble [`MetaData`]. Counting and fetching happen in the record store;
//! [`paginate`] runs the whole pipeline over an in-memory slice.

pub mod descriptor;
pub mod filter;
pub mod page;
pub mod predicate;
pub mod request;
pub mod schema;

pub use descriptor::{compare_values, sort_documents, QueryDescriptor, SortSpec};
pub use filter::FilterBy;
pub use page::{total_pages, ListEnvelope, MetaData, PageResult};
pub use predicate::{lookup, value_matches, FieldFilter, Predicate, SearchClause};
pub use request::{ListRequest, RawListRequest, SortOrder, PAGINATION_ATTRIBUTE};
pub use schema::{resources, QueryField, ResourceSchema};

use serde_json::Value;

use crate::error::ApiResult;

/// Runs the full pipeline over documents held in natural order.
///
/// # Errors
///
/// Returns a validation error when page or pageSize are malformed.
pub fn paginate(
    raw: &RawListRequest,
    schema: &ResourceSchema,
    scope: Predicate,
    docs: Vec<Value>,
) -> ApiResult<PageResult<Value>> {
    let request = ListRequest::normalize(raw, schema)?;
    let descriptor = QueryDescriptor::build(&request, schema, scope);
    let total = descriptor.count(&docs);
    let records = descriptor.select(docs);
    Ok(PageResult::new(records, MetaData::new(&request, total)))
}
