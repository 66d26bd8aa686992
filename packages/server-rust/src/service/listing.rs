//! Runs the list query pipeline against a [`RecordStore`] collection.

use catalyst_core::error::{ApiResult, OrInternal};
use catalyst_core::query::{
    ListRequest, MetaData, PageResult, Predicate, QueryDescriptor, RawListRequest, ResourceSchema,
};
use serde_json::Value;
use tracing::debug;

use crate::storage::RecordStore;

/// Normalizes `raw`, counts, then fetches one page from the schema's
/// collection. `scope` carries the constraints taken from path parameters.
///
/// # Errors
///
/// Validation errors for malformed pagination; internal errors for store
/// failures.
pub async fn list_page(
    store: &dyn RecordStore,
    schema: &ResourceSchema,
    raw: &RawListRequest,
    scope: Predicate,
) -> ApiResult<PageResult<Value>> {
    let request = ListRequest::normalize(raw, schema)?;
    let query = QueryDescriptor::build(&request, schema, scope);

    let total = store
        .count(schema.collection, &query.predicate)
        .await
        .or_internal(schema.resource_key)?;
    let records = store
        .find_page(schema.collection, &query)
        .await
        .or_internal(schema.resource_key)?;

    debug!(
        resource = schema.resource_key,
        total,
        page = request.page,
        returned = records.len(),
        "list page fetched"
    );
    Ok(PageResult::new(records, MetaData::new(&request, total)))
}
