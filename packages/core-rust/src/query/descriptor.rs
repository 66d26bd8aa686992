//! Resolved query: predicate, sort and the skip/limit window.

use std::cmp::Ordering;

use serde_json::Value;

use super::predicate::{lookup, FieldFilter, Predicate, SearchClause};
use super::request::{ListRequest, SortOrder};
use super::schema::ResourceSchema;

/// Sort key (document path) and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub path: String,
    pub order: SortOrder,
}

/// Everything a record store needs to count and fetch one page.
///
/// Derived once per request. Count and page fetch must both use
/// [`QueryDescriptor::predicate`] so totals never drift from the page.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub predicate: Predicate,
    pub sort: SortSpec,
    pub skip: usize,
    pub limit: usize,
}

impl QueryDescriptor {
    /// Combines scope constraints with the request's filter and search.
    #[must_use]
    pub fn build(request: &ListRequest, schema: &ResourceSchema, scope: Predicate) -> Self {
        let mut predicate = scope.with_search(
            request
                .search
                .as_deref()
                .map(|term| SearchClause::new(term, schema.search_fields)),
        );
        for (name, values) in request.filter_by.iter() {
            let Some(path) = schema.path_of(name) else {
                continue;
            };
            predicate = predicate.and_filter(FieldFilter {
                path: path.to_string(),
                values: values.to_vec(),
            });
        }

        let path = schema
            .path_of(&request.sort_by)
            .unwrap_or_else(|| schema.default_sort_path());

        Self {
            predicate,
            sort: SortSpec {
                path: path.to_string(),
                order: request.sort_order,
            },
            skip: to_usize(request.skip()),
            limit: to_usize(request.page_size),
        }
    }

    /// Number of documents matching the predicate, ignoring the page window.
    pub fn count<'a>(&self, docs: impl IntoIterator<Item = &'a Value>) -> u64 {
        let matched = docs
            .into_iter()
            .filter(|doc| self.predicate.matches(doc))
            .count();
        u64::try_from(matched).unwrap_or(u64::MAX)
    }

    /// Filters, sorts and windows documents given in natural order.
    #[must_use]
    pub fn select(&self, docs: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let matched: Vec<Value> = docs
            .into_iter()
            .filter(|doc| self.predicate.matches(doc))
            .collect();
        self.sort_and_page(matched)
    }

    /// Sorts and windows documents that already satisfy the predicate.
    #[must_use]
    pub fn sort_and_page(&self, mut docs: Vec<Value>) -> Vec<Value> {
        sort_documents(&mut docs, &self.sort);
        docs.into_iter().skip(self.skip).take(self.limit).collect()
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Stable sort; equal keys keep their natural order in both directions.
pub fn sort_documents(docs: &mut [Value], sort: &SortSpec) {
    docs.sort_by(|a, b| {
        let ordering = compare_values(lookup(a, &sort.path), lookup(b, &sort.path));
        match sort.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Total order over optional JSON values.
///
/// Missing and null sort first, then numbers, strings, objects, arrays and
/// booleans.
#[must_use]
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x @ (Value::Object(_) | Value::Array(_))), Some(y))
            if type_rank(Some(x)) == type_rank(Some(y)) =>
        {
            x.to_string().cmp(&y.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
