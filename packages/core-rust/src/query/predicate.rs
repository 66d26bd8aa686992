//! Record predicate evaluated against JSON documents.
//!
//! A predicate is the conjunction of fixed scope constraints (usually path
//! parameters), `filterBy` membership tests and an optional free-text search.

use serde_json::Value;

/// Looks up a dotted path (`providerData.region`) inside a document.
#[must_use]
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| current.get(segment))
}

/// Exact match of a stored value against a client-supplied string.
///
/// Numbers and booleans compare by their text form; arrays match when any
/// element matches.
#[must_use]
pub fn value_matches(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        Value::Array(items) => items.iter().any(|item| value_matches(item, expected)),
        Value::Null | Value::Object(_) => false,
    }
}

/// Equality used by scope constraints: arrays match when they contain the value.
#[must_use]
pub fn json_matches(value: &Value, expected: &Value) -> bool {
    if value == expected {
        return true;
    }
    match value {
        Value::Array(items) => items.iter().any(|item| item == expected),
        _ => false,
    }
}

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::Array(items) => items.iter().any(|item| value_contains(item, needle)),
        Value::Bool(_) | Value::Null | Value::Object(_) => false,
    }
}

/// Membership test for one `filterBy` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub path: String,
    pub values: Vec<String>,
}

/// Case-insensitive substring search over a set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchClause {
    needle: String,
    pub fields: Vec<String>,
}

impl SearchClause {
    #[must_use]
    pub fn new(term: &str, fields: &[&str]) -> Self {
        Self {
            needle: term.to_lowercase(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.needle
    }

    fn matches(&self, doc: &Value) -> bool {
        self.fields
            .iter()
            .filter_map(|path| lookup(doc, path))
            .any(|value| value_contains(value, &self.needle))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Constraint {
    Eq(String, Value),
    Ne(String, Value),
}

impl Constraint {
    fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::Eq(path, expected) => lookup(doc, path).is_some_and(|v| json_matches(v, expected)),
            Self::Ne(path, excluded) => !lookup(doc, path).is_some_and(|v| json_matches(v, excluded)),
        }
    }
}

/// Conjunction of scope constraints, field filters and search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    constraints: Vec<Constraint>,
    filters: Vec<FieldFilter>,
    search: Option<SearchClause>,
}

impl Predicate {
    /// Predicate matching every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Predicate requiring `path` to equal `value`.
    #[must_use]
    pub fn eq(path: &str, value: impl Into<Value>) -> Self {
        Self::all().and_eq(path, value)
    }

    #[must_use]
    pub fn and_eq(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.constraints
            .push(Constraint::Eq(path.to_string(), value.into()));
        self
    }

    /// Excludes documents whose `path` equals `value`; missing fields pass.
    #[must_use]
    pub fn and_ne(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.constraints
            .push(Constraint::Ne(path.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn and_filter(mut self, filter: FieldFilter) -> Self {
        if !filter.values.is_empty() {
            self.filters.push(filter);
        }
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: Option<SearchClause>) -> Self {
        self.search = search.filter(|s| !s.needle.is_empty());
        self
    }

    #[must_use]
    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    #[must_use]
    pub fn search(&self) -> Option<&SearchClause> {
        self.search.as_ref()
    }

    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        self.constraints.iter().all(|c| c.matches(doc))
            && self.filters.iter().all(|f| {
                lookup(doc, &f.path)
                    .is_some_and(|value| f.values.iter().any(|v| value_matches(value, v)))
            })
            && self.search.as_ref().is_none_or(|s| s.matches(doc))
    }
}
