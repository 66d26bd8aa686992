//! Parsing and echoing of the `filterBy` query parameter.
//!
//! Encoding: `field:v1,v2+field2:v3`. Groups are separated by `+`; since
//! form decoding turns a literal `+` into a space, whitespace separates
//! groups as well. A token without `:` that follows whitespace belongs to the
//! previous group's value, so `region:US East` survives decoding intact;
//! after a literal `+` it is a malformed group of its own.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use super::schema::ResourceSchema;

/// Accepted values per field. Values within a field are OR'd, fields are AND'd.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterBy {
    fields: BTreeMap<String, Vec<String>>,
}

impl FilterBy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw `filterBy` string, keeping only fields the schema knows.
    #[must_use]
    pub fn parse(raw: &str, schema: &ResourceSchema) -> Self {
        Self::parse_with(raw, |name| schema.is_known_field(name))
    }

    /// Parses a raw `filterBy` string with a custom field acceptance test.
    pub fn parse_with(raw: &str, is_known: impl Fn(&str) -> bool) -> Self {
        let mut filter = Self::new();

        for group in split_groups(raw) {
            let Some((name, values)) = group.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if !is_known(name) {
                debug!(field = name, "ignoring unknown filterBy field");
                continue;
            }
            filter.insert(name, values.split(',').map(str::trim));
        }

        filter
    }

    /// Adds accepted values for a field, skipping blanks and duplicates.
    pub fn insert<'a>(&mut self, name: &str, values: impl IntoIterator<Item = &'a str>) {
        let mut accepted: Vec<String> = self.fields.get(name).cloned().unwrap_or_default();
        for value in values {
            if !value.is_empty() && !accepted.iter().any(|v| v == value) {
                accepted.push(value.to_string());
            }
        }
        if !accepted.is_empty() {
            self.fields.insert(name.to_string(), accepted);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Echo form: a lone value serializes as a string, several as an array.
impl Serialize for FilterBy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, values) in &self.fields {
            if let [single] = values.as_slice() {
                map.serialize_entry(name, single)?;
            } else {
                map.serialize_entry(name, values)?;
            }
        }
        map.end()
    }
}

fn split_groups(raw: &str) -> Vec<String> {
    let mut groups: Vec<String> = Vec::new();
    let mut token = String::new();
    let mut separator: Option<char> = None;

    for c in raw.chars() {
        if c == '+' || c.is_whitespace() {
            attach(&mut groups, std::mem::take(&mut token), separator);
            separator = Some(c);
        } else {
            token.push(c);
        }
    }
    attach(&mut groups, token, separator);

    groups
}

fn attach(groups: &mut Vec<String>, token: String, separator: Option<char>) {
    if token.is_empty() {
        return;
    }
    match (token.contains(':'), groups.last_mut(), separator) {
        (false, Some(previous), Some(sep)) if sep.is_whitespace() => {
            previous.push(sep);
            previous.push_str(&token);
        }
        _ => groups.push(token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::schema::resources::UNMANAGED_INSTANCES;
    use proptest::prelude::*;

    #[test]
    fn parses_groups_fields_and_alternatives() {
        let filter = FilterBy::parse("region:us-west-2+state:running,stopped", &UNMANAGED_INSTANCES);

        assert_eq!(filter.len(), 2);
        assert_eq!(filter.get("region").unwrap(), ["us-west-2"]);
        assert_eq!(filter.get("state").unwrap(), ["running", "stopped"]);
    }

    #[test]
    fn form_decoded_plus_still_separates_groups() {
        let filter = FilterBy::parse("region:us-west-2 state:running", &UNMANAGED_INSTANCES);
        assert_eq!(filter.get("region").unwrap(), ["us-west-2"]);
        assert_eq!(filter.get("state").unwrap(), ["running"]);
    }

    #[test]
    fn spaces_inside_values_are_kept() {
        let filter = FilterBy::parse_with("region:US East+state:running", |_| true);
        assert_eq!(filter.get("region").unwrap(), ["US East"]);
        assert_eq!(filter.get("state").unwrap(), ["running"]);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let filter = FilterBy::parse("color:blue+state:running", &UNMANAGED_INSTANCES);
        assert!(filter.get("color").is_none());
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn malformed_groups_are_skipped() {
        let filter = FilterBy::parse("state+:running+ip:", &UNMANAGED_INSTANCES);
        assert!(filter.is_empty());

        let filter = FilterBy::parse("state:running+bogus", &UNMANAGED_INSTANCES);
        assert_eq!(filter.get("state").unwrap(), ["running"]);
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn repeated_fields_merge_without_duplicates() {
        let filter = FilterBy::parse("state:running+state:stopped,running", &UNMANAGED_INSTANCES);
        assert_eq!(filter.get("state").unwrap(), ["running", "stopped"]);
    }

    #[test]
    fn echo_uses_string_for_single_value_and_array_for_many() {
        let filter = FilterBy::parse("region:us-west-1+state:running,stopped", &UNMANAGED_INSTANCES);
        let json = serde_json::to_value(&filter).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "region": "us-west-1", "state": ["running", "stopped"] })
        );
    }

    proptest! {
        #[test]
        fn parse_never_yields_blank_values(raw in "[a-z:,+ ]{0,40}") {
            let filter = FilterBy::parse_with(&raw, |_| true);
            for (name, values) in filter.iter() {
                prop_assert!(!name.is_empty());
                prop_assert!(!values.is_empty());
                prop_assert!(values.iter().all(|v| !v.is_empty()));
            }
        }
    }
}
