//! Filter registry and filter engine
//!
//! Narrows a row collection by free-text search and by named, enumerable
//! facets. Surviving rows keep their relative order.

use crate::column::ColumnRegistry;
use crate::error::RegistryError;
use crate::record::Record;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Sentinel selection meaning "no narrowing on this facet"
pub const FILTER_ALL: &str = "all";

/// Whether a selected value is the "all" sentinel (or empty)
pub fn is_all(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(FILTER_ALL)
}

/// One selectable value of a facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl From<&str> for FilterOption {
    fn from(value: &str) -> Self {
        Self::new(value, value)
    }
}

impl From<String> for FilterOption {
    fn from(value: String) -> Self {
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// A named facet available for narrowing rows (e.g. status, type)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub key: String,
    pub label: String,
    pub options: Vec<FilterOption>,
}

impl FilterDescriptor {
    pub fn new<O: Into<FilterOption>>(
        key: impl Into<String>,
        label: impl Into<String>,
        options: impl IntoIterator<Item = O>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `value` may be selected for this facet
    ///
    /// The sentinel is always allowed. A facet declared without options
    /// accepts any value.
    pub fn allows(&self, value: &str) -> bool {
        is_all(value) || self.options.is_empty() || self.option(value).is_some()
    }

    pub fn option(&self, value: &str) -> Option<&FilterOption> {
        self.options.iter().find(|option| option.value == value)
    }
}

/// Ordered set of facets for one view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRegistry {
    filters: Vec<FilterDescriptor>,
}

impl FilterRegistry {
    pub fn new(filters: impl IntoIterator<Item = FilterDescriptor>) -> Result<Self, RegistryError> {
        let filters: Vec<FilterDescriptor> = filters.into_iter().collect();

        let mut seen = HashSet::new();
        for filter in &filters {
            if filter.key.trim().is_empty() {
                return Err(RegistryError::EmptyFilterKey);
            }
            if !seen.insert(filter.key.as_str()) {
                return Err(RegistryError::DuplicateFilter(filter.key.clone()));
            }
        }

        Ok(Self { filters })
    }

    /// A registry with no facets
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FilterDescriptor> {
        self.filters.iter().find(|filter| filter.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterDescriptor> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Apply search and active facet selections to a row collection
///
/// A row survives when it matches the search term (if any) AND every active
/// facet. Selections on undeclared facets, and sentinel selections, are
/// ignored.
pub fn filter_rows<'a, R, I>(
    rows: I,
    search: &str,
    active_filters: &BTreeMap<String, String>,
    columns: &ColumnRegistry<R>,
    filters: &FilterRegistry,
) -> Vec<&'a R>
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let needle = search.trim().to_lowercase();

    let predicates: Vec<(&str, &str)> = active_filters
        .iter()
        .filter(|(key, value)| !is_all(value) && filters.contains(key))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    rows.into_iter()
        .filter(|row| {
            matches_search(*row, &needle, columns)
                && predicates
                    .iter()
                    .all(|(key, value)| matches_filter(*row, key, value))
        })
        .collect()
}

/// Whether any column's projected text contains `needle`
///
/// `needle` must already be trimmed and lower-cased. An empty needle matches
/// every row.
pub fn matches_search<R: Record>(row: &R, needle: &str, columns: &ColumnRegistry<R>) -> bool {
    needle.is_empty()
        || columns
            .iter()
            .any(|column| column.project(row).to_lowercase().contains(needle))
}

/// Whether the row's field equals the selected facet value
///
/// Missing fields never match.
pub fn matches_filter<R: Record>(row: &R, key: &str, selected: &str) -> bool {
    match row.field(key) {
        Value::Null => false,
        value => value.display() == selected,
    }
}

/// Number of rows matching each option of a facet
pub fn facet_counts<'d, R: Record>(
    rows: &[R],
    descriptor: &'d FilterDescriptor,
) -> Vec<(&'d FilterOption, usize)> {
    descriptor
        .options
        .iter()
        .map(|option| {
            let count = rows
                .iter()
                .filter(|row| matches_filter(*row, &descriptor.key, &option.value))
                .count();
            (option, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::record::JsonRow;
    use serde_json::json;

    fn rows() -> Vec<JsonRow> {
        vec![
            json!({"id": 1, "title": "Home", "status": "published", "type": "page"}),
            json!({"id": 2, "title": "About Us", "status": "draft", "type": "page"}),
            json!({"id": 3, "title": "Rust tips", "status": "published", "type": "blog"}),
            json!({"id": 4, "title": "Release notes", "type": "blog"}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
    }

    fn columns() -> ColumnRegistry<JsonRow> {
        ColumnRegistry::new(vec![
            Column::new("title", "Title").sortable(),
            Column::new("status", "Status").render(|row: &JsonRow| match row.field("status") {
                Value::Null => None,
                value => Some(value.display().to_uppercase()),
            }),
        ])
        .unwrap()
    }

    fn filters() -> FilterRegistry {
        FilterRegistry::new(vec![
            FilterDescriptor::new("status", "Status", ["draft", "published"]),
            FilterDescriptor::new("type", "Type", ["page", "blog"]),
        ])
        .unwrap()
    }

    fn active(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ids(rows: &[&JsonRow]) -> Vec<String> {
        rows.iter().map(|row| row.field("id").display()).collect()
    }

    #[test]
    fn test_is_all_sentinel() {
        assert!(is_all("all"));
        assert!(is_all("ALL"));
        assert!(is_all(""));
        assert!(is_all("  "));
        assert!(!is_all("draft"));
    }

    #[test]
    fn test_empty_search_and_filters_is_identity() {
        let data = rows();
        let result = filter_rows(&data, "", &BTreeMap::new(), &columns(), &filters());
        assert_eq!(ids(&result), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_search_is_case_insensitive_and_trimmed() {
        let data = rows();
        let result = filter_rows(&data, "  RUST ", &BTreeMap::new(), &columns(), &filters());
        assert_eq!(ids(&result), vec!["3"]);
    }

    #[test]
    fn test_search_matches_rendered_value() {
        let data = rows();
        // "DRAFT" only exists in the rendered status column
        let result = filter_rows(&data, "draft", &BTreeMap::new(), &columns(), &filters());
        assert_eq!(ids(&result), vec!["2"]);
    }

    #[test]
    fn test_search_ignores_undisplayed_fields() {
        let data = rows();
        let result = filter_rows(&data, "blog", &BTreeMap::new(), &columns(), &filters());
        assert!(result.is_empty());
    }

    #[test]
    fn test_filters_combine_with_and() {
        let data = rows();

        let result = filter_rows(
            &data,
            "",
            &active(&[("status", "published"), ("type", "blog")]),
            &columns(),
            &filters(),
        );
        assert_eq!(ids(&result), vec!["3"]);
    }

    #[test]
    fn test_search_and_filter_combine() {
        let data = rows();

        let result = filter_rows(
            &data,
            "o",
            &active(&[("type", "page")]),
            &columns(),
            &filters(),
        );
        assert_eq!(ids(&result), vec!["1", "2"]);
    }

    #[test]
    fn test_missing_field_never_matches_filter() {
        let data = rows();

        let result = filter_rows(
            &data,
            "",
            &active(&[("status", "published")]),
            &columns(),
            &filters(),
        );
        assert_eq!(ids(&result), vec!["1", "3"]);
    }

    #[test]
    fn test_sentinel_and_undeclared_filters_are_ignored() {
        let data = rows();

        let result = filter_rows(
            &data,
            "",
            &active(&[("status", "all"), ("author", "nobody")]),
            &columns(),
            &filters(),
        );
        assert_eq!(ids(&result), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_filter_matches_non_text_fields() {
        let data: Vec<JsonRow> = vec![json!({"featured": true}), json!({"featured": false})]
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        let filters = FilterRegistry::new(vec![FilterDescriptor::new(
            "featured",
            "Featured",
            ["true", "false"],
        )])
        .unwrap();
        let columns: ColumnRegistry<JsonRow> = ColumnRegistry::new(vec![]).unwrap();

        let result = filter_rows(&data, "", &active(&[("featured", "true")]), &columns, &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].field("featured"), Value::Bool(true));
    }

    #[test]
    fn test_descriptor_allows() {
        let descriptor = FilterDescriptor::new("status", "Status", ["draft", "published"]);
        assert!(descriptor.allows("draft"));
        assert!(descriptor.allows("all"));
        assert!(!descriptor.allows("deleted"));

        let open = FilterDescriptor::new("author", "Author", Vec::<String>::new());
        assert!(open.allows("anyone"));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let result = FilterRegistry::new(vec![
            FilterDescriptor::new("status", "Status", ["draft"]),
            FilterDescriptor::new("status", "Status", ["published"]),
        ]);
        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateFilter("status".to_string())
        );
    }

    #[test]
    fn test_facet_counts() {
        let data = rows();
        let registry = filters();
        let descriptor = registry.get("status").unwrap();

        let counts: Vec<(String, usize)> = facet_counts(&data, descriptor)
            .into_iter()
            .map(|(option, count)| (option.value.clone(), count))
            .collect();

        assert_eq!(
            counts,
            vec![("draft".to_string(), 1), ("published".to_string(), 2)]
        );
    }
}
