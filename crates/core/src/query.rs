//! Query state
//!
//! The single, serializable value describing the current view of a
//! management page: search text, facet selections, sort and page window.

use crate::column::ColumnRegistry;
use crate::error::QueryError;
use crate::filter::FilterRegistry;
use crate::sort::SortOrder;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Rows per page when a view does not configure its own size
pub const DEFAULT_PAGE_SIZE: usize = 10;

static FILTER_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9_.\-]+)\s*=(.*)$").expect("filter argument pattern is valid")
});

/// Current configuration of one view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryState {
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub sort_key: Option<String>,
    pub sort_order: SortOrder,
    pub page: usize,
    pub page_size: usize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            sort_key: None,
            sort_order: SortOrder::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryState {
    /// Default state with a custom page size (zero becomes one)
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Set an initial sort without going through the toggle rule
    pub fn with_sort(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.sort_key = Some(key.into());
        self.sort_order = order;
        self
    }

    /// Apply a column-header click
    ///
    /// The active column toggles direction, another sortable column becomes
    /// the sort key in ascending order, anything else is ignored. Returns
    /// whether the state changed.
    pub fn apply_sort_click<R>(&mut self, key: &str, columns: &ColumnRegistry<R>) -> bool {
        if !columns.is_sortable(key) {
            return false;
        }

        if self.sort_key.as_deref() == Some(key) {
            self.sort_order = self.sort_order.toggle();
        } else {
            self.sort_key = Some(key.to_string());
            self.sort_order = SortOrder::Asc;
        }
        true
    }

    /// Drop everything the registries do not declare
    ///
    /// Unknown or non-sortable sort keys are cleared, undeclared facets and
    /// disallowed or sentinel selections are removed, and page numbers are
    /// forced to be positive.
    pub fn sanitized<R>(mut self, columns: &ColumnRegistry<R>, filters: &FilterRegistry) -> Self {
        if let Some(key) = &self.sort_key {
            if !columns.is_sortable(key) {
                self.sort_key = None;
                self.sort_order = SortOrder::Asc;
            }
        }

        self.filters.retain(|key, value| {
            filters
                .get(key)
                .is_some_and(|descriptor| !crate::filter::is_all(value) && descriptor.allows(value))
        });

        self.page = self.page.max(1);
        self.page_size = self.page_size.max(1);
        self
    }
}

/// Parse a `KEY=VALUE` facet selection
pub fn parse_filter_arg(arg: &str) -> Result<(String, String), QueryError> {
    let captures = FILTER_ARG
        .captures(arg)
        .ok_or_else(|| QueryError::InvalidFilter(arg.to_string()))?;

    let key = captures[1].to_string();
    let value = captures[2].trim().to_string();
    Ok((key, value))
}

/// Parse a `KEY` or `KEY:asc|desc` sort selection
pub fn parse_sort_arg(arg: &str) -> Result<(String, SortOrder), QueryError> {
    let (key, order) = match arg.split_once(':') {
        Some((key, order)) => (key.trim(), order.parse::<SortOrder>()?),
        None => (arg.trim(), SortOrder::Asc),
    };

    if key.is_empty() {
        return Err(QueryError::InvalidSort(arg.to_string()));
    }

    Ok((key.to_string(), order))
}
