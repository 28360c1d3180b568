//! Query state controller
//!
//! Owns the query state of one management view. Every mutation re-runs the
//! Filter -> Sort -> Paginate pipeline to completion and publishes a new
//! immutable [`ViewSnapshot`] for the renderer.

use crate::column::ColumnRegistry;
use crate::filter::{facet_counts, filter_rows, is_all, FilterOption, FilterRegistry};
use crate::pagination::{paginate, PaginationInfo};
use crate::query::QueryState;
use crate::record::Record;
use crate::sort::{sort_rows, SortOrder};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything a renderer needs to draw one view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot<R> {
    pub visible_rows: Vec<R>,
    pub total_items: usize,
    pub total_pages: usize,
    pub effective_page: usize,
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub sort_key: Option<String>,
    pub sort_order: SortOrder,
    pub page_size: usize,
}

impl<R> ViewSnapshot<R> {
    /// Whether the view has nothing to show
    ///
    /// An empty result is a valid state; renderers should present it
    /// explicitly rather than as an error.
    pub fn is_empty(&self) -> bool {
        self.visible_rows.is_empty()
    }

    /// Pagination metadata derived from this snapshot
    pub fn pagination(&self) -> PaginationInfo {
        PaginationInfo::new(self.total_items, self.effective_page, self.page_size)
    }
}

/// Single owner of the query state for one view
#[derive(Debug, Clone)]
pub struct TableController<R> {
    rows: Vec<R>,
    columns: ColumnRegistry<R>,
    filters: FilterRegistry,
    state: QueryState,
    snapshot: ViewSnapshot<R>,
}

impl<R: Record + Clone> TableController<R> {
    /// Open a view with the default query state
    pub fn new(rows: Vec<R>, columns: ColumnRegistry<R>, filters: FilterRegistry) -> Self {
        Self::with_state(rows, columns, filters, QueryState::default())
    }

    /// Open a view with an initial query state (sanitized against the registries)
    pub fn with_state(
        rows: Vec<R>,
        columns: ColumnRegistry<R>,
        filters: FilterRegistry,
        state: QueryState,
    ) -> Self {
        let mut state = state.sanitized(&columns, &filters);
        let snapshot = run_pipeline(&rows, &columns, &filters, &mut state);

        Self {
            rows,
            columns,
            filters,
            state,
            snapshot,
        }
    }

    /// Update the search text and go back to the first page
    pub fn set_search(&mut self, text: impl Into<String>) -> &ViewSnapshot<R> {
        self.state.search = text.into();
        self.state.page = 1;
        self.recompute()
    }

    /// Select a facet value, or clear the facet with the "all" sentinel
    ///
    /// Undeclared facets and values outside the declared options leave the
    /// state untouched.
    pub fn set_filter(&mut self, key: &str, value: &str) -> &ViewSnapshot<R> {
        let Some(descriptor) = self.filters.get(key) else {
            return &self.snapshot;
        };

        if is_all(value) {
            self.state.filters.remove(key);
        } else if descriptor.allows(value) {
            self.state
                .filters
                .insert(key.to_string(), value.to_string());
        } else {
            return &self.snapshot;
        }

        self.state.page = 1;
        self.recompute()
    }

    /// Apply a column-header click. The page is kept.
    pub fn set_sort(&mut self, key: &str) -> &ViewSnapshot<R> {
        if self.state.apply_sort_click(key, &self.columns) {
            self.recompute()
        } else {
            &self.snapshot
        }
    }

    /// Request a page; out-of-range values are clamped
    pub fn set_page(&mut self, page: i64) -> &ViewSnapshot<R> {
        self.state.page = usize::try_from(page.max(1)).unwrap_or(usize::MAX);
        self.recompute()
    }

    /// Change the page size (zero becomes one) and go back to the first page
    pub fn set_page_size(&mut self, page_size: usize) -> &ViewSnapshot<R> {
        self.state.page_size = page_size.max(1);
        self.state.page = 1;
        self.recompute()
    }

    /// Swap in a new raw row collection, keeping the query state
    ///
    /// Used after a create, update or delete completes, or after a refresh.
    /// The current page is clamped if the collection shrank.
    pub fn replace_rows(&mut self, rows: Vec<R>) -> &ViewSnapshot<R> {
        self.rows = rows;
        self.recompute()
    }

    /// Clear search and facets, keeping sort and page size
    pub fn reset(&mut self) -> &ViewSnapshot<R> {
        self.state.search.clear();
        self.state.filters.clear();
        self.state.page = 1;
        self.recompute()
    }

    /// Adopt a saved query state
    pub fn restore(&mut self, state: QueryState) -> &ViewSnapshot<R> {
        self.state = state.sanitized(&self.columns, &self.filters);
        self.recompute()
    }

    pub fn snapshot(&self) -> &ViewSnapshot<R> {
        &self.snapshot
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn columns(&self) -> &ColumnRegistry<R> {
        &self.columns
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn pagination_info(&self) -> PaginationInfo {
        self.snapshot.pagination()
    }

    /// Row counts per option of a facet, over the whole raw collection
    pub fn facet_counts(&self, key: &str) -> Option<Vec<(&FilterOption, usize)>> {
        self.filters
            .get(key)
            .map(|descriptor| facet_counts(&self.rows, descriptor))
    }

    fn recompute(&mut self) -> &ViewSnapshot<R> {
        self.snapshot = run_pipeline(&self.rows, &self.columns, &self.filters, &mut self.state);
        &self.snapshot
    }
}

/// Run Filter -> Sort -> Paginate and write the effective page back into `state`
fn run_pipeline<R: Record + Clone>(
    rows: &[R],
    columns: &ColumnRegistry<R>,
    filters: &FilterRegistry,
    state: &mut QueryState,
) -> ViewSnapshot<R> {
    let filtered = filter_rows(rows, &state.search, &state.filters, columns, filters);
    let ordered = sort_rows(
        filtered,
        state.sort_key.as_deref(),
        state.sort_order,
        columns,
    );

    let requested = i64::try_from(state.page).unwrap_or(i64::MAX);
    let page = paginate(&ordered, requested, state.page_size);

    state.page = page.effective_page;

    ViewSnapshot {
        visible_rows: page.visible_rows.iter().map(|row| (*row).clone()).collect(),
        total_items: page.total_items,
        total_pages: page.total_pages,
        effective_page: page.effective_page,
        search: state.search.clone(),
        filters: state.filters.clone(),
        sort_key: state.sort_key.clone(),
        sort_order: state.sort_order,
        page_size: state.page_size,
    }
}
