//! Column registry
//!
//! Static description of every displayable field of a view: how to read it,
//! label it, sort it and render it. Declared once per view and never mutated.

use crate::error::RegistryError;
use crate::record::Record;
use crate::sort::compare_values;
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Projects a row into display text. `None` means the value could not be rendered.
pub type RenderFn<R> = Arc<dyn Fn(&R) -> Option<String> + Send + Sync>;

/// Explicit ordering for a column, taking precedence over value-kind dispatch
pub type CompareFn<R> = Arc<dyn Fn(&R, &R) -> Ordering + Send + Sync>;

/// Description of one displayable field
pub struct Column<R> {
    key: String,
    label: String,
    sortable: bool,
    render: Option<RenderFn<R>>,
    comparator: Option<CompareFn<R>>,
}

impl<R> Column<R> {
    /// Create a non-sortable column without render or comparator
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: false,
            render: None,
            comparator: None,
        }
    }

    /// Mark the column as sortable.
    pub fn sortable(self) -> Self {
        self.with_sortable(true)
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Attach a render function used for display and search.
    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&R) -> Option<String> + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    /// Attach an explicit comparator used when sorting by this column.
    pub fn comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&R, &R) -> Ordering + Send + Sync + 'static,
    {
        self.comparator = Some(Arc::new(comparator));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn has_render(&self) -> bool {
        self.render.is_some()
    }

    pub fn comparator_fn(&self) -> Option<&CompareFn<R>> {
        self.comparator.as_ref()
    }
}

impl<R: Record> Column<R> {
    /// Raw field value under this column's key
    pub fn value(&self, row: &R) -> Value {
        row.field(&self.key)
    }

    /// Display text for a row
    ///
    /// Uses the render function when it resolves, then the raw field, then `""`.
    pub fn project(&self, row: &R) -> String {
        self.render
            .as_ref()
            .and_then(|render| render(row))
            .unwrap_or_else(|| self.value(row).display())
    }

    /// Value used as the sort key for a row
    ///
    /// The raw field, unless it is missing and a render function resolves.
    pub fn sort_value(&self, row: &R) -> Value {
        match self.value(row) {
            Value::Null => self
                .render
                .as_ref()
                .and_then(|render| render(row))
                .map(|text| Value::from_text(&text))
                .unwrap_or(Value::Null),
            value => value,
        }
    }

    /// Compare two rows under this column, ignoring sort direction
    pub fn compare(&self, a: &R, b: &R) -> Ordering {
        match &self.comparator {
            Some(comparator) => comparator(a, b),
            None => compare_values(&self.sort_value(a), &self.sort_value(b)),
        }
    }
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            label: self.label.clone(),
            sortable: self.sortable,
            render: self.render.clone(),
            comparator: self.comparator.clone(),
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("render", &self.render.is_some())
            .field("comparator", &self.comparator.is_some())
            .finish()
    }
}

/// Ordered set of columns for one view
pub struct ColumnRegistry<R> {
    columns: Vec<Column<R>>,
}

impl<R> ColumnRegistry<R> {
    /// Declare the columns of a view, in display order
    pub fn new(columns: impl IntoIterator<Item = Column<R>>) -> Result<Self, RegistryError> {
        let columns: Vec<Column<R>> = columns.into_iter().collect();

        let mut seen = HashSet::new();
        for column in &columns {
            if column.key.trim().is_empty() {
                return Err(RegistryError::EmptyColumnKey);
            }
            if !seen.insert(column.key.as_str()) {
                return Err(RegistryError::DuplicateColumn(column.key.clone()));
            }
        }

        Ok(Self { columns })
    }

    pub fn get(&self, key: &str) -> Option<&Column<R>> {
        self.columns.iter().find(|column| column.key == key)
    }

    /// Whether `key` names a declared, sortable column
    pub fn is_sortable(&self, key: &str) -> bool {
        self.get(key).is_some_and(Column::is_sortable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column<R>> {
        self.columns.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::key)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<R> Clone for ColumnRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            columns: self.columns.clone(),
        }
    }
}

impl<R> fmt::Debug for ColumnRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.columns.iter()).finish()
    }
}
