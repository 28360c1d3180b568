//! Core library for admintable
//!
//! This crate implements the **Functional Core** of the admintable application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The admintable project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`admintable_core`** (this crate): the query pipeline over in-memory rows, with zero I/O
//! - **`admintable`**: data loading, view configuration and terminal rendering (the Imperative Shell)
//!
//! Every management view (pages, articles, blogs, ...) runs the same pipeline:
//!
//! ```text
//! raw rows -> Filter (search + facets) -> Sort -> Paginate -> visible rows
//! ```
//!
//! The pipeline is re-run to completion after every state change, so a
//! [`ViewSnapshot`] never mixes rows from one query state with the metadata
//! of another.
//!
//! # Module Organization
//!
//! - [`value`]: Field values and their comparison kinds
//! - [`record`]: The [`Record`] trait for reading fields from rows
//! - [`column`]: Column descriptors and the per-view [`ColumnRegistry`]
//! - [`filter`]: Facet descriptors and the filter engine
//! - [`sort`]: Sort order and the sort engine
//! - [`pagination`]: Page windowing and pagination metadata
//! - [`query`]: The serializable [`QueryState`]
//! - [`controller`]: The [`TableController`] that owns a view's state
//!
//! # Example Usage
//!
//! ```rust
//! use admintable_core::{Column, ColumnRegistry, FilterDescriptor, FilterRegistry, JsonRow, TableController};
//! use serde_json::json;
//!
//! let rows: Vec<JsonRow> = vec![
//!     json!({"title": "Beta", "status": "draft"}),
//!     json!({"title": "Alpha", "status": "published"}),
//! ]
//! .into_iter()
//! .filter_map(|row| row.as_object().cloned())
//! .collect();
//!
//! let columns = ColumnRegistry::new(vec![Column::new("title", "Title").sortable()]).unwrap();
//! let filters = FilterRegistry::new(vec![FilterDescriptor::new(
//!     "status",
//!     "Status",
//!     ["draft", "published"],
//! )])
//! .unwrap();
//!
//! let mut controller = TableController::new(rows, columns, filters);
//! let snapshot = controller.set_sort("title");
//! assert_eq!(snapshot.visible_rows[0]["title"], "Alpha");
//! ```

pub mod column;
pub mod controller;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod query;
pub mod record;
pub mod sort;
pub mod value;

pub use column::{Column, ColumnRegistry};
pub use controller::{TableController, ViewSnapshot};
pub use error::{QueryError, RegistryError};
pub use filter::{FilterDescriptor, FilterOption, FilterRegistry, FILTER_ALL};
pub use pagination::{PageLink, PaginationInfo};
pub use query::{QueryState, DEFAULT_PAGE_SIZE};
pub use record::{JsonRow, Record};
pub use sort::SortOrder;
pub use value::{Value, ValueKind};
