//! Error types for registry construction and query parsing
//!
//! The pipeline itself never fails: bad state is clamped or ignored. These
//! errors only surface when a collaborator declares registries or builds a
//! query from text.

/// Error raised while declaring column or filter registries
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate column key: {0}")]
    DuplicateColumn(String),

    #[error("Duplicate filter key: {0}")]
    DuplicateFilter(String),

    #[error("Column key must not be empty")]
    EmptyColumnKey,

    #[error("Filter key must not be empty")]
    EmptyFilterKey,
}

/// Error raised while parsing query arguments
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid filter argument: {0}. Expected KEY=VALUE")]
    InvalidFilter(String),

    #[error("Invalid sort argument: {0}. Expected KEY or KEY:asc|desc")]
    InvalidSort(String),

    #[error("Invalid sort order: {0}. Expected asc or desc")]
    InvalidSortOrder(String),
}
