#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Generic {0}")]
    Generic(String),

    #[error("Unknown view: {name} (available: {available})")]
    UnknownView { name: String, available: String },

    #[error("Row not found: {0}")]
    RowNotFound(String),

    #[error("Invalid row data: {0}")]
    InvalidData(String),
}
