use crate::prelude::*;
use admintable_core::{JsonRow, Record, Value};
use log::info;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// JSON file holding the raw rows of one view
///
/// Accepts either a top-level array of objects or an object with a `rows`
/// array. Writes keep whichever shape the file had.
#[derive(Debug, Clone)]
pub struct RowStore {
    path: PathBuf,
    id_field: String,
}

impl RowStore {
    pub fn new(path: impl Into<PathBuf>, id_field: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id_field: id_field.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<JsonRow>> {
        let document = self.read_document()?;
        Ok(parse_rows(document)?)
    }

    /// Last modification time of the data file
    pub fn modified(&self) -> Result<SystemTime> {
        std::fs::metadata(&self.path)
            .and_then(|metadata| metadata.modified())
            .with_context(|| f!("Failed to stat {}", self.path.display()))
    }

    /// Remove the row whose id field displays as `id` and return the remaining rows
    pub fn delete(&self, id: &str) -> Result<Vec<JsonRow>> {
        let mut document = self.read_document()?;
        let rows = rows_mut(&mut document)?;

        let position = rows
            .iter()
            .position(|row| matches_id(row, &self.id_field, id))
            .ok_or_else(|| Error::RowNotFound(f!("{}={}", self.id_field, id)))?;
        rows.remove(position);

        let text = serde_json::to_string_pretty(&document)?;
        std::fs::write(&self.path, text + "\n")
            .with_context(|| f!("Failed to write {}", self.path.display()))?;

        info!(
            "Deleted row {}={} from {}",
            self.id_field,
            id,
            self.path.display()
        );

        Ok(parse_rows(document)?)
    }

    fn read_document(&self) -> Result<serde_json::Value> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| f!("Failed to read {}", self.path.display()))?;

        serde_json::from_str(&text)
            .map_err(|e| Error::InvalidData(f!("{}: {}", self.path.display(), e)).into())
    }
}

fn matches_id(row: &serde_json::Value, id_field: &str, id: &str) -> bool {
    match row.field(id_field) {
        Value::Null => false,
        value => value.display() == id,
    }
}

fn rows_mut(document: &mut serde_json::Value) -> Result<&mut Vec<serde_json::Value>, Error> {
    match document {
        serde_json::Value::Array(rows) => Ok(rows),
        serde_json::Value::Object(object) => match object.get_mut("rows") {
            Some(serde_json::Value::Array(rows)) => Ok(rows),
            _ => Err(Error::InvalidData(
                "expected an object with a `rows` array".to_string(),
            )),
        },
        _ => Err(Error::InvalidData(
            "expected an array of rows or an object with a `rows` array".to_string(),
        )),
    }
}

/// Turn a parsed data document into rows
pub fn parse_rows(mut document: serde_json::Value) -> Result<Vec<JsonRow>, Error> {
    let rows = std::mem::take(rows_mut(&mut document)?);

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| match row {
            serde_json::Value::Object(object) => Ok(object),
            other => Err(Error::InvalidData(f!(
                "row {} is not an object: {}",
                index + 1,
                other
            ))),
        })
        .collect()
}
