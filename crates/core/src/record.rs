//! Row access
//!
//! The engine never owns or builds rows. It only reads fields through the
//! [`Record`] trait, so any domain type (a page, an article, a blog entry or a
//! raw JSON object) can be displayed in a management view.

use crate::value::Value;
use std::rc::Rc;
use std::sync::Arc;

/// A raw JSON object row, as returned by the data-fetch collaborator
pub type JsonRow = serde_json::Map<String, serde_json::Value>;

/// Read-only field access for a row
pub trait Record {
    /// Return the value stored under `key`, or [`Value::Null`] when missing
    fn field(&self, key: &str) -> Value;
}

impl Record for JsonRow {
    fn field(&self, key: &str) -> Value {
        lookup(self, key).map(Value::from_json).unwrap_or(Value::Null)
    }
}

impl Record for serde_json::Value {
    fn field(&self, key: &str) -> Value {
        self.as_object()
            .map(|object| object.field(key))
            .unwrap_or(Value::Null)
    }
}

impl<T: Record + ?Sized> Record for &T {
    fn field(&self, key: &str) -> Value {
        (**self).field(key)
    }
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn field(&self, key: &str) -> Value {
        (**self).field(key)
    }
}

impl<T: Record + ?Sized> Record for Rc<T> {
    fn field(&self, key: &str) -> Value {
        (**self).field(key)
    }
}

impl<T: Record + ?Sized> Record for Arc<T> {
    fn field(&self, key: &str) -> Value {
        (**self).field(key)
    }
}

/// Resolve a key against a JSON object
///
/// An exact key match wins; otherwise a dotted key (`author.name`) descends
/// into nested objects.
fn lookup<'a>(object: &'a JsonRow, key: &str) -> Option<&'a serde_json::Value> {
    if let Some(value) = object.get(key) {
        return Some(value);
    }

    let mut parts = key.split('.');
    let mut current = object.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> JsonRow {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_json_row_field() {
        let row = row(json!({"id": 1, "name": "Alpha"}));

        assert_eq!(row.field("id"), Value::Number(1.0));
        assert_eq!(row.field("name"), Value::Text("Alpha".to_string()));
        assert_eq!(row.field("missing"), Value::Null);
    }

    #[test]
    fn test_dotted_path_descends() {
        let row = row(json!({"author": {"name": "Ada", "meta": {"karma": 7}}}));

        assert_eq!(row.field("author.name"), Value::Text("Ada".to_string()));
        assert_eq!(row.field("author.meta.karma"), Value::Number(7.0));
        assert_eq!(row.field("author.email"), Value::Null);
        assert_eq!(row.field("author.name.first"), Value::Null);
    }

    #[test]
    fn test_exact_dotted_key_wins() {
        let row = row(json!({"seo.title": "flat", "seo": {"title": "nested"}}));

        assert_eq!(row.field("seo.title"), Value::Text("flat".to_string()));
    }

    #[test]
    fn test_non_object_json_has_no_fields() {
        assert_eq!(json!([1, 2]).field("0"), Value::Null);
        assert_eq!(json!({"a": true}).field("a"), Value::Bool(true));
    }

    #[test]
    fn test_smart_pointers_delegate() {
        let row = Arc::new(row(json!({"slug": "home"})));

        assert_eq!(row.field("slug"), Value::Text("home".to_string()));
        assert_eq!((&row).field("slug"), Value::Text("home".to_string()));
    }
}
