//! Sort engine
//!
//! Orders filtered rows by a single column. Sorting is stable: rows that
//! compare equal keep their input order in both directions, because the
//! direction only flips the comparator result.

use crate::column::ColumnRegistry;
use crate::error::QueryError;
use crate::record::Record;
use crate::value::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `Asc` becomes `Desc` and back. There is no "unsorted" step.
    pub fn toggle(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    /// Apply the direction to an ascending comparison result
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(QueryError::InvalidSortOrder(s.to_string())),
        }
    }
}

/// Compare two values, dispatching on their kinds
///
/// - both numbers: numeric order
/// - both temporal: epoch milliseconds
/// - both booleans: `false` before `true`
/// - both text: basic string comparison
/// - anything else: compare the stringified values
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(*x, *y),
        (Value::Temporal { at: x, .. }, Value::Temporal { at: y, .. }) => {
            x.timestamp_millis().cmp(&y.timestamp_millis())
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => compare_text(x, y),
        _ => compare_text(&a.display(), &b.display()),
    }
}

/// Case-insensitive comparison with byte order as the tiebreak
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}

fn compare_numbers(x: f64, y: f64) -> Ordering {
    if x == y {
        Ordering::Equal
    } else {
        x.total_cmp(&y)
    }
}

/// Order rows by the column named `sort_key`
///
/// Returns the input unchanged when no key is set or the key does not name a
/// sortable column.
pub fn sort_rows<'a, R: Record>(
    rows: Vec<&'a R>,
    sort_key: Option<&str>,
    order: SortOrder,
    columns: &ColumnRegistry<R>,
) -> Vec<&'a R> {
    let Some(column) = sort_key
        .and_then(|key| columns.get(key))
        .filter(|column| column.is_sortable())
    else {
        return rows;
    };

    let mut rows = rows;

    if let Some(comparator) = column.comparator_fn() {
        rows.sort_by(|a, b| order.apply(comparator(*a, *b)));
        return rows;
    }

    // Read every sort key once instead of once per comparison.
    let mut keyed: Vec<(Value, &'a R)> = rows
        .into_iter()
        .map(|row| (column.sort_value(row), row))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| order.apply(compare_sort_keys(a, b)));
    keyed.into_iter().map(|(_, row)| row).collect()
}

/// Total order over sort keys of one column
///
/// Values of the same kind keep their native order. Across kinds the rank
/// is missing, boolean, number, temporal, then text.
fn compare_sort_keys(a: &Value, b: &Value) -> Ordering {
    let (kind_a, kind_b) = (a.kind(), b.kind());
    if kind_a == kind_b {
        compare_values(a, b)
    } else {
        kind_rank(kind_a).cmp(&kind_rank(kind_b))
    }
}

fn kind_rank(kind: ValueKind) -> u8 {
    match kind {
        ValueKind::Null => 0,
        ValueKind::Bool => 1,
        ValueKind::Number => 2,
        ValueKind::Temporal => 3,
        ValueKind::Text => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::record::JsonRow;
    use serde_json::json;

    fn rows(values: Vec<serde_json::Value>) -> Vec<JsonRow> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn registry() -> ColumnRegistry<JsonRow> {
        ColumnRegistry::new(vec![
            Column::new("id", "ID").sortable(),
            Column::new("name", "Name").sortable(),
            Column::new("createdAt", "Created").sortable(),
            Column::new("published", "Published").sortable(),
            Column::new("body", "Body"),
        ])
        .unwrap()
    }

    fn ids(sorted: &[&JsonRow]) -> Vec<String> {
        sorted.iter().map(|row| row.field("id").display()).collect()
    }

    #[test]
    fn test_compare_numbers() {
        assert_eq!(
            compare_values(&Value::Number(2.0), &Value::Number(10.0)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&Value::Number(0.0), &Value::Number(-0.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_compare_booleans_false_first() {
        assert_eq!(
            compare_values(&Value::Bool(false), &Value::Bool(true)),
            Ordering::Less
        );
    }

    #[test]
    fn test_compare_temporal_by_instant() {
        let earlier = Value::from_text("2024-01-01");
        let later = Value::from_text("2024-01-01T00:00:01Z");
        assert_eq!(compare_values(&earlier, &later), Ordering::Less);
    }

    #[test]
    fn test_compare_text_case_insensitive() {
        assert_eq!(compare_text("alpha", "Beta"), Ordering::Less);
        assert_eq!(compare_text("Beta", "alpha"), Ordering::Greater);
        assert_eq!(compare_text("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_compare_mixed_stringifies() {
        assert_eq!(
            compare_values(&Value::Null, &Value::Number(5.0)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&Value::Text("10".into()), &Value::Number(9.0)),
            Ordering::Less
        );
    }

    #[test]
    fn test_sort_order_parse_and_toggle() {
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("sideways".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::Asc.toggle(), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.toggle(), SortOrder::Asc);
    }

    #[test]
    fn test_sort_without_key_keeps_order() {
        let data = rows(vec![json!({"id": 2}), json!({"id": 1})]);
        let refs: Vec<&JsonRow> = data.iter().collect();

        let sorted = sort_rows(refs, None, SortOrder::Asc, &registry());
        assert_eq!(ids(&sorted), vec!["2", "1"]);
    }

    #[test]
    fn test_sort_ignores_non_sortable_and_unknown_keys() {
        let data = rows(vec![json!({"id": 2, "body": "b"}), json!({"id": 1, "body": "a"})]);

        let sorted = sort_rows(data.iter().collect(), Some("body"), SortOrder::Asc, &registry());
        assert_eq!(ids(&sorted), vec!["2", "1"]);

        let sorted = sort_rows(data.iter().collect(), Some("nope"), SortOrder::Asc, &registry());
        assert_eq!(ids(&sorted), vec!["2", "1"]);
    }

    #[test]
    fn test_sort_by_name_and_date() {
        let data = rows(vec![
            json!({"id": 1, "name": "Beta", "createdAt": "2024-01-02"}),
            json!({"id": 2, "name": "Alpha", "createdAt": "2024-01-01"}),
        ]);

        let by_name = sort_rows(data.iter().collect(), Some("name"), SortOrder::Asc, &registry());
        assert_eq!(ids(&by_name), vec!["2", "1"]);

        let by_date = sort_rows(
            data.iter().collect(),
            Some("createdAt"),
            SortOrder::Desc,
            &registry(),
        );
        assert_eq!(ids(&by_date), vec!["1", "2"]);
    }

    #[test]
    fn test_sort_is_stable_in_both_directions() {
        let data = rows(vec![
            json!({"id": 1, "published": true}),
            json!({"id": 2, "published": false}),
            json!({"id": 3, "published": true}),
            json!({"id": 4, "published": false}),
        ]);

        let asc = sort_rows(data.iter().collect(), Some("published"), SortOrder::Asc, &registry());
        assert_eq!(ids(&asc), vec!["2", "4", "1", "3"]);

        let desc = sort_rows(
            data.iter().collect(),
            Some("published"),
            SortOrder::Desc,
            &registry(),
        );
        assert_eq!(ids(&desc), vec!["1", "3", "2", "4"]);
    }

    #[test]
    fn test_sort_missing_values_first_ascending() {
        let data = rows(vec![
            json!({"id": 1, "name": "Zed"}),
            json!({"id": 2}),
            json!({"id": 3, "name": "Ann"}),
        ]);

        let sorted = sort_rows(data.iter().collect(), Some("name"), SortOrder::Asc, &registry());
        assert_eq!(ids(&sorted), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_sort_mixed_column_keeps_numeric_order() {
        let data = rows(vec![
            json!({"id": 1, "name": 2}),
            json!({"id": 2, "name": 10}),
            json!({"id": 3, "name": "x"}),
        ]);

        let sorted = sort_rows(data.iter().collect(), Some("name"), SortOrder::Asc, &registry());
        assert_eq!(ids(&sorted), vec!["1", "2", "3"]);

        let sorted = sort_rows(data.iter().collect(), Some("name"), SortOrder::Desc, &registry());
        assert_eq!(ids(&sorted), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_sort_mixed_column_keeps_date_order() {
        let data = rows(vec![
            json!({"id": 1, "createdAt": "2024-03-01"}),
            json!({"id": 2, "createdAt": "n/a"}),
            json!({"id": 3, "createdAt": "2023-12-31"}),
            json!({"id": 4}),
        ]);

        let sorted = sort_rows(
            data.iter().collect(),
            Some("createdAt"),
            SortOrder::Asc,
            &registry(),
        );
        assert_eq!(ids(&sorted), vec!["4", "3", "1", "2"]);
    }

    #[test]
    fn test_sort_uses_column_comparator() {
        let columns: ColumnRegistry<JsonRow> = ColumnRegistry::new(vec![Column::new(
            "status", "Status",
        )
        .sortable()
        .comparator(|a: &JsonRow, b: &JsonRow| {
            let rank = |row: &JsonRow| match row.field("status").display().as_str() {
                "draft" => 0,
                "review" => 1,
                "published" => 2,
                _ => 3,
            };
            rank(a).cmp(&rank(b))
        })])
        .unwrap();

        let data = rows(vec![
            json!({"id": 1, "status": "published"}),
            json!({"id": 2, "status": "draft"}),
            json!({"id": 3, "status": "review"}),
        ]);

        let sorted = sort_rows(data.iter().collect(), Some("status"), SortOrder::Asc, &columns);
        assert_eq!(ids(&sorted), vec!["2", "3", "1"]);

        let sorted = sort_rows(data.iter().collect(), Some("status"), SortOrder::Desc, &columns);
        assert_eq!(ids(&sorted), vec!["1", "3", "2"]);
    }
}
