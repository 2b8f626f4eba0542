//! JSON tile payload decoding.
//!
//! Two shapes are understood:
//!
//! - An object with a `data` array of rows, where each row is
//!   `[time, value, ...]`. An optional `fields` array names the columns; when
//!   it contains `"time"` and one of `"mean"` / `"value"`, those columns are used.
//! - An array of photo description objects.
//!
//! Anything else, including rows or photos that fail to parse, decodes to
//! [`TilePayload::Empty`] so a bad tile draws nothing instead of failing the load.

use serde_json::Value;

use super::{PhotoDescription, PlottablePoint, TilePayload};

const VALUE_FIELDS: [&str; 2] = ["mean", "value"];

/// Decode a JSON tile body into a payload.
pub fn decode_payload(body: &Value) -> TilePayload {
    match body {
        Value::Object(object) => match object.get("data") {
            Some(Value::Array(rows)) => {
                let (time_col, value_col) = columns(object.get("fields"));
                decode_rows(rows, time_col, value_col)
            }
            _ => {
                tracing::debug!("Tile object without a data array, treating as empty");
                TilePayload::Empty
            }
        },
        Value::Array(items) => decode_photos(items),
        _ => TilePayload::Empty,
    }
}

/// Resolve the time and value column indices from a `fields` header.
fn columns(fields: Option<&Value>) -> (usize, usize) {
    let Some(Value::Array(fields)) = fields else {
        return (0, 1);
    };
    let names: Vec<&str> = fields.iter().filter_map(Value::as_str).collect();
    let time_col = names.iter().position(|name| *name == "time");
    let value_col = names
        .iter()
        .position(|name| VALUE_FIELDS.contains(name));
    match (time_col, value_col) {
        (Some(time), Some(value)) => (time, value),
        _ => (0, 1),
    }
}

fn decode_rows(rows: &[Value], time_col: usize, value_col: usize) -> TilePayload {
    let mut points = Vec::with_capacity(rows.len());
    for row in rows {
        let Value::Array(cells) = row else {
            return malformed("row is not an array");
        };
        let time = cells.get(time_col).and_then(Value::as_f64);
        let value = cells.get(value_col).and_then(Value::as_f64);
        match (time, value) {
            (Some(time), Some(value)) => points.push(PlottablePoint::new(time, value)),
            _ => return malformed("row is missing a numeric time or value"),
        }
    }
    TilePayload::points(points)
}

fn decode_photos(items: &[Value]) -> TilePayload {
    let mut photos = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<PhotoDescription>(item.clone()) {
            Ok(photo) => photos.push(photo),
            Err(e) => return malformed(&e.to_string()),
        }
    }
    TilePayload::Photos(photos)
}

fn malformed(reason: &str) -> TilePayload {
    tracing::debug!(reason, "Malformed tile payload, treating as empty");
    TilePayload::Empty
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_rows_default_columns() {
        let body = json!({ "data": [[2.0, 20.0], [1.0, 10.0]] });
        let TilePayload::Points(points) = decode_payload(&body) else {
            panic!("Expected points");
        };
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], PlottablePoint::new(1.0, 10.0));
        assert_eq!(points[1], PlottablePoint::new(2.0, 20.0));
    }

    #[test]
    fn test_decode_rows_named_columns() {
        let body = json!({
            "level": 0,
            "offset": 4,
            "fields": ["count", "time", "stddev", "mean"],
            "data": [[3, 100.5, 0.2, 7.25]]
        });
        let TilePayload::Points(points) = decode_payload(&body) else {
            panic!("Expected points");
        };
        assert_eq!(points, vec![PlottablePoint::new(100.5, 7.25)]);
    }

    #[test]
    fn test_decode_empty_data_is_points() {
        let body = json!({ "data": [] });
        assert_eq!(decode_payload(&body), TilePayload::Points(vec![]));
    }

    #[test]
    fn test_decode_photos() {
        let body = json!([
            { "id": 7, "begin_d": 1000.0, "end_d": 1001.0, "tags": ["beach"], "count": 2 },
            { "begin_d": 1500.0 }
        ]);
        let TilePayload::Photos(photos) = decode_payload(&body) else {
            panic!("Expected photos");
        };
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].id, 7);
        assert_eq!(photos[0].count, 2);
        assert_eq!(photos[0].tags, vec!["beach".to_string()]);
        assert_eq!(photos[1].id, -1);
        assert_eq!(photos[1].count, 1);
        assert!(!photos[1].nsfw);
    }

    #[test]
    fn test_decode_unknown_shapes_are_empty() {
        assert_eq!(decode_payload(&json!(null)), TilePayload::Empty);
        assert_eq!(decode_payload(&json!("text")), TilePayload::Empty);
        assert_eq!(decode_payload(&json!(42)), TilePayload::Empty);
        assert_eq!(decode_payload(&json!({ "other": 1 })), TilePayload::Empty);
    }

    #[test]
    fn test_decode_malformed_rows_are_empty() {
        assert_eq!(
            decode_payload(&json!({ "data": [[1.0, "x"]] })),
            TilePayload::Empty
        );
        assert_eq!(decode_payload(&json!({ "data": [5] })), TilePayload::Empty);
    }

    #[test]
    fn test_decode_malformed_photo_is_empty() {
        assert_eq!(decode_payload(&json!([{ "id": 1 }])), TilePayload::Empty);
    }
}
