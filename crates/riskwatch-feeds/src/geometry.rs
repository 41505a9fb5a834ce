//! GeoJSON position helpers.
//!
//! Alert feeds mostly publish polygons. A single representative point is
//! taken from each geometry: the position itself for `Point`, the vertex
//! mean of the outer ring for `Polygon`, and of the first polygon's outer
//! ring for `MultiPolygon`.

use riskwatch_types::Coordinates;
use serde_json::Value;

/// Representative `(lat, lon)` of a GeoJSON geometry object.
///
/// Returns `None` for missing, empty, or unsupported geometries.
pub fn point_from_geometry(geometry: Option<&Value>) -> Option<Coordinates> {
    let geometry = geometry?;
    let coords = geometry.get("coordinates")?;

    match geometry.get("type").and_then(Value::as_str)? {
        "Point" => position(coords),
        "Polygon" => ring_centroid(coords.get(0)?),
        "MultiPolygon" => ring_centroid(coords.get(0)?.get(0)?),
        _ => None,
    }
}

/// A GeoJSON position `[lon, lat, ...]` as coordinates.
fn position(value: &Value) -> Option<Coordinates> {
    let lon = value.get(0).and_then(Value::as_f64);
    let lat = value.get(1).and_then(Value::as_f64);
    Coordinates::from_parts(lat, lon)
}

/// Vertex mean of a linear ring. Malformed vertices are skipped.
#[allow(clippy::cast_precision_loss)]
fn ring_centroid(ring: &Value) -> Option<Coordinates> {
    let (sum_lat, sum_lon, count) = ring
        .as_array()?
        .iter()
        .filter_map(position)
        .fold((0.0_f64, 0.0_f64, 0_usize), |(lat, lon, n), p| {
            (lat + p.lat, lon + p.lon, n.saturating_add(1))
        });

    if count == 0 {
        return None;
    }
    let n = count as f64;
    Coordinates::from_parts(Some(sum_lat / n), Some(sum_lon / n))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn point_swaps_lon_lat() {
        let geometry = json!({"type": "Point", "coordinates": [-97.5, 35.25]});
        let c = point_from_geometry(Some(&geometry)).unwrap();
        assert_eq!(c.lat, 35.25);
        assert_eq!(c.lon, -97.5);
    }

    #[test]
    fn polygon_uses_ring_mean() {
        let geometry = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 4.0], [0.0, 4.0]]]
        });
        let c = point_from_geometry(Some(&geometry)).unwrap();
        assert_eq!(c.lat, 2.0);
        assert_eq!(c.lon, 1.0);
    }

    #[test]
    fn multipolygon_uses_first_ring() {
        let geometry = json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[10.0, 10.0], [12.0, 12.0]]],
                [[[50.0, 50.0]]]
            ]
        });
        let c = point_from_geometry(Some(&geometry)).unwrap();
        assert_eq!(c.lat, 11.0);
        assert_eq!(c.lon, 11.0);
    }

    #[test]
    fn missing_or_unknown_geometry_is_none() {
        assert!(point_from_geometry(None).is_none());
        assert!(point_from_geometry(Some(&Value::Null)).is_none());
        let line = json!({"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]});
        assert!(point_from_geometry(Some(&line)).is_none());
        let empty = json!({"type": "Polygon", "coordinates": [[]]});
        assert!(point_from_geometry(Some(&empty)).is_none());
    }

    #[test]
    fn malformed_vertices_are_skipped() {
        let geometry = json!({
            "type": "Polygon",
            "coordinates": [[[4.0, 2.0], ["x", 1.0], [6.0]]]
        });
        let c = point_from_geometry(Some(&geometry)).unwrap();
        assert_eq!(c.lat, 2.0);
        assert_eq!(c.lon, 4.0);
    }
}
