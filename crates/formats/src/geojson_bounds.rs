use foundation::bounds::Aabb2;
use serde_json::Value;

/// Lon/lat extent of a GeoJSON document, for a map's fit-to-data view.
///
/// Accepts a `FeatureCollection`, a single `Feature` or a bare geometry.
/// Coordinates are walked recursively until a numeric position is reached, so
/// every geometry type (and `GeometryCollection`) is handled the same way.
/// Returns `None` when no position was found.
pub fn geojson_bounds(doc: &Value) -> Option<Aabb2> {
    let mut bounds = Aabb2::empty();

    match doc.get("type").and_then(|t| t.as_str()) {
        Some("FeatureCollection") => {
            for feature in doc
                .get("features")
                .and_then(|f| f.as_array())
                .into_iter()
                .flatten()
            {
                visit_feature(feature, &mut bounds);
            }
        }
        _ => visit_feature(doc, &mut bounds),
    }

    if bounds.is_empty() {
        None
    } else {
        Some(bounds)
    }
}

pub fn geojson_bounds_str(payload: &str) -> Result<Option<Aabb2>, serde_json::Error> {
    let doc: Value = serde_json::from_str(payload)?;
    Ok(geojson_bounds(&doc))
}

fn visit_feature(value: &Value, bounds: &mut Aabb2) {
    let geometry = if value.get("type").and_then(|t| t.as_str()) == Some("Feature") {
        match value.get("geometry") {
            Some(g) if !g.is_null() => g,
            _ => return,
        }
    } else {
        value
    };
    visit_geometry(geometry, bounds);
}

fn visit_geometry(geometry: &Value, bounds: &mut Aabb2) {
    if let Some(parts) = geometry.get("geometries").and_then(|g| g.as_array()) {
        for part in parts {
            visit_geometry(part, bounds);
        }
        return;
    }
    if let Some(coords) = geometry.get("coordinates") {
        walk_coordinates(coords, bounds);
    }
}

fn walk_coordinates(coords: &Value, bounds: &mut Aabb2) {
    let Some(arr) = coords.as_array() else {
        return;
    };
    if arr.first().is_some_and(|v| v.is_number()) {
        if let (Some(x), Some(y)) = (
            arr.first().and_then(|v| v.as_f64()),
            arr.get(1).and_then(|v| v.as_f64()),
        ) {
            bounds.expand_point([x, y]);
        }
        return;
    }
    for child in arr {
        walk_coordinates(child, bounds);
    }
}
