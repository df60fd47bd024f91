//! Map panel configuration handed to MapLibre as JSON.

use formats::geojson_bounds::geojson_bounds;
use serde::Serialize;
use serde_json::{Value, json};

/// Source id the vector data is registered under.
pub const DATA_SOURCE_ID: &str = "hia";

const BASEMAP_TILES: &str = "https://basemaps.cartocdn.com/dark_nolabels/{z}/{x}/{y}.png";
const LABEL_TILES: &str = "https://basemaps.cartocdn.com/dark_only_labels/{z}/{x}/{y}.png";
const ATTRIBUTION: &str = "© OpenStreetMap, © CARTO";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub antialias: bool,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0],
            zoom: 2.0,
            pitch: 48.0,
            bearing: -10.0,
            antialias: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitOptions {
    pub padding: u32,
    /// Milliseconds.
    pub duration: u32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            padding: 40,
            duration: 900,
        }
    }
}

/// Spreads one tile template over the numbered CDN hosts.
fn tile_urls(template: &str) -> Vec<String> {
    let mut urls = vec![template.to_string()];
    for host in ["a", "b", "c"] {
        urls.push(template.replacen("https://", &format!("https://{host}."), 1));
    }
    urls
}

/// Tokenless dark raster basemap with a separate label overlay.
pub fn map_style() -> Value {
    json!({
        "version": 8,
        "light": { "anchor": "viewport", "color": "#ffffff", "intensity": 0.9 },
        "glyphs": "https://demotiles.maplibre.org/font/{fontstack}/{range}.pbf",
        "sources": {
            "basemap": {
                "type": "raster",
                "tiles": tile_urls(BASEMAP_TILES),
                "tileSize": 256,
                "attribution": ATTRIBUTION
            },
            "labels": {
                "type": "raster",
                "tiles": tile_urls(LABEL_TILES),
                "tileSize": 256,
                "attribution": ATTRIBUTION
            }
        },
        "layers": [
            { "id": "background", "type": "background", "paint": { "background-color": "#0e1428" } },
            {
                "id": "basemap-tiles",
                "type": "raster",
                "source": "basemap",
                "paint": {
                    "raster-opacity": 0.85,
                    "raster-contrast": 0.3,
                    "raster-brightness-min": 0.15,
                    "raster-brightness-max": 0.95,
                    "raster-saturation": 0.25
                }
            },
            {
                "id": "basemap-labels",
                "type": "raster",
                "source": "labels",
                "paint": {
                    "raster-opacity": 1.0,
                    "raster-brightness-min": 0.6,
                    "raster-brightness-max": 1.0,
                    "raster-contrast": 0.5,
                    "raster-saturation": 0
                }
            }
        ]
    })
}

fn geometry_type_is(types: [&str; 2]) -> Value {
    json!([
        "any",
        ["==", ["geometry-type"], types[0]],
        ["==", ["geometry-type"], types[1]]
    ])
}

/// Data layers drawn over the basemap: extruded polygons, outlines, roads
/// and the highlighted site boundary.
pub fn data_layers(source: &str) -> Vec<Value> {
    let lines = geometry_type_is(["LineString", "MultiLineString"]);
    vec![
        json!({
            "id": format!("{source}-extrusion"),
            "type": "fill-extrusion",
            "source": source,
            "filter": geometry_type_is(["Polygon", "MultiPolygon"]),
            "paint": {
                "fill-extrusion-color": "#a855f7",
                "fill-extrusion-height": ["coalesce", ["to-number", ["get", "height"]], 0],
                "fill-extrusion-base": ["coalesce", ["to-number", ["get", "base_height"]], 0],
                "fill-extrusion-opacity": 1.0,
                "fill-extrusion-vertical-gradient": true
            }
        }),
        json!({
            "id": format!("{source}-outline"),
            "type": "line",
            "source": source,
            "paint": { "line-color": "#2a3140", "line-width": 1 }
        }),
        json!({
            "id": format!("{source}-roads"),
            "type": "line",
            "source": source,
            "filter": lines.clone(),
            "layout": { "line-cap": "round", "line-join": "round" },
            "paint": {
                "line-color": ["case", ["has", "road_color"], ["get", "road_color"], "#94a3b8"],
                "line-opacity": 1.0,
                "line-width": ["interpolate", ["linear"], ["zoom"], 10, 1.6, 14, 2.8, 16, 5, 18, 8]
            }
        }),
        json!({
            "id": format!("{source}-site-boundary"),
            "type": "line",
            "source": source,
            "filter": [
                "all",
                lines,
                [
                    "any",
                    ["==", ["get", "type"], "site"],
                    ["==", ["get", "category"], "site"],
                    ["==", ["get", "category"], "site_boundary"],
                    ["==", ["get", "role"], "site_boundary"],
                    ["==", ["get", "site"], true],
                    ["==", ["get", "is_site"], true],
                    ["==", ["get", "site"], 1],
                    ["==", ["get", "is_site"], 1]
                ]
            ],
            "layout": { "line-cap": "round", "line-join": "round" },
            "paint": {
                "line-color": "#1d4ed8",
                "line-opacity": 1.0,
                "line-width": ["interpolate", ["linear"], ["zoom"], 10, 3.5, 14, 6, 16, 8, 18, 12]
            }
        }),
    ]
}

/// `[[west, south], [east, north]]` of a parsed GeoJSON document, the shape
/// `fitBounds` takes. `None` leaves the map where it is.
pub fn fit_bounds(geojson: &Value) -> Option<[[f64; 2]; 2]> {
    geojson_bounds(geojson).map(|b| b.corners())
}

/// Text of a property worth showing as a label. Empty strings, zero, `false`
/// and `null` are skipped so the next candidate key gets a chance.
fn label_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => (i != 0).then(|| i.to_string()),
            None => n.as_f64().filter(|f| *f != 0.0).map(|f| format!("{f}")),
        },
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
        _ => None,
    }
}

/// Popup label for a clicked extrusion: the first of `name`, `Name`,
/// `title`, falling back to "Building", plus its height in metres.
pub fn building_popup(properties: &Value) -> (String, f64) {
    let name = ["name", "Name", "title"]
        .iter()
        .find_map(|key| properties.get(key).and_then(label_text))
        .unwrap_or_else(|| "Building".to_string());
    let height = match properties.get("height") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    let height = if height.is_finite() { height } else { 0.0 };
    (name, height)
}
