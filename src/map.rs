use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::json;

use crate::coords::LatLon;

/// Where the click-capture map opens.
pub const DEFAULT_CENTER: LatLon = LatLon {
    lat: 40.730610,
    lon: -73.935242,
};
pub const BASE_ZOOM: u8 = 12;
pub const ROUTE_ZOOM: u8 = 13;

/// Everything the front end needs to draw one map.
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub center: LatLon,
    pub zoom: u8,
    pub layers: FeatureCollection,
}

fn position(p: LatLon) -> Vec<f64> {
    vec![p.lon, p.lat]
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn marker(p: LatLon, label: &str, color: &str) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!("marker"));
    properties.insert("popup".to_string(), json!(label));
    properties.insert("color".to_string(), json!(color));
    feature(Value::Point(position(p)), properties)
}

pub fn base_map() -> MapView {
    MapView {
        center: DEFAULT_CENTER,
        zoom: BASE_ZOOM,
        layers: FeatureCollection {
            bbox: None,
            features: vec![],
            foreign_members: None,
        },
    }
}

/// Pickup and dropoff markers plus the route line, centered on pickup. With
/// fewer than two waypoints the line joins the endpoints directly.
pub fn render_route(pickup: LatLon, dropoff: LatLon, waypoints: &[LatLon]) -> MapView {
    let line: Vec<Vec<f64>> = if waypoints.len() >= 2 {
        waypoints.iter().copied().map(position).collect()
    } else {
        vec![position(pickup), position(dropoff)]
    };

    let mut style = JsonObject::new();
    style.insert("kind".to_string(), json!("route"));
    style.insert("color".to_string(), json!("blue"));
    style.insert("weight".to_string(), json!(5));

    MapView {
        center: pickup,
        zoom: ROUTE_ZOOM,
        layers: FeatureCollection {
            bbox: None,
            features: vec![
                marker(pickup, "Pickup", "green"),
                marker(dropoff, "Dropoff", "red"),
                feature(Value::LineString(line), style),
            ],
            foreign_members: None,
        },
    }
}
