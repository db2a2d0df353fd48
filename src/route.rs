use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coords::LatLon;
use crate::error::RouteError;

/// Routes shorter than this are treated as unreliable.
pub const MIN_ROUTE_KM: f64 = 0.1;
/// Flat-earth kilometres per degree used by the straight-line fallback.
pub const KM_PER_DEGREE: f64 = 111.0;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub distance_km: f64,
    pub waypoints: Vec<LatLon>,
}

/// The route the rest of the cycle works with. `degraded` is set when the
/// straight-line substitute replaced the routing service's answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub waypoints: Vec<LatLon>,
    pub degraded: bool,
}

// ---------- OSRM wire types ----------

#[derive(Deserialize)]
struct OsrmRouteResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    distance: f64,
    geometry: OsrmGeometry,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<Vec<f64>>,
}

impl OsrmRouteResponse {
    fn into_route(self) -> Result<RouteResult, RouteError> {
        let route = self.routes.into_iter().next().ok_or(RouteError::NoRoute)?;
        let waypoints = route
            .geometry
            .coordinates
            .iter()
            .map(|pair| match pair.as_slice() {
                // OSRM answers [lon, lat]
                [lon, lat, ..] => Ok(LatLon::new(*lat, *lon)),
                other => Err(RouteError::Geometry(format!("bad coordinate {:?}", other))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        // a polyline needs two points to draw
        if waypoints.len() < 2 {
            return Err(RouteError::Geometry(format!(
                "route geometry has {} point(s)",
                waypoints.len()
            )));
        }
        Ok(RouteResult {
            distance_km: route.distance / 1000.0,
            waypoints,
        })
    }
}

// ---------- client ----------

#[derive(Clone)]
pub struct OsrmClient {
    http: reqwest::Client,
    base_url: String,
}

impl OsrmClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RouteError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn route_url(&self, pickup: LatLon, dropoff: LatLon) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, pickup.lon, pickup.lat, dropoff.lon, dropoff.lat
        )
    }

    /// Ask the routing service for a driving route. Any non-conforming answer
    /// is an error; callers normally go through [`OsrmClient::estimate`].
    pub async fn route(&self, pickup: LatLon, dropoff: LatLon) -> Result<RouteResult, RouteError> {
        let resp = self
            .http
            .get(self.route_url(pickup, dropoff))
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RouteError::Status(status.as_u16()));
        }
        let body: OsrmRouteResponse = resp.json().await?;
        body.into_route()
    }

    pub async fn estimate(&self, pickup: LatLon, dropoff: LatLon) -> RouteEstimate {
        let fetched = self.route(pickup, dropoff).await;
        settle_route(pickup, dropoff, fetched)
    }
}

pub fn straight_line_km(a: LatLon, b: LatLon) -> f64 {
    let dlat = b.lat - a.lat;
    let dlon = b.lon - a.lon;
    (dlat * dlat + dlon * dlon).sqrt() * KM_PER_DEGREE
}

/// Accept the fetched route, or fall back to the straight line between the
/// endpoints when fetching failed or the route is implausibly short.
pub fn settle_route(
    pickup: LatLon,
    dropoff: LatLon,
    fetched: Result<RouteResult, RouteError>,
) -> RouteEstimate {
    match fetched {
        Ok(route) if route.distance_km >= MIN_ROUTE_KM => RouteEstimate {
            distance_km: route.distance_km,
            waypoints: route.waypoints,
            degraded: false,
        },
        Ok(route) => {
            tracing::warn!(
                "route of {:.3} km is below {} km; using straight line",
                route.distance_km,
                MIN_ROUTE_KM
            );
            fallback(pickup, dropoff)
        }
        Err(e) => {
            tracing::warn!("routing failed ({}); using straight line", e);
            fallback(pickup, dropoff)
        }
    }
}

fn fallback(pickup: LatLon, dropoff: LatLon) -> RouteEstimate {
    RouteEstimate {
        distance_km: straight_line_km(pickup, dropoff),
        waypoints: vec![pickup, dropoff],
        degraded: true,
    }
}
