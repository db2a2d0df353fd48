use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coords::{ClickOutcome, LatLon, ManualCoordinates, Phase, SelectionState};
use crate::encoding::Category;
use crate::map::MapView;

// ---------- Request types ----------

/// Ride attributes as sent by the dashboard controls. Omitted fields take
/// the controls' default values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RideParams {
    pub passenger_count: Option<i64>,
    pub hour: Option<i64>,
    pub day_of_week: Option<i64>,
    pub pickup_year: Option<i64>,
    pub pickup_month: Option<i64>,
    pub pickup_season: Option<Category>,
    pub pickup_hour_category: Option<Category>,
}

/// One dashboard interaction: the current control values, optionally with a
/// fresh map click.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EstimateRequest {
    pub ride: RideParams,
    pub manual: ManualCoordinates,
    pub click: Option<LatLon>,
}

// ---------- Response types ----------

#[derive(Debug, Clone, Serialize)]
pub struct ClickReport {
    pub outcome: ClickOutcome,
    pub point: LatLon,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Estimate {
    pub fare: f64,
    pub distance_km: f64,
    pub degraded: bool,
    pub warning: Option<String>,
    pub message: String,
    pub map: MapView,
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    pub phase: Phase,
    pub selection: SelectionState,
    pub click: Option<ClickReport>,
    pub estimate: Option<Estimate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub phase: Phase,
    pub selection: SelectionState,
    pub estimate: Option<Estimate>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
    pub default: i64,
}

/// Choices and limits for the dashboard controls.
#[derive(Debug, Clone, Serialize)]
pub struct Vocabulary {
    pub pickup_season: Vec<Category>,
    pub pickup_hour_category: Vec<Category>,
    pub passenger_count: Bounds,
    pub hour: Bounds,
    pub day_of_week: Bounds,
    pub pickup_year: Bounds,
    pub pickup_month: Bounds,
}
