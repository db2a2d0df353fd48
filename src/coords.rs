use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Free-text coordinate fields as typed by the user. Any of them may be
/// missing, empty or garbage.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ManualCoordinates {
    pub pickup_lat: Option<String>,
    pub pickup_lon: Option<String>,
    pub dropoff_lat: Option<String>,
    pub dropoff_lon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickOutcome {
    PickupSet,
    DropoffSet,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingPickup,
    AwaitingDropoff,
    Ready,
}

/// Map clicks remembered for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionState {
    pub pickup: Option<LatLon>,
    pub dropoff: Option<LatLon>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// First click fills pickup, second fills dropoff, anything after that
    /// is dropped until `reset`.
    pub fn capture_click(&mut self, point: LatLon) -> ClickOutcome {
        if self.pickup.is_none() {
            self.pickup = Some(point);
            ClickOutcome::PickupSet
        } else if self.dropoff.is_none() {
            self.dropoff = Some(point);
            ClickOutcome::DropoffSet
        } else {
            ClickOutcome::Ignored
        }
    }

    pub fn reset(&mut self) {
        self.pickup = None;
        self.dropoff = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedTrip {
    pub pickup: LatLon,
    pub dropoff: LatLon,
}

/// Empty, unparsable and non-finite text all count as "not entered".
pub fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn manual_point(lat: Option<&str>, lon: Option<&str>) -> Option<LatLon> {
    match (parse_coordinate(lat), parse_coordinate(lon)) {
        (Some(lat), Some(lon)) => Some(LatLon::new(lat, lon)),
        _ => None,
    }
}

fn resolve_points(
    manual: &ManualCoordinates,
    selection: &SelectionState,
) -> (Option<LatLon>, Option<LatLon>) {
    let pickup = manual_point(manual.pickup_lat.as_deref(), manual.pickup_lon.as_deref())
        .or(selection.pickup);
    let dropoff = manual_point(manual.dropoff_lat.as_deref(), manual.dropoff_lon.as_deref())
        .or(selection.dropoff);
    (pickup, dropoff)
}

/// Manual entry wins per point when both of its fields parse; otherwise the
/// stored click for that point is used. `None` means the trip is incomplete.
pub fn resolve(manual: &ManualCoordinates, selection: &SelectionState) -> Option<ResolvedTrip> {
    match resolve_points(manual, selection) {
        (Some(pickup), Some(dropoff)) => Some(ResolvedTrip { pickup, dropoff }),
        _ => None,
    }
}

pub fn phase(manual: &ManualCoordinates, selection: &SelectionState) -> Phase {
    match resolve_points(manual, selection) {
        (Some(_), Some(_)) => Phase::Ready,
        (Some(_), None) => Phase::AwaitingDropoff,
        _ => Phase::AwaitingPickup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate(Some(" 40.75 ")), Some(40.75));
        assert_eq!(parse_coordinate(Some("")), None);
        assert_eq!(parse_coordinate(Some("north")), None);
        assert_eq!(parse_coordinate(Some("NaN")), None);
        assert_eq!(parse_coordinate(None), None);
    }

    #[test]
    fn test_half_entered_manual_point_falls_back_to_click() {
        let manual = ManualCoordinates {
            pickup_lat: text("40.75"),
            pickup_lon: text(""),
            ..Default::default()
        };
        let selection = SelectionState {
            pickup: Some(LatLon::new(40.1, -73.9)),
            dropoff: Some(LatLon::new(40.2, -73.8)),
        };
        let trip = resolve(&manual, &selection).unwrap();
        assert_eq!(trip.pickup, LatLon::new(40.1, -73.9));
    }

    #[test]
    fn test_phase_follows_resolution() {
        let mut selection = SelectionState::new();
        let manual = ManualCoordinates::default();
        assert_eq!(phase(&manual, &selection), Phase::AwaitingPickup);
        selection.capture_click(LatLon::new(40.0, -73.0));
        assert_eq!(phase(&manual, &selection), Phase::AwaitingDropoff);
        selection.capture_click(LatLon::new(40.1, -73.1));
        assert_eq!(phase(&manual, &selection), Phase::Ready);
    }
}
