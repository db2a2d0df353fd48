use serde::Serialize;

use crate::coords::{LatLon, ResolvedTrip};
use crate::encoding::Category;

#[derive(Debug, Clone, PartialEq)]
pub struct RideRequest {
    pub passenger_count: u8,
    pub hour: u8,
    pub day_of_week: u8,
    pub pickup_year: u16,
    pub pickup_season: Category,
    pub pickup_month: u8,
    pub pickup_hour_category: Category,
    pub pickup: LatLon,
    pub dropoff: LatLon,
}

impl RideRequest {
    pub fn trip(&self) -> ResolvedTrip {
        ResolvedTrip {
            pickup: self.pickup,
            dropoff: self.dropoff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Category(Category),
}

impl FeatureValue {
    /// Nominal view of a value, used when a numeric column is fed to a
    /// categorical encoder (month, weekday, hour).
    pub fn as_category(&self) -> Category {
        match self {
            FeatureValue::Number(v) if v.fract() == 0.0 => Category::Int(*v as i64),
            FeatureValue::Number(v) => Category::Float(*v),
            FeatureValue::Category(c) => c.clone(),
        }
    }
}

/// A single named row, the unit every pipeline stage consumes and produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureRow {
    columns: Vec<(String, FeatureValue)>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: FeatureValue) {
        self.columns.push((name.to_string(), value));
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn set(&mut self, name: &str, value: FeatureValue) -> bool {
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FeatureValue> {
        let idx = self.columns.iter().position(|(n, _)| n == name)?;
        Some(self.columns.remove(idx).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub const RAW_COLUMNS: [&str; 12] = [
    "passenger_count",
    "dist",
    "pickup_year",
    "pickup_season",
    "pickup_month",
    "pickup_weekday",
    "pickup_hour",
    "pickup_hour_category",
    "pickup_lat",
    "pickup_lon",
    "dropoff_lat",
    "dropoff_lon",
];

/// Build the raw input row. pickup_weekday and pickup_hour repeat
/// day_of_week and hour.
pub fn assemble(ride: &RideRequest, distance_km: f64) -> FeatureRow {
    use FeatureValue::{Category as Cat, Number};

    let mut row = FeatureRow::new();
    row.push("passenger_count", Number(ride.passenger_count as f64));
    row.push("dist", Number(distance_km));
    row.push("pickup_year", Number(ride.pickup_year as f64));
    row.push("pickup_season", Cat(ride.pickup_season.clone()));
    row.push("pickup_month", Number(ride.pickup_month as f64));
    row.push("pickup_weekday", Number(ride.day_of_week as f64));
    row.push("pickup_hour", Number(ride.hour as f64));
    row.push("pickup_hour_category", Cat(ride.pickup_hour_category.clone()));
    row.push("pickup_lat", Number(ride.pickup.lat));
    row.push("pickup_lon", Number(ride.pickup.lon));
    row.push("dropoff_lat", Number(ride.dropoff.lat));
    row.push("dropoff_lon", Number(ride.dropoff.lon));
    row
}
