use std::sync::Arc;

use crate::coords::{self, ClickOutcome, LatLon, ResolvedTrip};
use crate::encoding::{Category, EncodingPipeline};
use crate::error::EstimateError;
use crate::fare::predict_fare;
use crate::features::{assemble, RideRequest};
use crate::map::render_route;
use crate::model::Regressor;
use crate::route::{OsrmClient, RouteEstimate};
use crate::session::Session;
use crate::types::{
    Bounds, ClickReport, Estimate, EstimateRequest, InteractionResponse, RideParams, Vocabulary,
};

pub const PASSENGER_COUNT: Bounds = Bounds { min: 1, max: 6, default: 1 };
pub const HOUR: Bounds = Bounds { min: 0, max: 23, default: 12 };
pub const DAY_OF_WEEK: Bounds = Bounds { min: 0, max: 6, default: 0 };
pub const PICKUP_YEAR: Bounds = Bounds { min: 2000, max: 2030, default: 2023 };
pub const PICKUP_MONTH: Bounds = Bounds { min: 1, max: 12, default: 1 };

pub const FALLBACK_WARNING: &str = "Routing failed or distance too small; using straight-line distance.";

/// One prediction cycle end to end: route, features, encoding, model, map.
pub struct FareService {
    pipeline: EncodingPipeline,
    model: Arc<dyn Regressor>,
    router: OsrmClient,
}

fn bounded(field: &str, value: Option<i64>, bounds: Bounds) -> Result<i64, EstimateError> {
    let v = value.unwrap_or(bounds.default);
    if v < bounds.min || v > bounds.max {
        return Err(EstimateError::InvalidInput(format!(
            "{} must be between {} and {}, got {}",
            field, bounds.min, bounds.max, v
        )));
    }
    Ok(v)
}

fn first_or_invalid(field: &str, vocab: &[Category]) -> Result<Category, EstimateError> {
    vocab
        .first()
        .cloned()
        .ok_or_else(|| EstimateError::InvalidInput(format!("no {} choices are available", field)))
}

impl FareService {
    pub fn new(pipeline: EncodingPipeline, model: Arc<dyn Regressor>, router: OsrmClient) -> Self {
        Self {
            pipeline,
            model,
            router,
        }
    }

    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary {
            pickup_season: self.pipeline.season_vocabulary().to_vec(),
            pickup_hour_category: self.pipeline.hour_category_vocabulary().to_vec(),
            passenger_count: PASSENGER_COUNT,
            hour: HOUR,
            day_of_week: DAY_OF_WEEK,
            pickup_year: PICKUP_YEAR,
            pickup_month: PICKUP_MONTH,
        }
    }

    /// Apply control defaults and bounds. Category values are not checked
    /// here; an unknown one fails later in the encoder.
    pub fn ride_request(&self, params: &RideParams, trip: ResolvedTrip) -> Result<RideRequest, EstimateError> {
        let pickup_season = match &params.pickup_season {
            Some(c) => c.clone(),
            None => first_or_invalid("pickup_season", self.pipeline.season_vocabulary())?,
        };
        let pickup_hour_category = match &params.pickup_hour_category {
            Some(c) => c.clone(),
            None => first_or_invalid("pickup_hour_category", self.pipeline.hour_category_vocabulary())?,
        };
        Ok(RideRequest {
            passenger_count: bounded("passenger_count", params.passenger_count, PASSENGER_COUNT)? as u8,
            hour: bounded("hour", params.hour, HOUR)? as u8,
            day_of_week: bounded("day_of_week", params.day_of_week, DAY_OF_WEEK)? as u8,
            pickup_year: bounded("pickup_year", params.pickup_year, PICKUP_YEAR)? as u16,
            pickup_season,
            pickup_month: bounded("pickup_month", params.pickup_month, PICKUP_MONTH)? as u8,
            pickup_hour_category,
            pickup: trip.pickup,
            dropoff: trip.dropoff,
        })
    }

    /// Everything after routing. Synchronous and free of I/O.
    pub fn price(&self, ride: &RideRequest, route: RouteEstimate) -> Result<Estimate, EstimateError> {
        let row = assemble(ride, route.distance_km);
        let encoded = self.pipeline.encode(row, self.model.feature_names())?;
        let prediction = predict_fare(self.model.as_ref(), &encoded)?;

        tracing::info!(
            "estimate fare={:.2} raw={:.3} dist={:.2}km degraded={} model={}",
            prediction.fare,
            prediction.raw,
            route.distance_km,
            route.degraded,
            self.model.name()
        );

        Ok(Estimate {
            fare: prediction.fare,
            distance_km: route.distance_km,
            degraded: route.degraded,
            warning: route.degraded.then(|| FALLBACK_WARNING.to_string()),
            message: format!(
                "Estimated fare: ${:.2} (Distance: {:.2} km)",
                prediction.fare, route.distance_km
            ),
            map: render_route(ride.pickup, ride.dropoff, &route.waypoints),
        })
    }

    pub async fn estimate(&self, ride: &RideRequest) -> Result<Estimate, EstimateError> {
        let route = self.router.estimate(ride.pickup, ride.dropoff).await;
        self.price(ride, route)
    }

    pub fn click(&self, session: &mut Session, point: LatLon) -> ClickReport {
        let outcome = session.selection.capture_click(point);
        let message = match outcome {
            ClickOutcome::PickupSet => Some(format!("Pickup set: ({}, {})", point.lat, point.lon)),
            ClickOutcome::DropoffSet => Some(format!("Dropoff set: ({}, {})", point.lat, point.lon)),
            ClickOutcome::Ignored => {
                tracing::debug!("click at ({}, {}) ignored; both points already set", point.lat, point.lon);
                None
            }
        };
        ClickReport {
            outcome,
            point,
            message,
        }
    }

    /// One full interaction: capture the click, resolve both points and, when
    /// they are complete, price the trip. An incomplete trip is not an error;
    /// it simply yields no estimate.
    pub async fn interact(
        &self,
        session: &mut Session,
        req: EstimateRequest,
    ) -> Result<InteractionResponse, EstimateError> {
        let click = req.click.map(|p| self.click(session, p));
        let phase = coords::phase(&req.manual, &session.selection);
        // a failed cycle must not leave the previous fare on display
        session.last_estimate = None;

        let estimate = match coords::resolve(&req.manual, &session.selection) {
            Some(trip) => {
                let ride = self.ride_request(&req.ride, trip)?;
                Some(self.estimate(&ride).await?)
            }
            None => None,
        };
        session.last_estimate = estimate.clone();

        Ok(InteractionResponse {
            phase,
            selection: session.selection.clone(),
            click,
            estimate,
        })
    }
}
