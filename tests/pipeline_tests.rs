/// Integration tests for the encoding pipeline and fare predictor
///
/// Run with: cargo test --test pipeline_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fare_estimator::artifacts::Artifacts;
use fare_estimator::coords::LatLon;
use fare_estimator::encoding::{
    Category, EncodingPipeline, OneHotEncoder, OrdinalEncoder, Scaler, ONE_HOT_COLUMNS,
};
use fare_estimator::error::{EncodeError, EstimateError};
use fare_estimator::fare::{predict_fare, FARE_FLOOR};
use fare_estimator::features::{assemble, RideRequest};
use fare_estimator::model::{ArtifactModel, Estimator, Linear, Regressor};
use fare_estimator::route::{OsrmClient, RouteEstimate};
use fare_estimator::service::FareService;

fn artifact_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("artifacts")
}

fn load() -> Artifacts {
    Artifacts::load(&artifact_dir()).expect("sample artifacts should load")
}

fn ride() -> RideRequest {
    RideRequest {
        passenger_count: 2,
        hour: 17,
        day_of_week: 4,
        pickup_year: 2015,
        pickup_season: "Summer".into(),
        pickup_month: 7,
        pickup_hour_category: "Evening".into(),
        pickup: LatLon::new(40.75, -73.98),
        dropoff: LatLon::new(40.70, -74.00),
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_encoded_columns_match_model_schema() {
    println!("\n=== Test: Encoded Columns Match Model Schema ===");
    let artifacts = load();
    let model_columns = artifacts.model.feature_names();

    let encoded = artifacts
        .pipeline
        .encode(assemble(&ride(), 6.2), model_columns)
        .expect("encoding should succeed");

    assert_eq!(encoded.columns, model_columns.to_vec(), "Column order differs from model");
    assert_eq!(encoded.values.len(), model_columns.len());
    println!("✓ {} columns in training order", encoded.columns.len());

    // the model's order differs from the pipeline's natural order
    assert_eq!(encoded.columns[2], "pickup_lat");
    assert_eq!(encoded.columns[7], "pickup_season");
    println!("✓ Reordering applied");
}

#[test]
fn test_encoded_values() {
    println!("\n=== Test: Encoded Values ===");
    let artifacts = load();
    let encoded = artifacts
        .pipeline
        .encode(assemble(&ride(), 6.2), artifacts.model.feature_names())
        .unwrap();

    assert_eq!(encoded.get("pickup_season"), Some(2.0), "Summer is rank 2");
    assert!(close(encoded.get("passenger_count").unwrap(), (2.0 - 1.68) / 1.3));
    assert!(close(encoded.get("dist").unwrap(), (6.2 - 3.3) / 3.5));
    assert!(close(encoded.get("pickup_year").unwrap(), (2015.0 - 2011.7) / 1.86));
    assert_eq!(encoded.get("pickup_lat"), Some(40.75), "Coordinates pass through unscaled");

    assert_eq!(encoded.get("pickup_month_7"), Some(1.0));
    assert_eq!(encoded.get("pickup_weekday_4"), Some(1.0));
    assert_eq!(encoded.get("pickup_hour_17"), Some(1.0));
    assert_eq!(encoded.get("pickup_hour_category_Evening"), Some(1.0));
    let hot: f64 = encoded
        .columns
        .iter()
        .zip(&encoded.values)
        .filter(|(name, _)| ONE_HOT_COLUMNS.iter().any(|c| name.starts_with(c)))
        .map(|(_, v)| v)
        .sum();
    assert_eq!(hot, 4.0, "Exactly one indicator per one-hot column");

    for raw in ONE_HOT_COLUMNS {
        assert!(encoded.get(raw).is_none(), "{} should be replaced", raw);
    }
    println!("✓ Ordinal, one-hot and scaled values correct");
}

#[test]
fn test_unknown_hour_category() {
    println!("\n=== Test: Unknown Hour Category ===");
    let artifacts = load();
    let mut r = ride();
    r.pickup_hour_category = "Rush".into();

    let err = artifacts
        .pipeline
        .encode(assemble(&r, 6.2), artifacts.model.feature_names())
        .unwrap_err();
    assert_eq!(
        err,
        EncodeError::UnknownCategory {
            column: "pickup_hour_category".into(),
            value: "Rush".into()
        }
    );
    println!("✓ {}", err);
}

#[test]
fn test_unknown_season() {
    let artifacts = load();
    let mut r = ride();
    r.pickup_season = "Monsoon".into();
    let err = artifacts
        .pipeline
        .encode(assemble(&r, 6.2), artifacts.model.feature_names())
        .unwrap_err();
    assert!(matches!(err, EncodeError::UnknownCategory { ref column, .. } if column == "pickup_season"));
}

#[test]
fn test_missing_model_column_is_schema_mismatch() {
    println!("\n=== Test: Missing Model Column ===");
    let artifacts = load();
    let mut columns = artifacts.model.feature_names().to_vec();
    columns.push("pickup_borough".to_string());

    let err = artifacts
        .pipeline
        .encode(assemble(&ride(), 6.2), &columns)
        .unwrap_err();
    assert!(matches!(err, EncodeError::SchemaMismatch(_)), "Got {:?}", err);

    // extras are dropped silently
    let subset = vec!["dist".to_string(), "pickup_season".to_string()];
    let encoded = artifacts.pipeline.encode(assemble(&ride(), 6.2), &subset).unwrap();
    assert_eq!(encoded.values.len(), 2);
    println!("✓ Missing column rejected, extra columns dropped");
}

#[test]
fn test_vocabulary_type_coercion() {
    println!("\n=== Test: Vocabulary Type Coercion ===");
    // an encoder fitted on month/weekday/hour stored as strings
    let as_text = |range: std::ops::Range<i64>| -> Vec<Category> {
        range.map(|v| Category::Str(v.to_string())).collect()
    };
    let one_hot = OneHotEncoder::new(
        ONE_HOT_COLUMNS.iter().map(|s| s.to_string()).collect(),
        vec![
            as_text(1..13),
            as_text(0..7),
            as_text(0..24),
            vec!["Afternoon".into(), "Evening".into(), "Morning".into(), "Night".into()],
        ],
    );
    let ordinal = OrdinalEncoder::new(
        vec!["pickup_season".into()],
        vec![vec!["Autumn".into(), "Spring".into(), "Summer".into(), "Winter".into()]],
    );
    let scaler = Scaler::Standard {
        feature_names_in: vec!["passenger_count".into(), "dist".into(), "pickup_year".into()],
        mean: vec![0.0; 3],
        scale: vec![1.0; 3],
    };
    let pipeline = EncodingPipeline::new(Arc::new(ordinal), Arc::new(one_hot), Arc::new(scaler)).unwrap();

    let columns = vec!["pickup_month_7".to_string(), "pickup_hour_17".to_string(), "dist".to_string()];
    let encoded = pipeline.encode(assemble(&ride(), 6.2), &columns).unwrap();
    assert_eq!(encoded.values, vec![1.0, 1.0, 6.2]);
    println!("✓ Numeric inputs matched a text vocabulary");
}

#[test]
fn test_pipeline_rejects_misfitted_encoder() {
    let ordinal = OrdinalEncoder::new(vec!["season".into()], vec![vec!["Summer".into()]]);
    let one_hot = OneHotEncoder::new(
        ONE_HOT_COLUMNS.iter().map(|s| s.to_string()).collect(),
        vec![vec![Category::Int(1)]; 4],
    );
    let scaler = Scaler::Standard {
        feature_names_in: vec!["passenger_count".into(), "dist".into(), "pickup_year".into()],
        mean: vec![0.0; 3],
        scale: vec![1.0; 3],
    };
    let result = EncodingPipeline::new(Arc::new(ordinal), Arc::new(one_hot), Arc::new(scaler));
    assert!(matches!(result, Err(EncodeError::SchemaMismatch(_))));
}

#[test]
fn test_fare_from_sample_model() {
    println!("\n=== Test: Fare From Sample Model ===");
    let artifacts = load();
    let encoded = artifacts
        .pipeline
        .encode(assemble(&ride(), 6.2), artifacts.model.feature_names())
        .unwrap();
    let prediction = predict_fare(artifacts.model.as_ref(), &encoded).unwrap();

    // 11.36 + 0.1 * (60 + 0 + 8)
    assert!(close(prediction.fare, 18.16), "Got {}", prediction.fare);
    assert!(close(prediction.raw, prediction.fare));
    println!("✓ fare = {:.2}", prediction.fare);
}

#[test]
fn test_fare_floor() {
    println!("\n=== Test: Fare Floor ===");
    let model = ArtifactModel::new(
        vec!["dist".to_string()],
        Estimator::Linear(Linear {
            coef: vec![0.0],
            intercept: -1.2,
        }),
    );
    let artifacts = load();
    let encoded = artifacts
        .pipeline
        .encode(assemble(&ride(), 6.2), model.feature_names())
        .unwrap();
    let prediction = predict_fare(&model, &encoded).unwrap();

    assert_eq!(prediction.fare, FARE_FLOOR, "Fare must be floored at 3.0");
    assert_eq!(prediction.fare, 3.0);
    assert!(close(prediction.raw, -1.2));
    println!("✓ raw {:.2} floored to {:.2}", prediction.raw, prediction.fare);
}

#[test]
fn test_service_price_with_fallback_route() {
    println!("\n=== Test: Service Price With Fallback Route ===");
    let artifacts = load();
    let router = OsrmClient::new("http://127.0.0.1:9", std::time::Duration::from_secs(1)).unwrap();
    let service = FareService::new(artifacts.pipeline, artifacts.model, router);

    let r = ride();
    let route = RouteEstimate {
        distance_km: 1.0,
        waypoints: vec![r.pickup, r.dropoff],
        degraded: true,
    };
    let mut short = r.clone();
    short.pickup_year = 2010;
    short.pickup_hour_category = "Night".into();
    let estimate = service.price(&short, route).unwrap();

    // 11.36 + 0.1 * (-40 + 10 - 5)
    assert!(close(estimate.fare, 7.86), "Got {}", estimate.fare);
    assert!(estimate.degraded);
    assert!(estimate.warning.is_some(), "Degraded routes carry a warning");
    assert_eq!(estimate.message, "Estimated fare: $7.86 (Distance: 1.00 km)");
    assert_eq!(estimate.map.layers.features.len(), 3);
    println!("✓ {}", estimate.message);
}

#[test]
fn test_unknown_category_surfaces_as_estimate_error() {
    let artifacts = load();
    let router = OsrmClient::new("http://127.0.0.1:9", std::time::Duration::from_secs(1)).unwrap();
    let service = FareService::new(artifacts.pipeline, artifacts.model, router);
    let mut r = ride();
    r.pickup_hour_category = "Rush".into();
    let route = RouteEstimate {
        distance_km: 5.0,
        waypoints: vec![],
        degraded: false,
    };
    let err = service.price(&r, route).unwrap_err();
    assert!(matches!(err, EstimateError::Encode(EncodeError::UnknownCategory { .. })));
}

#[test]
fn test_missing_artifacts_fail_to_load() {
    println!("\n=== Test: Missing Artifacts ===");
    let result = Artifacts::load(Path::new("/nonexistent/fare-artifacts"));
    let err = result.err().expect("Loading must fail without artifacts");
    assert!(err.to_string().contains("not found"), "Got {}", err);
    println!("✓ {}", err);
}
