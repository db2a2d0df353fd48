use serde::Serialize;

use crate::encoding::EncodedFeatureRow;
use crate::error::ModelError;
use crate::model::Regressor;

/// Lowest fare ever quoted.
pub const FARE_FLOOR: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FarePrediction {
    pub fare: f64,
    /// Model output before the floor was applied.
    pub raw: f64,
}

pub fn predict_fare(model: &dyn Regressor, row: &EncodedFeatureRow) -> Result<FarePrediction, ModelError> {
    let raw = model.predict(&row.values)?;
    if !raw.is_finite() {
        return Err(ModelError::NonFinite(raw));
    }
    Ok(FarePrediction {
        fare: raw.max(FARE_FLOOR),
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl Regressor for Fixed {
        fn feature_names(&self) -> &[String] {
            &[]
        }

        fn predict(&self, _features: &[f64]) -> Result<f64, ModelError> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn empty_row() -> EncodedFeatureRow {
        EncodedFeatureRow {
            columns: vec![],
            values: vec![],
        }
    }

    #[test]
    fn test_non_finite_output_is_rejected() {
        for raw in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = predict_fare(&Fixed(raw), &empty_row()).unwrap_err();
            assert!(matches!(err, ModelError::NonFinite(_)), "{} must not be quoted", raw);
        }
    }

    #[test]
    fn test_floor_applies_to_low_output() {
        let p = predict_fare(&Fixed(-7.5), &empty_row()).unwrap();
        assert_eq!(p.fare, FARE_FLOOR);
        assert_eq!(p.raw, -7.5);

        let p = predict_fare(&Fixed(12.25), &empty_row()).unwrap();
        assert_eq!(p.fare, 12.25);
    }
}
