use serde::Deserialize;

use super::NumericTransform;
use crate::error::EncodeError;

/// Fitted linear scaler over the numeric columns.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`
    Standard {
        feature_names_in: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    /// `x * scale + min`
    MinMax {
        feature_names_in: Vec<String>,
        min: Vec<f64>,
        scale: Vec<f64>,
    },
}

impl Scaler {
    pub fn validate(&self) -> Result<(), String> {
        let (n, a, b) = match self {
            Scaler::Standard {
                feature_names_in,
                mean,
                scale,
            } => (feature_names_in.len(), mean.len(), scale.len()),
            Scaler::MinMax {
                feature_names_in,
                min,
                scale,
            } => (feature_names_in.len(), min.len(), scale.len()),
        };
        if n != a || n != b {
            return Err(format!("{} feature names but parameters of length {} and {}", n, a, b));
        }
        Ok(())
    }
}

impl NumericTransform for Scaler {
    fn input_columns(&self) -> &[String] {
        match self {
            Scaler::Standard { feature_names_in, .. } | Scaler::MinMax { feature_names_in, .. } => {
                feature_names_in
            }
        }
    }

    fn apply(&self, values: &[f64]) -> Result<Vec<f64>, EncodeError> {
        let expected = self.input_columns().len();
        if values.len() != expected {
            return Err(EncodeError::SchemaMismatch(format!(
                "scaler expects {} columns, got {}",
                expected,
                values.len()
            )));
        }
        let out = match self {
            Scaler::Standard { mean, scale, .. } => values
                .iter()
                .zip(mean.iter().zip(scale))
                // zero variance columns are left unscaled
                .map(|(x, (m, s))| (x - m) / if *s == 0.0 { 1.0 } else { *s })
                .collect(),
            Scaler::MinMax { min, scale, .. } => values
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(x, (lo, s))| x * s + lo)
                .collect(),
        };
        Ok(out)
    }
}
