use std::sync::Arc;

use serde::Serialize;

use super::{Category, CategoricalTransform, NumericTransform};
use crate::error::EncodeError;
use crate::features::{FeatureRow, FeatureValue};

pub const ORDINAL_COLUMNS: [&str; 1] = ["pickup_season"];
pub const ONE_HOT_COLUMNS: [&str; 4] = [
    "pickup_month",
    "pickup_weekday",
    "pickup_hour",
    "pickup_hour_category",
];
pub const SCALED_COLUMNS: [&str; 3] = ["passenger_count", "dist", "pickup_year"];

/// Numeric row laid out exactly as the model was trained on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedFeatureRow {
    pub columns: Vec<String>,
    pub values: Vec<f64>,
}

impl EncodedFeatureRow {
    pub fn get(&self, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx).copied()
    }
}

/// Ordinal encode -> one-hot encode -> scale -> reorder. The order matters:
/// each stage reads columns the previous one left behind.
#[derive(Clone)]
pub struct EncodingPipeline {
    ordinal: Arc<dyn CategoricalTransform>,
    one_hot: Arc<dyn CategoricalTransform>,
    scaler: Arc<dyn NumericTransform>,
}

fn check_inputs(stage: &str, got: &[String], want: &[&str]) -> Result<(), EncodeError> {
    if got.iter().map(String::as_str).eq(want.iter().copied()) {
        Ok(())
    } else {
        Err(EncodeError::SchemaMismatch(format!(
            "{} was fitted on {:?}, pipeline feeds {:?}",
            stage, got, want
        )))
    }
}

impl EncodingPipeline {
    pub fn new(
        ordinal: Arc<dyn CategoricalTransform>,
        one_hot: Arc<dyn CategoricalTransform>,
        scaler: Arc<dyn NumericTransform>,
    ) -> Result<Self, EncodeError> {
        check_inputs("ordinal encoder", ordinal.input_columns(), &ORDINAL_COLUMNS)?;
        check_inputs("one-hot encoder", one_hot.input_columns(), &ONE_HOT_COLUMNS)?;
        check_inputs("scaler", scaler.input_columns(), &SCALED_COLUMNS)?;
        Ok(Self {
            ordinal,
            one_hot,
            scaler,
        })
    }

    pub fn season_vocabulary(&self) -> &[Category] {
        self.ordinal.vocabulary(ORDINAL_COLUMNS[0]).unwrap_or(&[])
    }

    pub fn hour_category_vocabulary(&self) -> &[Category] {
        self.one_hot.vocabulary(ONE_HOT_COLUMNS[3]).unwrap_or(&[])
    }

    /// Run every stage and hand back the row in `model_columns` order.
    pub fn encode(
        &self,
        row: FeatureRow,
        model_columns: &[String],
    ) -> Result<EncodedFeatureRow, EncodeError> {
        let row = self.ordinal_stage(row)?;
        let row = self.one_hot_stage(row)?;
        let row = self.scale_stage(row)?;
        reorder(&row, model_columns)
    }

    fn ordinal_stage(&self, mut row: FeatureRow) -> Result<FeatureRow, EncodeError> {
        let values = categories_of(&row, &ORDINAL_COLUMNS)?;
        let ranks = self.ordinal.apply(&values)?;
        for (name, rank) in ORDINAL_COLUMNS.iter().zip(ranks) {
            row.set(name, FeatureValue::Number(rank));
        }
        Ok(row)
    }

    fn one_hot_stage(&self, mut row: FeatureRow) -> Result<FeatureRow, EncodeError> {
        let values = categories_of(&row, &ONE_HOT_COLUMNS)?;
        let indicators = self.one_hot.apply(&values)?;
        let names = self.one_hot.output_columns();
        if names.len() != indicators.len() {
            return Err(EncodeError::SchemaMismatch(format!(
                "one-hot encoder named {} columns but produced {}",
                names.len(),
                indicators.len()
            )));
        }
        for name in ONE_HOT_COLUMNS {
            row.remove(name);
        }
        for (name, v) in names.iter().zip(indicators) {
            row.push(name, FeatureValue::Number(v));
        }
        Ok(row)
    }

    fn scale_stage(&self, mut row: FeatureRow) -> Result<FeatureRow, EncodeError> {
        let raw = SCALED_COLUMNS
            .iter()
            .map(|name| match row.get(name) {
                Some(FeatureValue::Number(v)) => Ok(*v),
                Some(FeatureValue::Category(c)) => Err(EncodeError::SchemaMismatch(format!(
                    "column {} must be numeric, found {:?}",
                    name, c
                ))),
                None => Err(missing(name)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let scaled = self.scaler.apply(&raw)?;
        for (name, v) in SCALED_COLUMNS.iter().zip(scaled) {
            row.set(name, FeatureValue::Number(v));
        }
        Ok(row)
    }
}

fn missing(column: &str) -> EncodeError {
    EncodeError::SchemaMismatch(format!("column {} is missing", column))
}

fn categories_of(row: &FeatureRow, columns: &[&str]) -> Result<Vec<Category>, EncodeError> {
    columns
        .iter()
        .map(|name| row.get(name).map(FeatureValue::as_category).ok_or_else(|| missing(name)))
        .collect()
}

/// Select `model_columns` from `row`, in that order. Extra columns are
/// dropped; a missing or still-categorical column is a schema mismatch.
pub fn reorder(row: &FeatureRow, model_columns: &[String]) -> Result<EncodedFeatureRow, EncodeError> {
    let mut values = Vec::with_capacity(model_columns.len());
    for name in model_columns {
        match row.get(name) {
            Some(FeatureValue::Number(v)) => values.push(*v),
            Some(FeatureValue::Category(c)) => {
                return Err(EncodeError::SchemaMismatch(format!(
                    "model column {} was never encoded (value {:?})",
                    name, c
                )))
            }
            None => return Err(missing(name)),
        }
    }
    Ok(EncodedFeatureRow {
        columns: model_columns.to_vec(),
        values,
    })
}
