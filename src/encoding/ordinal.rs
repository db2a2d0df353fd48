use serde::Deserialize;

use super::{lookup, Category, CategoricalTransform};
use crate::error::EncodeError;

/// Fitted ordinal encoder: each input column maps a category to its index in
/// the learned vocabulary.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdinalEncoder {
    feature_names_in: Vec<String>,
    categories: Vec<Vec<Category>>,
}

impl OrdinalEncoder {
    pub fn new(feature_names_in: Vec<String>, categories: Vec<Vec<Category>>) -> Self {
        Self {
            feature_names_in,
            categories,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_vocabularies(&self.feature_names_in, &self.categories)
    }
}

pub(crate) fn validate_vocabularies(
    names: &[String],
    categories: &[Vec<Category>],
) -> Result<(), String> {
    if names.len() != categories.len() {
        return Err(format!(
            "{} feature names but {} vocabularies",
            names.len(),
            categories.len()
        ));
    }
    if let Some((name, _)) = names.iter().zip(categories).find(|(_, c)| c.is_empty()) {
        return Err(format!("empty vocabulary for {}", name));
    }
    Ok(())
}

impl CategoricalTransform for OrdinalEncoder {
    fn input_columns(&self) -> &[String] {
        &self.feature_names_in
    }

    fn vocabulary(&self, column: &str) -> Option<&[Category]> {
        let idx = self.feature_names_in.iter().position(|n| n == column)?;
        self.categories.get(idx).map(Vec::as_slice)
    }

    fn output_columns(&self) -> Vec<String> {
        self.feature_names_in.clone()
    }

    fn apply(&self, values: &[Category]) -> Result<Vec<f64>, EncodeError> {
        if values.len() != self.feature_names_in.len() {
            return Err(EncodeError::SchemaMismatch(format!(
                "ordinal encoder expects {} columns, got {}",
                self.feature_names_in.len(),
                values.len()
            )));
        }
        self.feature_names_in
            .iter()
            .zip(&self.categories)
            .zip(values)
            .map(|((name, vocab), value)| lookup(name, vocab, value).map(|rank| rank as f64))
            .collect()
    }
}
