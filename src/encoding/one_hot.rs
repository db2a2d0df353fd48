use serde::Deserialize;

use super::ordinal::validate_vocabularies;
use super::{lookup, Category, CategoricalTransform};
use crate::error::EncodeError;

/// Fitted one-hot encoder. Output columns are named `{column}_{category}`
/// in vocabulary order, column after column.
#[derive(Debug, Clone, Deserialize)]
pub struct OneHotEncoder {
    feature_names_in: Vec<String>,
    categories: Vec<Vec<Category>>,
}

impl OneHotEncoder {
    pub fn new(feature_names_in: Vec<String>, categories: Vec<Vec<Category>>) -> Self {
        Self {
            feature_names_in,
            categories,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_vocabularies(&self.feature_names_in, &self.categories)
    }

    fn width(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }
}

impl CategoricalTransform for OneHotEncoder {
    fn input_columns(&self) -> &[String] {
        &self.feature_names_in
    }

    fn vocabulary(&self, column: &str) -> Option<&[Category]> {
        let idx = self.feature_names_in.iter().position(|n| n == column)?;
        self.categories.get(idx).map(Vec::as_slice)
    }

    fn output_columns(&self) -> Vec<String> {
        self.feature_names_in
            .iter()
            .zip(&self.categories)
            .flat_map(|(name, vocab)| vocab.iter().map(move |c| format!("{}_{}", name, c.label())))
            .collect()
    }

    fn apply(&self, values: &[Category]) -> Result<Vec<f64>, EncodeError> {
        if values.len() != self.feature_names_in.len() {
            return Err(EncodeError::SchemaMismatch(format!(
                "one-hot encoder expects {} columns, got {}",
                self.feature_names_in.len(),
                values.len()
            )));
        }
        let mut out = Vec::with_capacity(self.width());
        for ((name, vocab), value) in self.feature_names_in.iter().zip(&self.categories).zip(values) {
            let hit = lookup(name, vocab, value)?;
            out.extend((0..vocab.len()).map(|i| if i == hit { 1.0 } else { 0.0 }));
        }
        Ok(out)
    }
}
