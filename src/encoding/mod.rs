mod category;
mod one_hot;
mod ordinal;
mod pipeline;
mod scaler;

pub use category::Category;
pub use one_hot::OneHotEncoder;
pub use ordinal::OrdinalEncoder;
pub use pipeline::{
    reorder, EncodedFeatureRow, EncodingPipeline, ONE_HOT_COLUMNS, ORDINAL_COLUMNS, SCALED_COLUMNS,
};
pub use scaler::Scaler;

use crate::error::EncodeError;

/// A fitted transform over categorical columns.
pub trait CategoricalTransform: Send + Sync {
    fn input_columns(&self) -> &[String];
    /// Learned vocabulary of one input column.
    fn vocabulary(&self, column: &str) -> Option<&[Category]>;
    fn output_columns(&self) -> Vec<String>;
    fn apply(&self, values: &[Category]) -> Result<Vec<f64>, EncodeError>;
}

/// A fitted transform over numeric columns, one output per input.
pub trait NumericTransform: Send + Sync {
    fn input_columns(&self) -> &[String];
    fn apply(&self, values: &[f64]) -> Result<Vec<f64>, EncodeError>;
}

/// Index of `value` in `vocab` after coercing it to the vocabulary's native
/// representation.
pub(crate) fn lookup(column: &str, vocab: &[Category], value: &Category) -> Result<usize, EncodeError> {
    let unknown = || EncodeError::UnknownCategory {
        column: column.to_string(),
        value: value.label(),
    };
    let native = vocab.first().and_then(|like| value.coerce_to(like)).ok_or_else(unknown)?;
    vocab.iter().position(|c| *c == native).ok_or_else(unknown)
}
