use std::fmt;

use serde::{Deserialize, Serialize};

/// A categorical value in its native representation. Encoder vocabularies
/// are stored as whatever JSON type the fitted encoder saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Category {
    /// Convert to the same representation as `like`, the way a vocabulary
    /// lookup needs it. `None` when no sensible conversion exists.
    pub fn coerce_to(&self, like: &Category) -> Option<Category> {
        match (like, self) {
            (Category::Int(_), Category::Int(v)) => Some(Category::Int(*v)),
            (Category::Int(_), Category::Float(v)) => integral(*v).map(Category::Int),
            (Category::Int(_), Category::Str(s)) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
                    .map(Category::Int)
            }
            (Category::Float(_), Category::Int(v)) => Some(Category::Float(*v as f64)),
            (Category::Float(_), Category::Float(v)) => Some(Category::Float(*v)),
            (Category::Float(_), Category::Str(s)) => {
                s.trim().parse::<f64>().ok().map(Category::Float)
            }
            (Category::Str(_), other) => Some(Category::Str(other.label())),
        }
    }

    /// Text form used in generated column names: integral floats keep a
    /// trailing `.0`.
    pub fn label(&self) -> String {
        match self {
            Category::Int(v) => v.to_string(),
            Category::Float(v) if v.is_finite() && v.fract() == 0.0 => format!("{:.1}", v),
            Category::Float(v) => v.to_string(),
            Category::Str(s) => s.clone(),
        }
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 {
        Some(v as i64)
    } else {
        None
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Category::Str(s.to_string())
    }
}

impl From<i64> for Category {
    fn from(v: i64) -> Self {
        Category::Int(v)
    }
}
