use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::ModelError;

/// A loaded, already-trained regression model.
pub trait Regressor: Send + Sync {
    /// Training-time column order; rows passed to `predict` follow it.
    fn feature_names(&self) -> &[String];

    fn predict(&self, x: &[f64]) -> Result<f64, ModelError>;

    fn name(&self) -> &str;
}

// ---------- JSON artifact model ----------

#[derive(Debug, Deserialize)]
pub struct ArtifactModel {
    feature_names_in: Vec<String>,
    estimator: Estimator,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    GradientBoosting(GradientBoosting),
    Linear(Linear),
}

/// Boosted regression trees: `init + learning_rate * sum(tree(x))`.
#[derive(Debug, Deserialize)]
pub struct GradientBoosting {
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Deserialize)]
pub struct Linear {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

/// One regression tree in parallel-array layout. A node whose left child is
/// `-1` is a leaf; otherwise go left when `x[feature] <= threshold`.
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

const LEAF: i64 = -1;

impl Tree {
    pub fn leaf(value: f64) -> Self {
        Self {
            children_left: vec![LEAF],
            children_right: vec![LEAF],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![value],
        }
    }

    /// Single split on `feature`: `left` when `x[feature] <= threshold`.
    pub fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Self {
        Self {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![feature as i64, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![0.0, left, right],
        }
    }

    fn check_shape(&self) -> std::result::Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|len| *len != n)
        {
            return Err("node arrays differ in length".into());
        }
        Ok(())
    }

    pub fn evaluate(&self, x: &[f64], tree: usize) -> Result<f64, ModelError> {
        let malformed = |reason: String| ModelError::MalformedTree { tree, reason };
        let n = self.children_left.len();
        let mut node = 0usize;
        // a well-formed tree reaches a leaf in fewer than n steps
        for _ in 0..n {
            let left = self.children_left[node];
            if left == LEAF {
                return Ok(self.value[node]);
            }
            let f = usize::try_from(self.feature[node])
                .ok()
                .filter(|f| *f < x.len())
                .ok_or_else(|| malformed(format!("node {} splits on feature {}", node, self.feature[node])))?;
            let next = if x[f] <= self.threshold[node] {
                left
            } else {
                self.children_right[node]
            };
            node = usize::try_from(next)
                .ok()
                .filter(|c| *c < n)
                .ok_or_else(|| malformed(format!("node {} points at child {}", node, next)))?;
        }
        Err(malformed("no leaf reached".into()))
    }
}

impl ArtifactModel {
    pub fn new(feature_names_in: Vec<String>, estimator: Estimator) -> Self {
        Self {
            feature_names_in,
            estimator,
        }
    }

    /// Load a `model.json` artifact, rejecting structurally broken files.
    pub fn load(model_path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(model_path)
            .with_context(|| format!("failed to read model at {}", model_path.display()))?;
        let model: ArtifactModel = serde_json::from_str(&txt)
            .with_context(|| format!("failed to parse {}", model_path.display()))?;
        model.check()?;
        Ok(model)
    }

    fn check(&self) -> Result<()> {
        if self.feature_names_in.is_empty() {
            bail!("model declares no input features");
        }
        match &self.estimator {
            Estimator::GradientBoosting(gb) => {
                for (i, t) in gb.trees.iter().enumerate() {
                    if let Err(reason) = t.check_shape() {
                        bail!("tree {} is malformed: {}", i, reason);
                    }
                }
            }
            Estimator::Linear(lin) => {
                if lin.coef.len() != self.feature_names_in.len() {
                    bail!(
                        "linear model has {} coefficients for {} features",
                        lin.coef.len(),
                        self.feature_names_in.len()
                    );
                }
            }
        }
        Ok(())
    }
}

impl Regressor for ArtifactModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names_in
    }

    fn predict(&self, x: &[f64]) -> Result<f64, ModelError> {
        if x.len() != self.feature_names_in.len() {
            return Err(ModelError::FeatureLength {
                got: x.len(),
                expected: self.feature_names_in.len(),
            });
        }
        match &self.estimator {
            Estimator::GradientBoosting(gb) => {
                let mut sum = 0.0;
                for (i, tree) in gb.trees.iter().enumerate() {
                    sum += tree.evaluate(x, i)?;
                }
                Ok(gb.init + gb.learning_rate * sum)
            }
            Estimator::Linear(lin) => {
                Ok(lin.intercept + lin.coef.iter().zip(x).map(|(c, v)| c * v).sum::<f64>())
            }
        }
    }

    fn name(&self) -> &str {
        match self.estimator {
            Estimator::GradientBoosting(_) => "gradient_boosting",
            Estimator::Linear(_) => "linear",
        }
    }
}

// ---------- TorchScript model ----------

#[cfg(feature = "torch")]
pub use torch::TorchModel;

#[cfg(feature = "torch")]
mod torch {
    use super::*;
    use parking_lot::Mutex;
    use tch::{kind::Kind, CModule, Device, Tensor};

    #[derive(Deserialize)]
    struct MetaJson {
        feat_list: Vec<String>,
    }

    /// TorchScript regressor exported with a `meta.json` holding its feature
    /// order. Output must be a single scalar per row.
    pub struct TorchModel {
        model: Mutex<CModule>,
        device: Device,
        feat_list: Vec<String>,
    }

    impl TorchModel {
        pub fn new(model_path: &Path, meta_path: &Path) -> Result<Self> {
            let device = Device::Cpu;

            let meta_txt = fs::read_to_string(meta_path)
                .with_context(|| format!("failed to read meta at {}", meta_path.display()))?;
            let meta: MetaJson =
                serde_json::from_str(&meta_txt).with_context(|| "failed to parse meta.json")?;

            let model = CModule::load_on_device(model_path, device)
                .with_context(|| format!("failed to load TorchScript {}", model_path.display()))?;

            // Check output shape with a dummy forward; expect one value
            let dummy = Tensor::zeros([1, meta.feat_list.len() as i64], (Kind::Float, device));
            let t = model.forward_ts(&[dummy])?;
            if t.numel() != 1 {
                bail!("unexpected model output size: {:?}", t.size());
            }

            Ok(Self {
                model: Mutex::new(model),
                device,
                feat_list: meta.feat_list,
            })
        }
    }

    impl Regressor for TorchModel {
        fn feature_names(&self) -> &[String] {
            &self.feat_list
        }

        fn predict(&self, x: &[f64]) -> Result<f64, ModelError> {
            if x.len() != self.feat_list.len() {
                return Err(ModelError::FeatureLength {
                    got: x.len(),
                    expected: self.feat_list.len(),
                });
            }
            let row: Vec<f32> = x.iter().map(|v| *v as f32).collect();
            let input = Tensor::from_slice(&row)
                .reshape([1, row.len() as i64])
                .to_device(self.device);
            let out = self
                .model
                .lock()
                .forward_ts(&[input])
                .map_err(|e| ModelError::Backend(e.to_string()))?;
            Ok(out.reshape([-1]).double_value(&[0]))
        }

        fn name(&self) -> &str {
            "torchscript"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    #[test]
    fn test_boosted_stumps() {
        let model = ArtifactModel::new(
            names(2),
            Estimator::GradientBoosting(GradientBoosting {
                init: 10.0,
                learning_rate: 0.1,
                trees: vec![Tree::stump(1, 0.0, -20.0, 30.0), Tree::leaf(5.0)],
            }),
        );
        assert!((model.predict(&[0.0, -1.0]).unwrap() - 8.5).abs() < 1e-12);
        assert!((model.predict(&[0.0, 1.0]).unwrap() - 13.5).abs() < 1e-12);
    }

    #[test]
    fn test_row_width_is_checked() {
        let model = ArtifactModel::new(
            names(3),
            Estimator::Linear(Linear {
                coef: vec![1.0, 1.0, 1.0],
                intercept: 0.0,
            }),
        );
        assert!(matches!(
            model.predict(&[1.0]),
            Err(ModelError::FeatureLength { got: 1, expected: 3 })
        ));
    }

    #[test]
    fn test_cyclic_tree_is_rejected() {
        let tree = Tree {
            children_left: vec![1, 0],
            children_right: vec![1, 0],
            feature: vec![0, 0],
            threshold: vec![0.0, 0.0],
            value: vec![0.0, 0.0],
        };
        assert!(matches!(
            tree.evaluate(&[1.0], 0),
            Err(ModelError::MalformedTree { .. })
        ));
    }
}
