use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use std::{fs, path::Path, sync::Arc};

use crate::encoding::{EncodingPipeline, OneHotEncoder, OrdinalEncoder, Scaler};
use crate::model::{ArtifactModel, Regressor};

pub const MODEL_FILE: &str = "model.json";
pub const ORDINAL_FILE: &str = "ordinal_encoder.json";
pub const ONE_HOT_FILE: &str = "one_hot_encoder.json";
pub const SCALER_FILE: &str = "scaler.json";

/// The trained model and its fitted preprocessors.
pub struct Artifacts {
    pub model: Arc<dyn Regressor>,
    pub pipeline: EncodingPipeline,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        bail!("artifact {} not found", path.display());
    }
    let txt = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&txt).with_context(|| format!("failed to parse {}", path.display()))
}

impl Artifacts {
    /// Load everything from `dir`. Any missing or inconsistent file is an
    /// error; there is no partial mode.
    pub fn load(dir: &Path) -> Result<Self> {
        let ordinal: OrdinalEncoder = read_json(&dir.join(ORDINAL_FILE))?;
        ordinal
            .validate()
            .map_err(|e| anyhow!("{}: {}", ORDINAL_FILE, e))?;
        let one_hot: OneHotEncoder = read_json(&dir.join(ONE_HOT_FILE))?;
        one_hot
            .validate()
            .map_err(|e| anyhow!("{}: {}", ONE_HOT_FILE, e))?;
        let scaler: Scaler = read_json(&dir.join(SCALER_FILE))?;
        scaler.validate().map_err(|e| anyhow!("{}: {}", SCALER_FILE, e))?;

        let pipeline = EncodingPipeline::new(Arc::new(ordinal), Arc::new(one_hot), Arc::new(scaler))
            .context("preprocessors do not fit the feature pipeline")?;

        let model = load_model(dir)?;

        Ok(Self { model, pipeline })
    }
}

#[cfg(feature = "torch")]
fn load_model(dir: &Path) -> Result<Arc<dyn Regressor>> {
    let script = dir.join("model.pt");
    if script.exists() {
        let model = crate::model::TorchModel::new(&script, &dir.join("meta.json"))?;
        return Ok(Arc::new(model));
    }
    load_json_model(dir)
}

#[cfg(not(feature = "torch"))]
fn load_model(dir: &Path) -> Result<Arc<dyn Regressor>> {
    load_json_model(dir)
}

fn load_json_model(dir: &Path) -> Result<Arc<dyn Regressor>> {
    let path = dir.join(MODEL_FILE);
    if !path.exists() {
        bail!("artifact {} not found", path.display());
    }
    Ok(Arc::new(ArtifactModel::load(&path)?))
}
