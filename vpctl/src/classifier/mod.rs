//! The pre-trained startup-outcome classifier.
//!
//! The model is a decision forest loaded once at startup from a JSON artifact
//! ([`forest`]); the feature schema the app renders and coerces against comes
//! from the artifact itself, not from code. [`features`] turns raw form input
//! into a numeric vector in schema order.

use std::path::Path;

use anyhow::Context;

pub mod features;
pub mod forest;

pub use features::FeatureVector;
pub use forest::{ForestError, ForestModel};

/// Binary classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Success,
    Failure,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Success => "Success",
            Label::Failure => "Failure",
        }
    }
}

/// A loaded, validated model ready to serve predictions.
#[derive(Debug, Clone)]
pub struct Classifier {
    model: ForestModel,
}

impl Classifier {
    /// Load and validate the model artifact from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path).with_context(|| format!("read model artifact {}", path.display()))?;
        let model: ForestModel = serde_json::from_str(&contents).with_context(|| format!("parse model artifact {}", path.display()))?;

        Self::from_model(model)
    }

    pub fn from_model(model: ForestModel) -> anyhow::Result<Self> {
        model.validate().context("validate model artifact")?;
        Ok(Self { model })
    }

    /// Feature names in the order the model expects them.
    pub fn schema(&self) -> &[String] {
        &self.model.feature_names
    }

    pub fn name(&self) -> &str {
        &self.model.name
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Label, ForestError> {
        match self.model.vote(features.values())? {
            1 => Ok(Label::Success),
            _ => Ok(Label::Failure),
        }
    }
}
