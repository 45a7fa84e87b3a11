//! Prediction request handling against a prepared feature schema.
//!
//! A serving layer owns the transport; this module turns one JSON request body
//! into a feature vector in schema order, calls the model, and shapes the
//! response. Every failure becomes an error response.

use anyhow::{Context, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::features::FeatureSchema;

/// A trained regression model.
///
/// `Send + Sync` so one model can be shared across concurrent requests.
pub trait Predictor: Send + Sync {
    /// Predict the price for one feature vector in schema order.
    fn predict(&self, features: &[f64]) -> anyhow::Result<f64>;
}

/// Response body returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionResponse {
    Success { predicted_price: f64 },
    Error { message: String },
}

impl PredictionResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Serialize as compact JSON.
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => json!({ "status": "error", "message": e.to_string() }).to_string(),
        }
    }
}

/// Build a feature vector from a JSON object in schema order.
///
/// Booleans count as 0/1. Missing, unexpected or non-numeric features are
/// errors.
pub fn feature_vector(schema: &FeatureSchema, body: &Value) -> anyhow::Result<Vec<f64>> {
    let object: &Map<String, Value> = body
        .as_object()
        .ok_or_else(|| anyhow!("request body must be a JSON object of feature values"))?;

    let unexpected: Vec<&str> = object
        .keys()
        .filter(|k| !schema.features.iter().any(|f| f == *k))
        .map(String::as_str)
        .collect();
    if !unexpected.is_empty() {
        bail!("unexpected feature(s): {}", unexpected.join(", "));
    }

    let missing: Vec<&str> = schema
        .features
        .iter()
        .filter(|f| !object.contains_key(f.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        bail!("missing feature(s): {}", missing.join(", "));
    }

    schema
        .features
        .iter()
        .map(|name| {
            let value = &object[name.as_str()];
            match value {
                Value::Bool(b) => Ok(f64::from(u8::from(*b))),
                Value::Number(n) => n
                    .as_f64()
                    .with_context(|| format!("feature '{name}' is not representable as a number")),
                other => Err(anyhow!("feature '{name}' must be numeric, got {other}")),
            }
        })
        .collect()
}

/// Handle one prediction request body.
pub fn handle_prediction(
    schema: &FeatureSchema,
    predictor: &dyn Predictor,
    body: &str,
) -> PredictionResponse {
    match predict_from_body(schema, predictor, body) {
        Ok(price) => {
            debug!("Predicted price {:.2}", price);
            PredictionResponse::Success {
                predicted_price: round_cents(price),
            }
        }
        Err(e) => {
            warn!("Prediction request failed: {:#}", e);
            PredictionResponse::Error {
                message: format!("{e:#}"),
            }
        }
    }
}

fn predict_from_body(
    schema: &FeatureSchema,
    predictor: &dyn Predictor,
    body: &str,
) -> anyhow::Result<f64> {
    let value: Value = serde_json::from_str(body).context("invalid JSON")?;
    let features = feature_vector(schema, &value)?;
    let price = predictor.predict(&features)?;
    if !price.is_finite() {
        bail!("model returned a non-finite prediction");
    }
    Ok(price)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
