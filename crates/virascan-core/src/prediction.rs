//! Prediction results as produced by the remote classifier.
//!
//! Field names serialize with the service's snake_case keys, so a stored or
//! exported result has the same shape the service returned.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prediction {
    #[serde(rename = "Viral")]
    Viral,
    #[serde(rename = "Non-Viral", alias = "NonViral")]
    NonViral,
}

impl Prediction {
    /// Parse a service label. Accepts `Viral`, `Non-Viral` and `NonViral`,
    /// ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "viral" => Some(Prediction::Viral),
            "non-viral" | "nonviral" | "non_viral" => Some(Prediction::NonViral),
            _ => None,
        }
    }

    pub fn is_viral(&self) -> bool {
        *self == Prediction::Viral
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Viral => write!(f, "Viral"),
            Prediction::NonViral => write!(f, "Non-Viral"),
        }
    }
}

/// Aggregate counts over all submitted sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "total_sequences")]
    pub total: usize,
    #[serde(rename = "viral_sequences")]
    pub viral: usize,
    #[serde(rename = "non_viral_sequences")]
    pub non_viral: usize,
    /// Mean per-sequence probability, 0.0 to 1.0.
    #[serde(rename = "average_confidence")]
    pub avg_confidence: f64,
}

/// Verdict of one model over the whole submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub model: String,
    pub prediction: Prediction,
    #[serde(rename = "probability")]
    pub confidence_percent: f64,
    #[serde(rename = "accuracy")]
    pub accuracy_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawProbabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_viral: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viral: Option<f64>,
}

/// Classification of a single input sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedResult {
    pub sequence_id: String,
    pub prediction: Prediction,
    /// Probability of the predicted class, 0.0 to 1.0.
    pub probability: f64,
    pub sequence_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_probabilities: Option<RawProbabilities>,
}

impl DetailedResult {
    pub fn viral_probability(&self) -> Option<f64> {
        self.raw_probabilities.as_ref().and_then(|p| p.viral)
    }

    pub fn non_viral_probability(&self) -> Option<f64> {
        self.raw_probabilities.as_ref().and_then(|p| p.non_viral)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_viral: u64,
    pub false_viral: u64,
    pub true_non_viral: u64,
    pub false_non_viral: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWeight {
    pub name: String,
    pub weight: f64,
}

/// Feature weights in the order the service reported them.
///
/// Serializes as a JSON object; insertion order is kept in both directions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureImportance(pub Vec<FeatureWeight>);

impl FeatureImportance {
    pub fn iter(&self) -> impl Iterator<Item = &FeatureWeight> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for FeatureImportance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for w in &self.0 {
            map.serialize_entry(&w.name, &w.weight)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FeatureImportance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WeightsVisitor;

        impl<'de> Visitor<'de> for WeightsVisitor {
            type Value = FeatureImportance;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of feature names to weights")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut weights = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, weight)) = access.next_entry::<String, f64>()? {
                    weights.push(FeatureWeight { name, weight });
                }
                Ok(FeatureImportance(weights))
            }
        }

        deserializer.deserialize_map(WeightsVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Training accuracy of the serving model, 0.0 to 1.0.
    pub model_accuracy: f64,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<String>,
}

/// One complete prediction run. Replaced wholesale by the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub summary: Summary,
    pub model_results: Vec<ModelResult>,
    pub detailed_results: Vec<DetailedResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confusion_matrix: Option<ConfusionMatrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_importance: Option<FeatureImportance>,
    pub metadata: ResultMetadata,
}

impl PredictionResult {
    pub fn sequence_count(&self) -> usize {
        self.detailed_results.len()
    }

    pub fn viral_results(&self) -> impl Iterator<Item = &DetailedResult> {
        self.detailed_results.iter().filter(|r| r.prediction.is_viral())
    }
}
