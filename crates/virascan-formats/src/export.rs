//! Downloadable views of a prediction result.

use chrono::NaiveDate;
use virascan_core::prediction::PredictionResult;

use crate::ExportError;

pub const CSV_HEADER: [&str; 6] = [
    "Sequence_ID",
    "Prediction",
    "Confidence",
    "Length",
    "Viral_Probability",
    "NonViral_Probability",
];

const MISSING: &str = "N/A";

/// One row per detailed result, in result order.
pub fn to_csv(result: &PredictionResult) -> Result<String, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(CSV_HEADER)?;
    for r in &result.detailed_results {
        wtr.write_record([
            r.sequence_id.clone(),
            r.prediction.to_string(),
            percent(r.probability),
            r.sequence_length.to_string(),
            r.viral_probability().map_or_else(|| MISSING.to_string(), percent),
            r.non_viral_probability().map_or_else(|| MISSING.to_string(), percent),
        ])?;
    }

    let bytes = wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Pretty-printed JSON of the full result, two-space indent.
pub fn to_json(result: &PredictionResult) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(result)?)
}

pub fn json_filename(date: NaiveDate) -> String {
    format!("viral_prediction_results_{}.json", date.format("%Y-%m-%d"))
}

pub fn csv_filename(date: NaiveDate) -> String {
    format!("viral_predictions_{}.csv", date.format("%Y-%m-%d"))
}

fn percent(probability: f64) -> String {
    format!("{:.2}", probability * 100.0)
}
