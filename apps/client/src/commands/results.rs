use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;
use clap::ValueEnum;
use virascan_formats::export;
use virascan_gateway::PredictionGateway;
use virascan_store::SlotBacking;

use crate::controller::PipelineController;
use crate::dto::{ExportDto, ResultsDto};

const NO_RESULTS: &str = "No results available; run a prediction first";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

pub fn get_results<G: PredictionGateway, B: SlotBacking>(
    controller: &PipelineController<G, B>,
) -> Result<ResultsDto, String> {
    let result = controller.results().ok_or_else(|| NO_RESULTS.to_string())?;
    Ok(ResultsDto::from(&result))
}

/// The stored result in the service's JSON shape.
pub fn get_results_json<G: PredictionGateway, B: SlotBacking>(
    controller: &PipelineController<G, B>,
) -> Result<String, String> {
    let result = controller.results().ok_or_else(|| NO_RESULTS.to_string())?;
    export::to_json(&result).map_err(|e| e.to_string())
}

/// Write the stored result into `out_dir` under its dated download name.
pub fn export_results<G: PredictionGateway, B: SlotBacking>(
    controller: &PipelineController<G, B>,
    format: ExportFormat,
    out_dir: &Path,
    date: NaiveDate,
) -> Result<ExportDto, String> {
    let result = controller.results().ok_or_else(|| NO_RESULTS.to_string())?;

    let (file_name, content) = match format {
        ExportFormat::Csv => (export::csv_filename(date), export::to_csv(&result)),
        ExportFormat::Json => (export::json_filename(date), export::to_json(&result)),
    };
    let content = content.map_err(|e| format!("Failed to export results: {}", e))?;

    let path = out_dir.join(file_name);
    std::fs::write(&path, &content)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    log::info!("Exported {} bytes to {}", content.len(), path.display());

    Ok(ExportDto {
        path: path.display().to_string(),
        format: format.as_str().to_string(),
        bytes: content.len(),
    })
}

/// Plain-text rendering for the terminal.
pub fn render_results(results: &ResultsDto) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Summary: {} sequences, {} viral, {} non-viral, average confidence {:.2}%",
        results.total, results.viral, results.non_viral, results.average_confidence
    );

    if !results.models.is_empty() {
        let _ = writeln!(out, "\nModels:");
        for m in &results.models {
            let _ = writeln!(
                out,
                "  {:<24} {:<10} {:>7.2}%  (accuracy {:.2}%)",
                m.model, m.prediction, m.confidence, m.accuracy
            );
        }
    }

    if !results.sequences.is_empty() {
        let _ = writeln!(out, "\nSequences:");
        for s in &results.sequences {
            let _ = writeln!(
                out,
                "  {:<24} {:<10} {:>7.2}%  {} bp",
                s.sequence_id, s.prediction, s.confidence, s.length
            );
        }
    }

    let _ = write!(out, "\nGenerated {}", results.timestamp);
    out
}
