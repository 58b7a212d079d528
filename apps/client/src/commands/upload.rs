use std::path::Path;

use virascan_gateway::PredictionGateway;
use virascan_store::SlotBacking;

use crate::controller::PipelineController;
use crate::dto::UploadDto;

/// Stage a FASTA or plain sequence file from disk.
pub fn upload_file<G: PredictionGateway, B: SlotBacking>(
    controller: &PipelineController<G, B>,
    path: &Path,
) -> Result<UploadDto, String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("Invalid file path: {}", path.display()))?;
    let size = std::fs::metadata(path)
        .map_err(|e| format!("Failed to read file: {}", e))?
        .len();

    // Type and size are known from metadata; don't load a file that will be refused.
    controller
        .settings()
        .policy
        .check(name, size)
        .map_err(|reasons| reasons.join("; "))?;

    let content = std::fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;
    let meta = controller
        .stage_file(name, &content)
        .map_err(|e| e.to_string())?;
    Ok(UploadDto::from(&meta))
}

/// Stage a pasted sequence.
pub fn upload_text<G: PredictionGateway, B: SlotBacking>(
    controller: &PipelineController<G, B>,
    text: &str,
) -> Result<UploadDto, String> {
    let meta = controller.stage_text(text).map_err(|e| e.to_string())?;
    Ok(UploadDto::from(&meta))
}
