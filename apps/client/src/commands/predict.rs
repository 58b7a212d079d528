use virascan_gateway::PredictionGateway;
use virascan_store::SlotBacking;

use crate::controller::PipelineController;
use crate::dto::ResultsDto;

/// Run the staged upload through `models`, or through `defaults` when none are given.
pub fn run_prediction<G: PredictionGateway, B: SlotBacking>(
    controller: &PipelineController<G, B>,
    models: &[String],
    defaults: &[String],
) -> Result<ResultsDto, String> {
    let selected = if models.is_empty() { defaults } else { models };
    let result = controller.predict(selected).map_err(|e| e.to_string())?;
    Ok(ResultsDto::from(&result))
}
