use virascan_gateway::PredictionGateway;
use virascan_store::SlotBacking;

use crate::controller::PipelineController;
use crate::dto::{HealthDto, StatusDto, UploadDto};

pub fn check_health<G: PredictionGateway, B: SlotBacking>(
    controller: &PipelineController<G, B>,
    server: &str,
) -> HealthDto {
    HealthDto::new(server, &controller.check_health())
}

pub fn get_status<G: PredictionGateway, B: SlotBacking>(controller: &PipelineController<G, B>) -> StatusDto {
    StatusDto {
        stage: controller.stage(),
        upload: controller.upload().map(|(meta, _)| UploadDto::from(&meta)),
        has_results: controller.results().is_some(),
        notifications: controller.notifications().active(),
    }
}

pub fn restart<G: PredictionGateway, B: SlotBacking>(controller: &PipelineController<G, B>) -> Result<(), String> {
    controller.restart().map_err(|e| e.to_string())
}
