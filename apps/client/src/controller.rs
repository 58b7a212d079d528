//! The Upload -> Model Selection -> Results pipeline.
//!
//! State lives in the [`WorkflowStore`](virascan_store::WorkflowStore) so a new
//! controller over the same store picks up where the previous one stopped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use virascan_core::prediction::PredictionResult;
use virascan_core::request::PredictionRequest;
use virascan_core::upload::UploadedFileMeta;
use virascan_formats::detect::UploadPolicy;
use virascan_formats::fasta::ParseMode;
use virascan_gateway::{GatewayError, HealthStatus, PredictionGateway};
use virascan_store::{SharedStore, Slot, SlotBacking, StoreError, WorkflowStore};

use crate::config::Config;
use crate::ingest::{self, StagedInput, ValidationError};
use crate::notification::{Level, NotificationCenter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Staged,
    Predicting,
    Completed,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Idle => "idle",
            Stage::Staged => "staged",
            Stage::Predicting => "predicting",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Could not save pipeline state: {0}")]
    Persistence(#[from] StoreError),
    #[error("A prediction is already running")]
    PredictionInFlight,
    #[error("Prediction service is not reachable")]
    ServiceUnreachable,
    #[error("Cannot {action} while the pipeline is {stage}")]
    InvalidStage { action: &'static str, stage: Stage },
}

/// Input handling knobs taken from the configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineSettings {
    pub policy: UploadPolicy,
    pub parse_mode: ParseMode,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            policy: config.upload_policy(),
            parse_mode: config.parse_mode(),
        }
    }
}

/// Marks a predict call as running; cleared on drop, including early returns.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PipelineController<G, B: SlotBacking> {
    gateway: G,
    store: SharedStore<B>,
    settings: PipelineSettings,
    notifications: NotificationCenter,
    stage: Mutex<Stage>,
    in_flight: AtomicBool,
}

impl<G: PredictionGateway, B: SlotBacking> PipelineController<G, B> {
    /// Resume from whatever the store already holds.
    pub fn new(
        gateway: G,
        store: SharedStore<B>,
        settings: PipelineSettings,
        notifications: NotificationCenter,
    ) -> Self {
        let stage = {
            let guard = store.lock().unwrap_or_else(PoisonError::into_inner);
            resume_stage(&guard)
        };
        log::debug!("Pipeline resumed in stage {}", stage);

        Self {
            gateway,
            store,
            settings,
            notifications,
            stage: Mutex::new(stage),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn stage(&self) -> Stage {
        *self.stage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn store(&self) -> &SharedStore<B> {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Stage pasted text, replacing any previous upload.
    pub fn stage_text(&self, text: &str) -> Result<UploadedFileMeta, PipelineError> {
        self.ensure_not_predicting("upload a sequence")?;
        let input = ingest::ingest_text(text, self.settings.parse_mode);
        self.stage_input(input)
    }

    /// Stage a file's content, replacing any previous upload.
    pub fn stage_file(&self, name: &str, content: &str) -> Result<UploadedFileMeta, PipelineError> {
        self.ensure_not_predicting("upload a file")?;
        let input = ingest::ingest_file(name, content, &self.settings.policy, self.settings.parse_mode);
        self.stage_input(input)
    }

    pub fn check_health(&self) -> HealthStatus {
        self.gateway.check_health()
    }

    /// Submit the staged upload to the given models.
    pub fn predict<I, S>(&self, model_ids: I) -> Result<PredictionResult, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Err(self.fail(PipelineError::PredictionInFlight));
        };

        let stage = self.stage();
        if stage != Stage::Staged {
            return Err(self.fail(PipelineError::InvalidStage {
                action: "run a prediction",
                stage,
            }));
        }

        let Some((meta, content)) = self.lock_store().load_upload() else {
            return Err(self.fail(
                ValidationError::single("No staged sequence; upload a file or paste a sequence first").into(),
            ));
        };

        let request = match PredictionRequest::new(content, meta.name, model_ids) {
            Ok(r) => r,
            Err(e) => return Err(self.fail(ValidationError::single(e.to_string()).into())),
        };

        let health = self.gateway.check_health();
        if !health.reachable {
            return Err(self.fail(PipelineError::ServiceUnreachable));
        }
        if health.model_trained == Some(false) {
            log::warn!("Prediction service reports no trained model");
        }

        let run_id = Uuid::new_v4();
        self.transition(Stage::Predicting);
        log::info!(
            "Run {} submitting '{}' to {:?}",
            run_id,
            request.file_name(),
            request.model_ids()
        );

        match self.gateway.predict(&request) {
            Ok(result) => {
                if let Err(e) = self.lock_store().save_results(&result) {
                    self.transition(Stage::Staged);
                    return Err(self.fail(e.into()));
                }
                self.transition(Stage::Completed);
                log::info!("Run {} finished with {} sequences", run_id, result.sequence_count());
                self.notifications.notify(
                    Level::Success,
                    format!(
                        "Prediction complete: {} of {} sequences viral",
                        result.summary.viral, result.summary.total
                    ),
                );
                Ok(result)
            }
            Err(e) => {
                log::warn!("Run {} failed: {}", run_id, e);
                self.transition(Stage::Failed);
                self.transition(Stage::Staged);
                Err(self.fail(e.into()))
            }
        }
    }

    /// Forget both the upload and the results.
    pub fn restart(&self) -> Result<(), PipelineError> {
        self.ensure_not_predicting("restart")?;
        self.lock_store().clear_all().map_err(|e| self.fail(e.into()))?;
        self.transition(Stage::Idle);
        self.notifications.notify(Level::Info, "Pipeline restarted");
        Ok(())
    }

    pub fn results(&self) -> Option<PredictionResult> {
        self.lock_store().load_results()
    }

    pub fn upload(&self) -> Option<(UploadedFileMeta, String)> {
        self.lock_store().load_upload()
    }

    fn stage_input(&self, input: Result<StagedInput, ValidationError>) -> Result<UploadedFileMeta, PipelineError> {
        let staged = input.map_err(|e| self.fail(e.into()))?;

        self.lock_store()
            .save_upload(&staged.meta, &staged.content)
            .map_err(|e| self.fail(e.into()))?;

        self.transition(Stage::Staged);
        self.notifications.notify(
            Level::Success,
            format!(
                "'{}' ready for prediction ({} sequence{})",
                staged.meta.name,
                staged.record_count,
                if staged.record_count == 1 { "" } else { "s" }
            ),
        );
        Ok(staged.meta)
    }

    fn ensure_not_predicting(&self, action: &'static str) -> Result<(), PipelineError> {
        if self.in_flight.load(Ordering::Acquire) || self.stage() == Stage::Predicting {
            return Err(self.fail(PipelineError::InvalidStage {
                action,
                stage: Stage::Predicting,
            }));
        }
        Ok(())
    }

    fn transition(&self, next: Stage) {
        let mut stage = self.stage.lock().unwrap_or_else(PoisonError::into_inner);
        if *stage != next {
            log::info!("Pipeline stage {} -> {}", *stage, next);
            *stage = next;
        }
    }

    fn fail(&self, error: PipelineError) -> PipelineError {
        self.notifications.notify(Level::Error, error.to_string());
        error
    }

    fn lock_store(&self) -> MutexGuard<'_, WorkflowStore<B>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn resume_stage<B: SlotBacking>(store: &WorkflowStore<B>) -> Stage {
    // An upload saved after the last results still needs its prediction.
    if store.upload_pending() {
        Stage::Staged
    } else if store.has(Slot::Results) {
        Stage::Completed
    } else if store.has(Slot::Upload) {
        Stage::Staged
    } else {
        Stage::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use virascan_store::MemoryBacking;

    struct Offline;

    impl PredictionGateway for Offline {
        fn check_health(&self) -> HealthStatus {
            HealthStatus::unreachable()
        }

        fn predict(&self, _request: &PredictionRequest) -> Result<PredictionResult, GatewayError> {
            Err(GatewayError::NetworkUnavailable("offline".to_string()))
        }
    }

    fn controller(store: SharedStore<MemoryBacking>) -> PipelineController<Offline, MemoryBacking> {
        PipelineController::new(
            Offline,
            store,
            PipelineSettings::default(),
            NotificationCenter::new(std::time::Duration::ZERO),
        )
    }

    #[test]
    fn test_in_flight_guard_releases() {
        let flag = AtomicBool::new(false);
        {
            let _guard = InFlightGuard::acquire(&flag).unwrap();
            assert!(InFlightGuard::acquire(&flag).is_none());
        }
        assert!(!flag.load(Ordering::Acquire));
        assert!(InFlightGuard::acquire(&flag).is_some());
    }

    #[test]
    fn test_fresh_store_starts_idle() {
        let ctl = controller(WorkflowStore::new(MemoryBacking::new()).shared());
        assert_eq!(ctl.stage(), Stage::Idle);
        assert!(ctl.results().is_none());
    }

    #[test]
    fn test_stage_text_persists_upload() {
        let store = WorkflowStore::new(MemoryBacking::new()).shared();
        let ctl = controller(store.clone());
        let meta = ctl.stage_text("atcg\natcg").unwrap();

        assert_eq!(ctl.stage(), Stage::Staged);
        assert_eq!(meta.name, "pasted_sequence.fasta");
        let (_, content) = store.lock().unwrap().load_upload().unwrap();
        assert_eq!(content, ">User_Sequence\nATCGATCG");

        // A second controller over the same store resumes in Staged.
        assert_eq!(controller(store).stage(), Stage::Staged);
    }

    #[test]
    fn test_validation_keeps_stage_and_notifies() {
        let ctl = controller(WorkflowStore::new(MemoryBacking::new()).shared());
        let err = ctl.stage_text("hello").unwrap_err();

        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(ctl.stage(), Stage::Idle);
        let active = ctl.notifications().active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].level, Level::Error);
    }

    #[test]
    fn test_predict_requires_staged() {
        let ctl = controller(WorkflowStore::new(MemoryBacking::new()).shared());
        let err = ctl.predict(["random_forest"]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidStage {
                stage: Stage::Idle,
                ..
            }
        ));
    }

    #[test]
    fn test_unreachable_service_keeps_staged() {
        let ctl = controller(WorkflowStore::new(MemoryBacking::new()).shared());
        ctl.stage_text("ACGT").unwrap();
        let err = ctl.predict(["random_forest"]).unwrap_err();
        assert!(matches!(err, PipelineError::ServiceUnreachable));
        assert_eq!(ctl.stage(), Stage::Staged);
    }

    #[test]
    fn test_restart_clears_everything() {
        let store = WorkflowStore::new(MemoryBacking::new()).shared();
        let ctl = controller(store.clone());
        ctl.stage_text("ACGT").unwrap();
        ctl.restart().unwrap();

        assert_eq!(ctl.stage(), Stage::Idle);
        assert!(ctl.upload().is_none());
        assert!(store.lock().unwrap().backing().is_empty());
    }

    /// Reads and writes pass through; batch removal fails without touching anything.
    #[derive(Default)]
    struct FailingRemoval(MemoryBacking);

    impl SlotBacking for FailingRemoval {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            self.0.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.0.remove(key)
        }

        fn remove_all(&mut self, _keys: &[&str]) -> Result<(), StoreError> {
            let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
            Err(StoreError::Serialize(err))
        }
    }

    #[test]
    fn test_failed_restart_keeps_state() {
        let mut store = WorkflowStore::new(FailingRemoval::default());
        store
            .save_upload(&UploadedFileMeta::new("a.fasta", 8, "text/x-fasta"), ">a\nACGT")
            .unwrap();
        let store = store.shared();
        let ctl = PipelineController::new(
            Offline,
            store.clone(),
            PipelineSettings::default(),
            NotificationCenter::new(std::time::Duration::ZERO),
        );
        assert_eq!(ctl.stage(), Stage::Staged);

        let err = ctl.restart().unwrap_err();
        assert!(matches!(err, PipelineError::Persistence(_)));
        assert_eq!(ctl.stage(), Stage::Staged);
        assert!(store.lock().unwrap().has(Slot::Upload));
    }

    #[test]
    fn test_upload_after_results_resumes_staged() {
        let store = WorkflowStore::new(MemoryBacking::new()).shared();
        {
            let mut guard = store.lock().unwrap();
            guard
                .save_upload(&UploadedFileMeta::new("a.fasta", 8, "text/x-fasta"), ">a\nACGT")
                .unwrap();
            let result: PredictionResult = serde_json::from_str(RESULT_JSON).unwrap();
            guard.save_results(&result).unwrap();
        }
        assert_eq!(controller(store.clone()).stage(), Stage::Completed);

        controller(store.clone()).stage_text("GGGG").unwrap();
        let resumed = controller(store);
        assert_eq!(resumed.stage(), Stage::Staged);
        assert!(resumed.results().is_some());
    }

    const RESULT_JSON: &str = r#"{
        "summary": {"total_sequences": 0, "viral_sequences": 0, "non_viral_sequences": 0, "average_confidence": 0.0},
        "model_results": [],
        "detailed_results": [],
        "metadata": {"model_accuracy": 0.9, "timestamp": "2026-10-16T10:00:00"}
    }"#;

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.fasta.strict_headers = true;
        let settings = PipelineSettings::from(&config);
        assert_eq!(settings.parse_mode, ParseMode::Strict);
        assert_eq!(settings.policy, UploadPolicy::default());
    }
}
