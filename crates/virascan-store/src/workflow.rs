use std::sync::{Arc, Mutex};

use virascan_core::prediction::PredictionResult;
use virascan_core::upload::UploadedFileMeta;

use crate::backing::SlotBacking;
use crate::StoreError;

pub const UPLOAD_META_KEY: &str = "upload.meta";
pub const UPLOAD_CONTENT_KEY: &str = "upload.content";
pub const RESULTS_KEY: &str = "results";
/// Set when the upload is newer than the stored results, cleared when results land.
pub const UPLOAD_PENDING_KEY: &str = "upload.pending";

const ALL_KEYS: [&str; 4] = [UPLOAD_META_KEY, UPLOAD_CONTENT_KEY, UPLOAD_PENDING_KEY, RESULTS_KEY];

/// One independently persisted unit of pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Upload,
    Results,
}

impl Slot {
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Slot::Upload => &[UPLOAD_META_KEY, UPLOAD_CONTENT_KEY, UPLOAD_PENDING_KEY],
            Slot::Results => &[RESULTS_KEY],
        }
    }
}

/// A store shared between the controller and the front end.
pub type SharedStore<B> = Arc<Mutex<WorkflowStore<B>>>;

/// Hand-off of the active upload and the latest results between pipeline
/// stages. Each slot holds at most one value; reads never fail, a missing or
/// unreadable slot is simply absent.
pub struct WorkflowStore<B: SlotBacking> {
    backing: B,
}

impl<B: SlotBacking> WorkflowStore<B> {
    pub fn new(backing: B) -> Self {
        Self { backing }
    }

    pub fn shared(self) -> SharedStore<B> {
        Arc::new(Mutex::new(self))
    }

    pub fn backing(&self) -> &B {
        &self.backing
    }

    pub fn into_backing(self) -> B {
        self.backing
    }

    /// Replace the upload slot. Meta and content are written together and
    /// the upload is marked as not yet predicted.
    pub fn save_upload(&mut self, meta: &UploadedFileMeta, content: &str) -> Result<(), StoreError> {
        let meta_json = serde_json::to_string(meta)?;
        self.backing.set_all(&[
            (UPLOAD_META_KEY, meta_json.as_str()),
            (UPLOAD_CONTENT_KEY, content),
            (UPLOAD_PENDING_KEY, "1"),
        ])?;
        log::debug!("Saved upload '{}' ({} bytes)", meta.name, meta.size);
        Ok(())
    }

    /// The active upload, or `None` unless both halves are present and readable.
    pub fn load_upload(&self) -> Option<(UploadedFileMeta, String)> {
        let meta_json = self.read(UPLOAD_META_KEY)?;
        let content = self.read(UPLOAD_CONTENT_KEY)?;
        let meta = decode(UPLOAD_META_KEY, &meta_json)?;
        Some((meta, content))
    }

    pub fn save_results(&mut self, result: &PredictionResult) -> Result<(), StoreError> {
        let json = serde_json::to_string(result)?;
        self.backing
            .set_all(&[(RESULTS_KEY, json.as_str()), (UPLOAD_PENDING_KEY, "")])?;
        log::debug!("Saved results for {} sequences", result.sequence_count());
        Ok(())
    }

    pub fn load_results(&self) -> Option<PredictionResult> {
        let json = self.read(RESULTS_KEY)?;
        decode(RESULTS_KEY, &json)
    }

    pub fn has(&self, slot: Slot) -> bool {
        match slot {
            Slot::Upload => self.load_upload().is_some(),
            Slot::Results => self.load_results().is_some(),
        }
    }

    /// True when the stored upload was saved after the stored results, or
    /// there are no results yet.
    pub fn upload_pending(&self) -> bool {
        self.read(UPLOAD_PENDING_KEY).is_some() && self.load_upload().is_some()
    }

    /// Remove one slot. The other slot is left untouched.
    pub fn clear(&mut self, slot: Slot) -> Result<(), StoreError> {
        self.backing.remove_all(slot.keys())?;
        log::debug!("Cleared {:?} slot", slot);
        Ok(())
    }

    /// Remove both slots in one write.
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        self.backing.remove_all(&ALL_KEYS)?;
        log::debug!("Cleared all slots");
        Ok(())
    }

    /// Empty values read as absent.
    fn read(&self, key: &str) -> Option<String> {
        match self.backing.get(key) {
            Ok(Some(value)) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Could not read '{}', treating slot as empty: {}", key, e);
                None
            }
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(key: &str, json: &str) -> Option<T> {
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Stored '{}' is unreadable, treating slot as empty: {}", key, e);
            None
        }
    }
}
