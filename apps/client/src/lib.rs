//! Client side of the viral classification pipeline: input staging,
//! prediction runs and results export over a persisted workflow store.

pub mod commands;
pub mod config;
pub mod controller;
pub mod dto;
pub mod ingest;
pub mod notification;

pub use config::Config;
pub use controller::{PipelineController, PipelineError, PipelineSettings, Stage};
pub use notification::NotificationCenter;
