//! Configuration: engine timings and persisted user settings.

pub mod engine;
pub mod settings;

pub use engine::{EngineConfig, period_ticks, ticks};
pub use settings::{Settings, mask_key};
