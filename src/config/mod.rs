// src/config/mod.rs
pub mod settings;
pub mod sources;

pub use settings::AggregatorSettings;
pub use sources::{SourceConfig, SourceId};
