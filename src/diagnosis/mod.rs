//! The per-request diagnosis flow and the data it produces.

pub mod aggregator;
pub mod history;
pub mod pipeline;
pub mod presenter;
pub mod types;

pub use aggregator::aggregate_causes;
pub use history::{HistoryStore, InMemoryHistoryStore, SessionId};
pub use pipeline::{remove_artifact, DiagnosisPipeline, PipelineBuilder};
pub use presenter::{default_mechanic, render_markdown, Presenter};
pub use types::*;
