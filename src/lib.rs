//! carfix: turns a symptom description, an optional audio or video clip and
//! the vehicle identity into probable causes, ranked fixes, parts links and a
//! mechanic recommendation.

pub mod api;
pub mod audio;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod media;
pub mod parts;
pub mod services;
pub mod vision;

pub use api::{build_router, AppState};
pub use config::Config;
pub use diagnosis::{DiagnosisPipeline, DiagnosisRequest, DiagnosisResult, SessionId, VehicleIdentity};
