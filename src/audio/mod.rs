pub mod analyzer;
pub mod tagger;

pub use analyzer::{AudioAnalyzer, TranscriptionClient};
pub use tagger::{match_fault_keywords, AudioTagger};
