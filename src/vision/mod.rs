pub mod detector;
pub mod issue_set;
pub mod pipeline;

pub use detector::{BoundingBox, Detection, HttpDetector, ObjectDetector};
pub use issue_set::{DetectionEvent, IssueSet};
pub use pipeline::{VisionPipeline, VisualOutcome};
