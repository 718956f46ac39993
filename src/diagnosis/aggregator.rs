use crate::diagnosis::types::{Cause, CauseOrigin};
use crate::vision::IssueSet;
use std::collections::HashSet;

/// Merge per-source findings into one duplicate-free cause list.
///
/// Each source is tagged on its own first (audio tags in their given order,
/// visual labels in set iteration order, then the description), the lists
/// are concatenated, and repeats are dropped keeping the first occurrence.
/// Only the value set is a contract; callers must not rely on order across
/// sources.
pub fn aggregate_causes(audio_tags: &[String], issues: &IssueSet, description: &str) -> Vec<Cause> {
    let audio = audio_tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| Cause::new(CauseOrigin::Audio, t));
    let visual = issues.iter().map(|label| Cause::new(CauseOrigin::Visual, label));
    let user = Some(description)
        .filter(|d| !d.trim().is_empty())
        .map(|d| Cause::new(CauseOrigin::User, d));

    let mut seen = HashSet::new();
    audio
        .chain(visual)
        .chain(user)
        .filter(|cause| seen.insert(cause.text.clone()))
        .collect()
}
