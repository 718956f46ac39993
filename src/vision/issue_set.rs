use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One label reported by the detector for one frame. Only the label survives
/// into the `IssueSet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionEvent {
    pub label: String,
    pub frame_index: u64,
}

/// Distinct labels detected across a whole clip.
///
/// A set, not a list: consumers must not rely on detection order. Iteration is
/// lexicographic so that downstream output is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct IssueSet {
    labels: BTreeSet<String>,
}

impl IssueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the label was not yet present. Blank labels are ignored.
    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.labels.insert(trimmed.to_string())
    }

    pub fn record(&mut self, event: DetectionEvent) -> bool {
        self.insert(event.label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.labels.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for IssueSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = IssueSet::new();
        for label in iter {
            set.insert(label);
        }
        set
    }
}

// Deserialized labels go through `insert` like any other.
impl From<Vec<String>> for IssueSet {
    fn from(labels: Vec<String>) -> Self {
        labels.into_iter().collect()
    }
}

impl From<IssueSet> for Vec<String> {
    fn from(set: IssueSet) -> Self {
        set.labels.into_iter().collect()
    }
}

impl<S: Into<String>> Extend<S> for IssueSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for label in iter {
            self.insert(label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_labels_collapse() {
        let mut set = IssueSet::new();
        assert!(set.record(DetectionEvent { label: "headlight".into(), frame_index: 3 }));
        assert!(!set.record(DetectionEvent { label: "headlight".into(), frame_index: 7 }));
        assert_eq!(set.len(), 1);
        assert!(set.contains("headlight"));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a: IssueSet = ["tire", "headlight", "smoke"].into_iter().collect();
        let b: IssueSet = ["smoke", "tire", "headlight", "tire"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.to_vec(), vec!["headlight", "smoke", "tire"]);
    }

    #[test]
    fn blank_labels_are_dropped() {
        let set: IssueSet = ["", "  ", " oil leak "].into_iter().collect();
        assert_eq!(set.to_vec(), vec!["oil leak"]);
    }

    #[test]
    fn deserialized_labels_are_normalized() {
        let set: IssueSet = serde_json::from_str(r#"["  tire ", "", "tire", "headlight", "   "]"#).unwrap();
        assert_eq!(set.to_vec(), vec!["headlight", "tire"]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["headlight","tire"]"#);
    }
}
