use crate::config::CostConfig;
use crate::diagnosis::types::{
    Cause, CauseSolutions, CostOptions, DiagnosisResult, MechanicListing, VehicleIdentity,
};
use crate::media::{AnnotatedMedia, MediaKind};
use crate::parts::PartsCatalog;
use crate::vision::IssueSet;
use chrono::Utc;
use std::fmt::Write;
use uuid::Uuid;

/// The hard-coded mechanic shown with every diagnosis.
pub fn default_mechanic() -> MechanicListing {
    MechanicListing {
        name: "Joe's Auto Repair".to_string(),
        address: "123 Main St, Springfield".to_string(),
        phone: "(555) 010-4477".to_string(),
        rating: 4.6,
        services: vec![
            "Diagnostics".to_string(),
            "Brakes".to_string(),
            "Engine repair".to_string(),
        ],
    }
}

/// Everything the earlier stages produced for one request.
#[derive(Debug, Clone)]
pub struct Findings {
    pub description: String,
    pub vehicle: VehicleIdentity,
    pub media_kind: Option<MediaKind>,
    pub visual_issues: IssueSet,
    pub audio_tags: Vec<String>,
    pub annotated_media: Option<AnnotatedMedia>,
    pub causes: Vec<Cause>,
    pub solutions: Vec<CauseSolutions>,
    pub notes: Vec<String>,
}

pub struct Presenter {
    parts: PartsCatalog,
    mechanic: MechanicListing,
    costs: CostConfig,
}

impl Presenter {
    pub fn new(parts: PartsCatalog, costs: CostConfig) -> Self {
        Self { parts, mechanic: default_mechanic(), costs }
    }

    /// Rough figure attached to externally sourced solutions.
    pub fn price_estimate(costs: &CostConfig) -> String {
        format!("${} DIY / ${} mechanic", costs.diy, costs.mechanic)
    }

    pub fn assemble(&self, findings: Findings) -> DiagnosisResult {
        let parts = self.parts.parts_for(&findings.vehicle);
        DiagnosisResult {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            description: findings.description,
            vehicle: findings.vehicle,
            media_kind: findings.media_kind,
            visual_issues: findings.visual_issues,
            audio_tags: findings.audio_tags,
            annotated_media: findings.annotated_media,
            causes: findings.causes,
            solutions: findings.solutions,
            parts,
            mechanic: self.mechanic.clone(),
            options: CostOptions {
                diy: format!("${} estimated", self.costs.diy),
                mechanic: format!("${} estimated", self.costs.mechanic),
            },
            notes: findings.notes,
        }
    }
}

/// Text rendering of one history entry for terminals.
pub fn render_markdown(result: &DiagnosisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "### Diagnosis: {}", result.vehicle.label());
    if !result.description.trim().is_empty() {
        let _ = writeln!(out, "{}", result.description);
    }
    out.push('\n');

    if !result.visual_issues.is_empty() {
        let labels: Vec<&str> = result.visual_issues.iter().collect();
        let _ = writeln!(out, "**Detected Visual Issues:** {}", labels.join(", "));
    }
    if !result.audio_tags.is_empty() {
        let _ = writeln!(out, "**Audio Findings:** {}", result.audio_tags.join(", "));
    }

    if !result.causes.is_empty() {
        let _ = writeln!(out, "\n**Probable Causes:**");
        for cause in &result.causes {
            let _ = writeln!(out, "- {}", cause.text);
        }
    }

    for group in &result.solutions {
        let _ = writeln!(out, "\n**Suggested Solutions for {}:**", group.cause);
        for (rank, s) in group.solutions.iter().enumerate() {
            match &s.source {
                Some(link) => {
                    let _ = writeln!(out, "{}. [{}]({}) ({})", rank + 1, s.title, link, s.price_estimate);
                }
                None => {
                    let _ = writeln!(out, "{}. {} ({})", rank + 1, s.title, s.price_estimate);
                }
            }
            if let Some(details) = &s.details {
                for line in details.lines().filter(|l| !l.trim().is_empty()) {
                    let _ = writeln!(out, "   {}", line.trim());
                }
            }
        }
        for video in &group.videos {
            let _ = writeln!(out, "   Video: [{}]({})", video.title, video.url);
        }
    }

    if let Some(media) = &result.annotated_media {
        let _ = writeln!(out, "\n**Annotated Video:** {} ({} frames)", media.path.display(), media.frame_count);
    }

    let _ = writeln!(out, "\n**Parts:**");
    for part in &result.parts {
        let _ = writeln!(out, "- [{}]({})", part.name, part.url);
    }

    let m = &result.mechanic;
    let _ = writeln!(out, "\n**Recommended Mechanic:** {} ({:.1}/5)", m.name, m.rating);
    let _ = writeln!(out, "{} | {}", m.address, m.phone);

    let _ = writeln!(out, "\n**Options:**");
    let _ = writeln!(out, "DIY: {}", result.options.diy);
    let _ = writeln!(out, "Mechanic: {}", result.options.mechanic);

    for note in &result.notes {
        let _ = writeln!(out, "\n_{}_", note);
    }
    out.push_str("\n---\n");
    out
}
