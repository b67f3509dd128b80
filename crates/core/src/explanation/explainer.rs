//! Compliance explainer - narrative and remediation per requirement

use std::sync::Arc;

use futures::future::join_all;
use sentinelpay_domain::constants::{EXPLANATION_UNAVAILABLE, MAX_FINDINGS_PER_PROMPT};
use sentinelpay_domain::{
    ComplianceSection, ExplanationStatus, InferenceError, PciRequirement, Severity,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::grouping::FindingGroup;
use crate::inference::{GenerationOptions, InferenceGateway, Prompt};
use crate::sanitization::Sanitizer;

const SYSTEM_PROMPT: &str = "You are a PCI-DSS compliance auditor writing one section of a \
violation report. The findings you receive are already sanitized; placeholders such as \
[REDACTED:PAN] must stay as they are. Respond with a single JSON object and nothing else: \
{\"narrative\": \"what was observed and why it violates the requirement\", \
\"remediation\": \"concrete steps to restore compliance\"}.";

#[derive(Debug, Deserialize)]
struct ExplanationPayload {
    narrative: String,
    #[serde(default)]
    remediation: String,
}

/// A group whose explanation could not be generated.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFailure {
    pub requirement: PciRequirement,
    pub error: InferenceError,
}

/// Sections for every non-empty group, plus the groups that fell back to
/// mechanical text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplanationOutcome {
    pub sections: Vec<ComplianceSection>,
    pub failures: Vec<GroupFailure>,
}

impl ExplanationOutcome {
    /// True when at least one group was attempted and every attempt failed
    /// with an unavailable backend.
    pub fn all_unavailable(&self) -> bool {
        !self.sections.is_empty()
            && self.failures.len() == self.sections.len()
            && self.failures.iter().all(|f| f.error.is_unavailable())
    }
}

/// Compliance explainer service
#[derive(Clone)]
pub struct ComplianceExplainer {
    gateway: InferenceGateway,
    sanitizer: Arc<Sanitizer>,
    options: GenerationOptions,
}

impl ComplianceExplainer {
    pub fn new(
        gateway: InferenceGateway,
        sanitizer: Arc<Sanitizer>,
        options: GenerationOptions,
    ) -> Self {
        Self { gateway, sanitizer, options }
    }

    /// One section per non-empty group, sorted by requirement.
    ///
    /// A failed group still yields a section: the narrative reads
    /// "explanation unavailable", the remediation is the requirement's
    /// standard guidance and the severity rollup is computed as usual.
    pub async fn explain(&self, groups: Vec<FindingGroup>) -> ExplanationOutcome {
        let groups: Vec<FindingGroup> = groups.into_iter().filter(|g| !g.is_empty()).collect();
        if groups.is_empty() {
            return ExplanationOutcome::default();
        }

        let results = join_all(groups.iter().map(|group| self.explain_group(group))).await;

        let mut outcome = ExplanationOutcome::default();
        for (group, result) in groups.into_iter().zip(results) {
            let requirement = group.requirement;
            match result {
                Ok(payload) => outcome.sections.push(self.generated_section(group, payload)),
                Err(error) => {
                    warn!(requirement = requirement.code(), error = %error, "explanation_failed");
                    outcome.failures.push(GroupFailure { requirement, error });
                    outcome.sections.push(mechanical_section(group));
                }
            }
        }
        outcome.sections.sort_by_key(|section| section.requirement);

        info!(
            sections = outcome.sections.len(),
            failures = outcome.failures.len(),
            "explanations_completed"
        );
        outcome
    }

    /// Sections without any model call, as used for cancelled runs.
    pub fn explain_mechanically(groups: Vec<FindingGroup>) -> Vec<ComplianceSection> {
        let mut sections: Vec<ComplianceSection> =
            groups.into_iter().filter(|g| !g.is_empty()).map(mechanical_section).collect();
        sections.sort_by_key(|section| section.requirement);
        sections
    }

    #[instrument(
        skip(self, group),
        fields(requirement = group.requirement.code(), findings = group.findings.len())
    )]
    async fn explain_group(
        &self,
        group: &FindingGroup,
    ) -> Result<ExplanationPayload, InferenceError> {
        let prompt = Prompt::new(group_prompt(group)).with_system(SYSTEM_PROMPT);
        let payload: ExplanationPayload = self.gateway.generate_json(&prompt, &self.options).await?;

        if payload.narrative.trim().is_empty() {
            return Err(InferenceError::Malformed("explanation has an empty narrative".into()));
        }
        Ok(payload)
    }

    fn generated_section(
        &self,
        group: FindingGroup,
        payload: ExplanationPayload,
    ) -> ComplianceSection {
        let remediation = if payload.remediation.trim().is_empty() {
            group.requirement.standard_remediation().to_string()
        } else {
            self.sanitizer.scrub_text(payload.remediation.trim())
        };

        ComplianceSection {
            requirement: group.requirement,
            title: group.requirement.title().to_string(),
            narrative: self.sanitizer.scrub_text(payload.narrative.trim()),
            remediation,
            severity: rollup(&group),
            findings: group.findings,
            explanation_status: ExplanationStatus::Generated,
        }
    }
}

fn mechanical_section(group: FindingGroup) -> ComplianceSection {
    ComplianceSection {
        requirement: group.requirement,
        title: group.requirement.title().to_string(),
        narrative: EXPLANATION_UNAVAILABLE.to_string(),
        remediation: group.requirement.standard_remediation().to_string(),
        severity: rollup(&group),
        findings: group.findings,
        explanation_status: ExplanationStatus::Unavailable,
    }
}

// Callers only build sections from non-empty groups.
fn rollup(group: &FindingGroup) -> Severity {
    group.rollup().unwrap_or(Severity::Low)
}

fn group_prompt(group: &FindingGroup) -> String {
    let requirement = group.requirement;
    let mut prompt = format!(
        "{requirement} - {}\nHighest severity: {}\nFindings ({}):\n",
        requirement.title(),
        rollup(group),
        group.findings.len()
    );

    for finding in group.findings.iter().take(MAX_FINDINGS_PER_PROMPT) {
        prompt.push_str(&format!(
            "- [{}] {} (transaction {}): {}\n",
            finding.severity, finding.category, finding.record_id, finding.rationale
        ));
    }
    if group.findings.len() > MAX_FINDINGS_PER_PROMPT {
        prompt.push_str(&format!(
            "... and {} more findings of the same requirement\n",
            group.findings.len() - MAX_FINDINGS_PER_PROMPT
        ));
    }

    prompt.push_str("Write the narrative and remediation for this requirement.");
    prompt
}
