//! Grouping of findings by PCI DSS requirement

use std::collections::BTreeMap;

use sentinelpay_domain::{PciRequirement, RiskFinding, Severity};

/// Findings that share one requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct FindingGroup {
    pub requirement: PciRequirement,
    pub findings: Vec<RiskFinding>,
}

impl FindingGroup {
    pub fn new(requirement: PciRequirement, findings: Vec<RiskFinding>) -> Self {
        Self { requirement, findings }
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Maximum severity across the group; `None` for an empty group.
    pub fn rollup(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}

/// Group findings by requirement.
///
/// Groups come out in requirement order; findings keep their input order
/// within a group.
pub fn group_by_requirement<I>(findings: I) -> Vec<FindingGroup>
where
    I: IntoIterator<Item = RiskFinding>,
{
    let mut groups: BTreeMap<PciRequirement, Vec<RiskFinding>> = BTreeMap::new();
    for finding in findings {
        groups.entry(finding.requirement()).or_default().push(finding);
    }
    groups
        .into_iter()
        .map(|(requirement, findings)| FindingGroup::new(requirement, findings))
        .collect()
}

#[cfg(test)]
mod tests {
    use sentinelpay_domain::{FindingSource, RiskCategory};

    use super::*;

    fn finding(id: &str, severity: Severity, category: RiskCategory) -> RiskFinding {
        RiskFinding {
            record_id: id.into(),
            severity,
            category,
            rationale: String::new(),
            source: FindingSource::Model,
        }
    }

    #[test]
    fn groups_in_requirement_order() {
        let groups = group_by_requirement(vec![
            finding("a", Severity::Low, RiskCategory::Other),
            finding("b", Severity::High, RiskCategory::VelocityAnomaly),
            finding("c", Severity::Critical, RiskCategory::SensitiveDataExposure),
            finding("d", Severity::Medium, RiskCategory::AmountOutlier),
        ]);

        let requirements: Vec<_> = groups.iter().map(|g| g.requirement).collect();
        assert_eq!(
            requirements,
            vec![
                PciRequirement::RenderPanUnreadable,
                PciRequirement::ReviewLogs,
                PciRequirement::IncidentResponse,
            ]
        );

        let review: Vec<_> = groups[1].findings.iter().map(|f| f.record_id.as_str()).collect();
        assert_eq!(review, vec!["b", "d"]);
        assert_eq!(groups[1].rollup(), Some(Severity::High));
    }

    #[test]
    fn no_findings_no_groups() {
        assert!(group_by_requirement(Vec::new()).is_empty());
    }
}
