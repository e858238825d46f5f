use crate::model::{ComplianceResult, Issue, ScanSummary, Severity};
use crate::structural::StructuralOutcome;

/// Structural issues first, then AI issues. No de-duplication.
pub fn merge(structural: Vec<Issue>, semantic: Vec<Issue>) -> Vec<Issue> {
    let mut issues = structural;
    issues.extend(semantic);
    issues
}

/// Count issues by impact; pass/incomplete/inapplicable come from the structural run only.
pub fn summarize(issues: &[Issue], passes: usize, incomplete: usize, inapplicable: usize) -> ScanSummary {
    let mut summary = ScanSummary {
        total: issues.len(),
        passes,
        incomplete,
        inapplicable,
        ..ScanSummary::default()
    };
    for issue in issues {
        match issue.impact {
            Severity::Critical => summary.critical += 1,
            Severity::Serious => summary.serious += 1,
            Severity::Moderate => summary.moderate += 1,
            Severity::Minor => summary.minor += 1,
        }
    }
    summary
}

/// Severity gate: A fails on any critical, AA additionally on serious, AAA on moderate.
pub fn compliance(summary: &ScanSummary) -> ComplianceResult {
    let level_a = summary.critical == 0;
    let level_aa = level_a && summary.serious == 0;
    let level_aaa = level_aa && summary.moderate == 0;
    ComplianceResult {
        level_a,
        level_aa,
        level_aaa,
    }
}

/// Merge both issue sources and derive the summary and compliance flags in one go.
pub fn aggregate(structural: StructuralOutcome, semantic: Vec<Issue>) -> (Vec<Issue>, ScanSummary, ComplianceResult) {
    let StructuralOutcome {
        issues,
        passes,
        incomplete,
        inapplicable,
    } = structural;
    let issues = merge(issues, semantic);
    let summary = summarize(&issues, passes, incomplete, inapplicable);
    let compliance = compliance(&summary);
    (issues, summary, compliance)
}
