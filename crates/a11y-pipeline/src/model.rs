use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How badly an issue affects users. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Serious,
    Critical,
}

impl Severity {
    /// Parse a severity label as emitted by the rule engine or the AI checks.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "minor" => Some(Severity::Minor),
            "moderate" => Some(Severity::Moderate),
            "serious" => Some(Severity::Serious),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Serious => "serious",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete DOM match for an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub html: String,
    pub selector: String,
    pub failure_summary: String,
    pub impact: Severity,
}

/// A rule violation, from either the structural engine or an AI check.
///
/// Both sources produce this exact shape so reporting never needs to know
/// where an issue came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub impact: Severity,
    pub tags: BTreeSet<String>,
    pub description: String,
    pub help: String,
    pub help_url: String,
    pub occurrences: Vec<Occurrence>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
}

impl Issue {
    pub fn first_occurrence(&self) -> Option<&Occurrence> {
        self.occurrences.first()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total: usize,
    pub critical: usize,
    pub serious: usize,
    pub moderate: usize,
    pub minor: usize,
    pub passes: usize,
    pub incomplete: usize,
    pub inapplicable: usize,
}

/// Severity-gated compliance flags.
///
/// This is a heuristic over issue counts, not a WCAG conformance claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ComplianceResult {
    #[serde(rename = "levelA")]
    pub level_a: bool,
    #[serde(rename = "levelAA")]
    pub level_aa: bool,
    #[serde(rename = "levelAAA")]
    pub level_aaa: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionType {
    Fix,
    Improvement,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_impact(impact: Severity) -> Self {
        match impact {
            Severity::Critical | Severity::Serious => Priority::High,
            Severity::Moderate => Priority::Medium,
            Severity::Minor => Priority::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_example: Option<String>,
    pub priority: Priority,
}

/// An element the pipeline would like visual evidence for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotHint {
    pub selector: String,
    pub issue_id: String,
    pub severity: Severity,
}

/// Visual evidence attached after the fact by the screenshot collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotRef {
    pub issue_id: String,
    pub selector: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub issues: Vec<Issue>,
    pub summary: ScanSummary,
    pub compliance: ComplianceResult,
    pub screenshot_hints: Vec<ScreenshotHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<Vec<ScreenshotRef>>,
}

impl ScanResult {
    pub fn attach_screenshots(&mut self, screenshots: Vec<ScreenshotRef>) {
        self.screenshots = Some(screenshots);
    }
}
