/// Rule tag resolution.
///
/// Engine tags are flat labels, not a hierarchy: `wcag22aa` does not pull in
/// `wcag2a`, and in practice it also misses rules that belong to it (color
/// contrast lives under `wcag2aa`). Every tag a level implies is therefore
/// enumerated explicitly here.
use std::collections::BTreeSet;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const WCAG2A: &str = "wcag2a";
pub const WCAG2AA: &str = "wcag2aa";
pub const WCAG21AA: &str = "wcag21aa";
pub const WCAG22AA: &str = "wcag22aa";
pub const WCAG2AAA: &str = "wcag2aaa";
pub const WCAG21AAA: &str = "wcag21aaa";
pub const WCAG22AAA: &str = "wcag22aaa";
pub const BEST_PRACTICE: &str = "best-practice";
pub const SECTION_508: &str = "section508";
pub const EN_301_549: &str = "EN-301-549";

const LEVEL_A_TAGS: &[&str] = &[WCAG2A];
const LEVEL_AA_TAGS: &[&str] = &[WCAG2A, WCAG2AA, WCAG21AA, WCAG22AA];
const LEVEL_AAA_EXTRA_TAGS: &[&str] = &[WCAG2AAA, WCAG21AAA, WCAG22AAA];
const DEFAULT_EXTRA_TAGS: &[&str] = &[BEST_PRACTICE, SECTION_508, EN_301_549];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum ComplianceLevel {
    A,
    AA,
    AAA,
}

impl ComplianceLevel {
    /// The base engine tag for this level alone.
    pub fn base_tag(&self) -> &'static str {
        match self {
            ComplianceLevel::A => WCAG2A,
            ComplianceLevel::AA => WCAG2AA,
            ComplianceLevel::AAA => WCAG2AAA,
        }
    }
}

impl FromStr for ComplianceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(ComplianceLevel::A),
            "AA" => Ok(ComplianceLevel::AA),
            "AAA" => Ok(ComplianceLevel::AAA),
            other => Err(format!("unknown compliance level: {other}")),
        }
    }
}

/// Every tag required to cover `level`.
pub fn tags_for_level(level: ComplianceLevel) -> BTreeSet<String> {
    let mut tags: BTreeSet<String> = BTreeSet::new();
    match level {
        ComplianceLevel::A => extend(&mut tags, LEVEL_A_TAGS),
        ComplianceLevel::AA => extend(&mut tags, LEVEL_AA_TAGS),
        ComplianceLevel::AAA => {
            extend(&mut tags, LEVEL_AA_TAGS);
            extend(&mut tags, LEVEL_AAA_EXTRA_TAGS);
        }
    }
    tags
}

/// Resolve a requested level and/or explicit tag list into the engine tag set.
///
/// - neither given: the AA-equivalent set plus best-practice and the 508 / EN 301 549 tags
/// - level only: exactly the level's set
/// - explicit tags: those tags (plus the level's set, if any), with `wcag2aa` forced in
///   when any AA-flavoured tag is present and `wcag2aaa` forced in for AAA-flavoured ones
pub fn resolve_tags(level: Option<ComplianceLevel>, requested: &[String]) -> BTreeSet<String> {
    let requested: Vec<String> = requested
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if requested.is_empty() {
        return match level {
            Some(level) => tags_for_level(level),
            None => {
                let mut tags = tags_for_level(ComplianceLevel::AA);
                extend(&mut tags, DEFAULT_EXTRA_TAGS);
                tags
            }
        };
    }

    let mut tags = level.map(tags_for_level).unwrap_or_default();
    if requested.iter().any(|t| is_aa_flavoured(t)) {
        tags.insert(WCAG2AA.to_string());
    }
    if requested.iter().any(|t| is_aaa_flavoured(t)) {
        tags.insert(WCAG2AAA.to_string());
    }
    tags.extend(requested);
    tags
}

/// The tag an AI finding's `wcagLevel` label maps to, if it names a level.
pub fn tag_for_level_label(label: &str) -> Option<&'static str> {
    label.parse::<ComplianceLevel>().ok().map(|l| l.base_tag())
}

fn is_aa_flavoured(tag: &str) -> bool {
    let t = tag.to_ascii_lowercase();
    t.starts_with("wcag") && t.ends_with("aa")
}

fn is_aaa_flavoured(tag: &str) -> bool {
    let t = tag.to_ascii_lowercase();
    t.starts_with("wcag") && t.ends_with("aaa")
}

fn extend(tags: &mut BTreeSet<String>, extra: &[&str]) {
    tags.extend(extra.iter().map(|t| t.to_string()));
}
