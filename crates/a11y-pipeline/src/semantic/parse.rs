/// Defensive parsing of AI check responses.
///
/// A response is trusted only as a whole: the first well-formed JSON array is
/// located, and every element must validate as a finding. Anything else yields
/// an error that callers turn into "no findings".
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::model::Severity;
use crate::tags::ComplianceLevel;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*```[A-Za-z]*\s*$").expect("valid regex"));

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("response was empty")]
    Empty,

    #[error("response contained no well-formed JSON array")]
    NoArray,

    #[error("finding {index} is invalid: {reason}")]
    Invalid { index: usize, reason: String },
}

/// One validated AI finding.
#[derive(Debug, Clone, PartialEq)]
pub struct AiFinding {
    pub issue: String,
    pub severity: Severity,
    pub selector: String,
    pub html: String,
    pub description: String,
    pub recommendation: String,
    pub wcag_level: Option<ComplianceLevel>,
    pub wcag_criterion: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFinding {
    issue: String,
    severity: String,
    #[serde(default)]
    selector: String,
    #[serde(default)]
    html: String,
    description: String,
    #[serde(default)]
    recommendation: String,
    #[serde(default)]
    wcag_level: Option<String>,
    #[serde(default)]
    wcag_criterion: Option<String>,
}

pub fn parse_findings(text: &str) -> Result<Vec<AiFinding>, ParseError> {
    let cleaned = FENCE_RE.replace_all(text, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(ParseError::Empty);
    }

    let items = first_json_array(cleaned).ok_or(ParseError::NoArray)?;
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| validate(index, item))
        .collect()
}

/// Parse a check response, logging and swallowing any failure.
pub fn findings_or_empty(check: &str, text: &str) -> Vec<AiFinding> {
    match parse_findings(text) {
        Ok(findings) => findings,
        Err(e) => {
            warn!(check, error = %e, "discarding unusable AI check response");
            Vec::new()
        }
    }
}

fn first_json_array(text: &str) -> Option<Vec<Value>> {
    text.char_indices()
        .filter(|(_, c)| *c == '[')
        .find_map(|(start, _)| {
            let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
            match stream.next() {
                Some(Ok(Value::Array(items))) => Some(items),
                _ => None,
            }
        })
}

fn validate(index: usize, item: Value) -> Result<AiFinding, ParseError> {
    let invalid = |reason: String| ParseError::Invalid { index, reason };

    let raw: RawFinding = serde_json::from_value(item).map_err(|e| invalid(e.to_string()))?;

    let issue = raw.issue.trim().to_string();
    if issue.is_empty() {
        return Err(invalid("empty issue".to_string()));
    }
    let description = raw.description.trim().to_string();
    if description.is_empty() {
        return Err(invalid("empty description".to_string()));
    }
    let severity = Severity::from_label(&raw.severity)
        .ok_or_else(|| invalid(format!("unknown severity {:?}", raw.severity)))?;
    let wcag_level = match raw.wcag_level.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(label) => Some(
            label
                .parse::<ComplianceLevel>()
                .map_err(|_| invalid(format!("unknown wcagLevel {label:?}")))?,
        ),
    };

    Ok(AiFinding {
        issue,
        severity,
        selector: raw.selector.trim().to_string(),
        html: raw.html,
        description,
        recommendation: raw.recommendation.trim().to_string(),
        wcag_level,
        wcag_criterion: raw.wcag_criterion.filter(|c| !c.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"[{"issue":"Heading level mismatch","severity":"moderate","selector":"h4","html":"<h4>Main Content Area</h4>","description":"Looks like a main section title","recommendation":"Use <h2>","wcagLevel":"A","wcagCriterion":"1.3.1"}]"#;

    #[test]
    fn parses_plain_array() {
        let findings = parse_findings(VALID).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Moderate);
        assert_eq!(findings[0].wcag_level, Some(ComplianceLevel::A));
        assert_eq!(findings[0].wcag_criterion.as_deref(), Some("1.3.1"));
    }

    #[test]
    fn strips_fences_and_surrounding_prose() {
        let text = format!("Here is what I found:\n```json\n{VALID}\n```\nLet me know!");
        assert_eq!(parse_findings(&text).unwrap().len(), 1);
    }

    #[test]
    fn skips_brackets_that_are_not_arrays() {
        let text = format!("Notes [see below\n{VALID}");
        assert_eq!(parse_findings(&text).unwrap().len(), 1);
    }

    #[test]
    fn empty_array_is_no_findings() {
        assert!(parse_findings("[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_responses_yield_nothing() {
        for text in ["not json", "[1,2,", "", "   ", "{\"issue\":\"x\"}", "[1,2]"] {
            assert!(parse_findings(text).is_err(), "{text:?} should not parse");
            assert!(findings_or_empty("landmarks", text).is_empty());
        }
    }

    #[test]
    fn one_bad_element_rejects_the_array() {
        let text = r#"[
            {"issue":"ok","severity":"minor","description":"fine"},
            {"issue":"bad","severity":"apocalyptic","description":"nope"}
        ]"#;
        match parse_findings(text) {
            Err(ParseError::Invalid { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected invalid element, got {other:?}"),
        }
    }

    #[test]
    fn unknown_level_is_rejected_but_missing_level_is_fine() {
        let missing = r#"[{"issue":"x","severity":"serious","description":"d"}]"#;
        assert_eq!(parse_findings(missing).unwrap()[0].wcag_level, None);
        let bad = r#"[{"issue":"x","severity":"serious","description":"d","wcagLevel":"AAAA"}]"#;
        assert!(parse_findings(bad).is_err());
    }
}
