/// Visual evidence hints for the screenshot collaborator.
///
/// The pipeline only names the elements it wants pictures of. Capturing is
/// offered as a helper, but uploading and attaching refs happens elsewhere.
use tracing::{debug, warn};

use crate::model::{Issue, ScreenshotHint};
use crate::page::{RenderedPage, ScreenshotOptions};

pub const DEFAULT_HINT_LIMIT: usize = 5;

/// One hint per issue, first occurrence only, for at most `limit` issues.
pub fn screenshot_hints(issues: &[Issue], limit: usize) -> Vec<ScreenshotHint> {
    issues
        .iter()
        .filter_map(|issue| {
            let occurrence = issue.first_occurrence()?;
            let selector = occurrence.selector.trim();
            if selector.is_empty() {
                return None;
            }
            Some(ScreenshotHint {
                selector: selector.to_string(),
                issue_id: issue.id.clone(),
                severity: occurrence.impact,
            })
        })
        .take(limit)
        .collect()
}

#[derive(Debug, Clone)]
pub struct CapturedScreenshot {
    pub hint: ScreenshotHint,
    pub png: Vec<u8>,
}

/// Capture a clipped screenshot for each hint.
///
/// Missing elements and per-element failures are logged and skipped.
pub async fn capture_hints(page: &dyn RenderedPage, hints: &[ScreenshotHint]) -> Vec<CapturedScreenshot> {
    let mut captured = Vec::with_capacity(hints.len());
    for hint in hints {
        let element = match page.query_selector(&hint.selector).await {
            Ok(Some(element)) if element.width > 0.0 && element.height > 0.0 => element,
            Ok(_) => {
                debug!(selector = %hint.selector, "element missing or not visible, no screenshot");
                continue;
            }
            Err(e) => {
                warn!(selector = %hint.selector, error = %e, "element query failed, skipping screenshot");
                continue;
            }
        };
        let options = ScreenshotOptions {
            clip: Some(element),
            full_page: false,
        };
        match page.screenshot(options).await {
            Ok(png) => captured.push(CapturedScreenshot {
                hint: hint.clone(),
                png,
            }),
            Err(e) => warn!(selector = %hint.selector, error = %e, "screenshot failed, skipping"),
        }
    }
    captured
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::model::{Occurrence, Severity};
    use crate::testing::FakePage;

    fn issue(id: &str, selector: &str) -> Issue {
        Issue {
            id: id.to_string(),
            impact: Severity::Serious,
            tags: BTreeSet::new(),
            description: String::new(),
            help: String::new(),
            help_url: String::new(),
            occurrences: vec![Occurrence {
                html: "<div></div>".to_string(),
                selector: selector.to_string(),
                failure_summary: String::new(),
                impact: Severity::Critical,
            }],
            suggestions: Vec::new(),
        }
    }

    #[test]
    fn hints_are_capped_and_use_occurrence_impact() {
        let issues: Vec<Issue> = (0..8).map(|i| issue(&format!("rule-{i}"), &format!("#el{i}"))).collect();
        let hints = screenshot_hints(&issues, DEFAULT_HINT_LIMIT);
        assert_eq!(hints.len(), 5);
        assert_eq!(hints[0].selector, "#el0");
        assert_eq!(hints[4].issue_id, "rule-4");
        assert_eq!(hints[0].severity, Severity::Critical);
    }

    #[test]
    fn issues_without_selectors_are_skipped() {
        let mut bare = issue("ai-forms-fake-button", "");
        bare.occurrences[0].selector.clear();
        let mut none = issue("region", "#x");
        none.occurrences.clear();
        let hints = screenshot_hints(&[bare, none, issue("label", "#q")], 5);
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].issue_id, "label");
    }

    #[tokio::test]
    async fn capture_skips_missing_and_broken_elements() {
        let page = FakePage::new("https://example.test/")
            .with_element("#ok", 120.0, 40.0)
            .with_element("#hidden", 0.0, 0.0)
            .with_element("#broken", 10.0, 11.0)
            .with_broken_screenshot("#broken");
        let hints = screenshot_hints(
            &[issue("a", "#ok"), issue("b", "#missing"), issue("c", "#hidden"), issue("d", "#broken")],
            5,
        );

        let shots = capture_hints(&page, &hints).await;

        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].hint.selector, "#ok");
        assert!(!shots[0].png.is_empty());
    }
}
