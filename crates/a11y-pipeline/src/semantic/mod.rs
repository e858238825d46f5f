/// AI-driven semantic checks.
///
/// Four independent checks look at a bounded slice of page data and ask the
/// suggestion service for judgement calls the rule engine cannot make. They run
/// one after another so at most one AI request is in flight, and a check whose
/// input is empty is skipped. Nothing in here fails the scan.
pub mod extract;
pub mod parse;
pub mod prompts;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use a11y_common::suggestion::SuggestionService;

use crate::model::{Issue, Occurrence};
use crate::page::RenderedPage;
use crate::tags::BEST_PRACTICE;
use extract::{advertisement_candidates, PageData, PAGE_DATA_SCRIPT};
use parse::{findings_or_empty, AiFinding};

const WCAG_QUICKREF_URL: &str = "https://www.w3.org/WAI/WCAG22/quickref/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticCheck {
    Landmarks,
    Forms,
    Advertisements,
    Context,
}

impl SemanticCheck {
    pub fn slug(&self) -> &'static str {
        match self {
            SemanticCheck::Landmarks => "landmarks",
            SemanticCheck::Forms => "forms",
            SemanticCheck::Advertisements => "ads",
            SemanticCheck::Context => "context",
        }
    }

    fn base_prompt(&self) -> &'static str {
        match self {
            SemanticCheck::Landmarks => prompts::LANDMARK_PROMPT,
            SemanticCheck::Forms => prompts::FORM_PROMPT,
            SemanticCheck::Advertisements => prompts::ADVERTISEMENT_PROMPT,
            SemanticCheck::Context => prompts::CONTEXT_PROMPT,
        }
    }
}

pub struct SemanticRunner<'a> {
    ai: &'a dyn SuggestionService,
}

impl<'a> SemanticRunner<'a> {
    pub fn new(ai: &'a dyn SuggestionService) -> Self {
        Self { ai }
    }

    /// Extract page data and run every applicable check.
    pub async fn run(&self, page: &dyn RenderedPage, url: &str) -> Vec<Issue> {
        let data = match page.evaluate(PAGE_DATA_SCRIPT, extract::script_args()).await {
            Ok(raw) => match serde_json::from_value::<PageData>(raw) {
                Ok(data) => data,
                Err(e) => {
                    warn!(url, error = %e, "page data had an unexpected shape, skipping AI checks");
                    return Vec::new();
                }
            },
            Err(e) => {
                warn!(url, error = %e, "page data extraction failed, skipping AI checks");
                return Vec::new();
            }
        };
        self.run_on(data, url).await
    }

    /// Run every applicable check against already-extracted page data.
    pub async fn run_on(&self, data: PageData, url: &str) -> Vec<Issue> {
        let data = data.bounded();
        let mut issues = Vec::new();

        let landmarks = self
            .check(
                SemanticCheck::Landmarks,
                url,
                &[("Landmarks", to_json(&data.landmarks)), ("Headings", to_json(&data.headings))],
            )
            .await;
        issues.extend(landmarks);

        if data.forms.is_empty() {
            debug!(url, "no forms, skipping form check");
        } else {
            let forms = self
                .check(SemanticCheck::Forms, url, &[("Forms", to_json(&data.forms))])
                .await;
            issues.extend(forms);
        }

        let ads = advertisement_candidates(&data, url);
        if ads.is_empty() {
            debug!(url, "no advertisement candidates, skipping ad check");
        } else {
            let found = self
                .check(
                    SemanticCheck::Advertisements,
                    url,
                    &[("Advertisement images", to_json(&ads.images)), ("Advertisement links", to_json(&ads.links))],
                )
                .await;
            issues.extend(found);
        }

        if data.has_structure() {
            let context = self
                .check(
                    SemanticCheck::Context,
                    url,
                    &[
                        ("Landmarks", to_json(&data.landmarks)),
                        ("Headings", to_json(&data.headings)),
                        ("Forms", to_json(&data.forms)),
                    ],
                )
                .await;
            issues.extend(context);
        } else {
            debug!(url, "no landmarks, headings or forms, skipping context check");
        }

        info!(url, issues = issues.len(), "semantic checks complete");
        issues
    }

    async fn check(&self, check: SemanticCheck, url: &str, sections: &[(&str, String)]) -> Vec<Issue> {
        let system = prompts::system_prompt(check.base_prompt());
        let prompt = prompts::user_prompt(url, sections);
        let text = match self.ai.generate(&prompt, &system).await {
            Ok(text) => text,
            Err(e) => {
                warn!(check = check.slug(), error = %e, "AI check failed");
                return Vec::new();
            }
        };
        let findings = findings_or_empty(check.slug(), &text);
        debug!(check = check.slug(), findings = findings.len(), "AI check answered");
        findings.into_iter().map(|f| finding_to_issue(check, f)).collect()
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

/// Convert a validated finding into the common issue shape.
pub fn finding_to_issue(check: SemanticCheck, finding: AiFinding) -> Issue {
    let mut tags: BTreeSet<String> = BTreeSet::new();
    tags.insert(BEST_PRACTICE.to_string());
    if let Some(level) = finding.wcag_level {
        tags.insert(level.base_tag().to_string());
    }

    let help = if finding.recommendation.is_empty() {
        finding.issue.clone()
    } else {
        finding.recommendation.clone()
    };

    Issue {
        id: format!("ai-{}-{}", check.slug(), slugify(&finding.issue)),
        impact: finding.severity,
        tags,
        description: finding.description.clone(),
        help,
        help_url: WCAG_QUICKREF_URL.to_string(),
        occurrences: vec![Occurrence {
            html: finding.html,
            selector: finding.selector,
            failure_summary: format!("Fix the following: {}", finding.description),
            impact: finding.severity,
        }],
        suggestions: Vec::new(),
    }
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "finding".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;
    use crate::tags::{WCAG2A, WCAG2AA};
    use crate::testing::{FakePage, ScriptedSuggestions};
    use extract::{FormInfo, HeadingInfo, ImageInfo};
    use serde_json::json;

    const HEADING_FINDING: &str = r#"```json
[{"issue":"Heading level mismatch","severity":"moderate","selector":"h4","html":"<h4>Main Content Area</h4>","description":"The heading names the main content region but is an h4","recommendation":"Change it to an <h2> heading","wcagLevel":"A","wcagCriterion":"1.3.1"}]
```"#;

    fn lone_heading() -> PageData {
        PageData {
            headings: vec![HeadingInfo {
                level: 4,
                text: "Main Content Area".to_string(),
                selector: "h4".to_string(),
                landmark: None,
                html: "<h4>Main Content Area</h4>".to_string(),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn lone_h4_is_flagged_with_h2_recommendation() {
        let ai = ScriptedSuggestions::new().reply("landmark structure", HEADING_FINDING);
        let issues = SemanticRunner::new(&ai).run_on(lone_heading(), "https://example.test/").await;

        // landmarks + context; no forms, no ads
        assert_eq!(ai.call_count(), 2);
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.id, "ai-landmarks-heading-level-mismatch");
        assert_eq!(issue.impact, Severity::Moderate);
        assert!(issue.help.contains("h2"));
        assert!(issue.tags.contains(WCAG2A));
        assert!(issue.tags.contains(BEST_PRACTICE));
        assert_eq!(issue.occurrences[0].selector, "h4");
    }

    #[tokio::test]
    async fn empty_page_only_runs_landmark_check() {
        let ai = ScriptedSuggestions::new();
        let issues = SemanticRunner::new(&ai).run_on(PageData::default(), "https://example.test/").await;
        assert!(issues.is_empty());
        assert_eq!(ai.call_count(), 1);
    }

    #[tokio::test]
    async fn forms_enable_form_and_context_checks() {
        let ai = ScriptedSuggestions::new();
        let data = PageData {
            forms: vec![FormInfo {
                selector: "div.search".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        SemanticRunner::new(&ai).run_on(data, "https://example.test/").await;
        assert_eq!(ai.call_count(), 3);
        assert!(ai.prompts().iter().any(|p| p.contains("div.search")));
    }

    #[tokio::test]
    async fn ad_image_missing_alt_is_reported() {
        let ai = ScriptedSuggestions::new().reply(
            "advertisements",
            r#"[{"issue":"Missing alt text","severity":"serious","selector":"aside a > img","html":"<img src=\"ad-banner-sidebar.jpg\">","description":"Advertisement image has no alt attribute","recommendation":"Add alt text naming the advertiser and offer","wcagLevel":"A"}]"#,
        );
        let data = PageData {
            images: vec![ImageInfo {
                src: "ad-banner-sidebar.jpg".to_string(),
                alt: None,
                selector: "aside a > img".to_string(),
                parent_link_href: Some("https://ads.partner.test/click".to_string()),
                html: "<img src=\"ad-banner-sidebar.jpg\">".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let issues = SemanticRunner::new(&ai).run_on(data, "https://example.test/").await;

        // landmarks + ads; no structure for the context check
        assert_eq!(ai.call_count(), 2);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "ai-ads-missing-alt-text");
        assert!(matches!(issues[0].impact, Severity::Serious | Severity::Moderate));
        assert!(ai.prompts().iter().any(|p| p.contains("ad-banner-sidebar.jpg")));
    }

    #[tokio::test]
    async fn broken_responses_never_fail_the_checks() {
        let data = PageData {
            forms: vec![FormInfo::default()],
            ..lone_heading()
        };
        for reply in ["not json", "[1,2,", ""] {
            let ai = ScriptedSuggestions::new().otherwise(reply);
            let issues = SemanticRunner::new(&ai).run_on(data.clone(), "https://example.test/").await;
            assert!(issues.is_empty(), "{reply:?}");
        }
        let ai = ScriptedSuggestions::new().fail("auditor");
        let issues = SemanticRunner::new(&ai).run_on(data, "https://example.test/").await;
        assert!(issues.is_empty());
        assert_eq!(ai.call_count(), 3);
    }

    #[tokio::test]
    async fn run_extracts_page_data_through_the_page() {
        let page = FakePage::new("https://example.test/").with_page_data(json!({
            "headings": [{ "level": 4, "text": "Main Content Area", "selector": "h4", "html": "<h4>Main Content Area</h4>" }]
        }));
        let ai = ScriptedSuggestions::new().reply("cross-checking", HEADING_FINDING);
        let issues = SemanticRunner::new(&ai).run(&page, "https://example.test/").await;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "ai-context-heading-level-mismatch");
        assert_eq!(page.calls_to(PAGE_DATA_SCRIPT), 1);
    }

    #[tokio::test]
    async fn malformed_heading_levels_keep_the_checks_running() {
        let page = FakePage::new("https://example.test/").with_page_data(json!({
            "headings": [
                { "level": 4, "text": "Main Content Area", "selector": "h4" },
                { "level": null, "text": "Broken", "selector": "div[role=heading]" },
                { "level": 300, "text": "Huge", "selector": "#huge" },
                { "level": "x", "text": "Junk", "selector": "#junk" }
            ],
            "forms": [{ "selector": "form", "fields": [] }]
        }));
        let ai = ScriptedSuggestions::new();
        let issues = SemanticRunner::new(&ai).run(&page, "https://example.test/").await;

        assert!(issues.is_empty());
        // landmarks + forms + context
        assert_eq!(ai.call_count(), 3);
    }

    #[tokio::test]
    async fn unexpected_page_data_skips_checks() {
        let page = FakePage::new("https://example.test/").with_page_data(json!({ "headings": "nope" }));
        let ai = ScriptedSuggestions::new();
        let issues = SemanticRunner::new(&ai).run(&page, "https://example.test/").await;
        assert!(issues.is_empty());
        assert_eq!(ai.call_count(), 0);
    }

    #[test]
    fn level_label_maps_to_base_tag() {
        let finding = AiFinding {
            issue: "Unlabelled duplicate nav".to_string(),
            severity: Severity::Serious,
            selector: "nav:nth-of-type(2)".to_string(),
            html: "<nav>".to_string(),
            description: "Two navigation landmarks share no label".to_string(),
            recommendation: String::new(),
            wcag_level: Some(crate::tags::ComplianceLevel::AA),
            wcag_criterion: None,
        };
        let issue = finding_to_issue(SemanticCheck::Landmarks, finding);
        assert!(issue.tags.contains(WCAG2AA));
        assert!(issue.tags.contains(BEST_PRACTICE));
        assert_eq!(issue.help, "Unlabelled duplicate nav");
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("  Missing <form> wrapper!! "), "missing-form-wrapper");
        assert_eq!(slugify("???"), "finding");
    }
}
