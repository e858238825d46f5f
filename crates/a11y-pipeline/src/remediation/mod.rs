/// Remediation suggestions, one per issue.
///
/// Resolution order: cached AI reply, fresh AI reply, rule strategy, generic
/// fallback. Every AI attempt is followed by a pacer pause, whether it worked
/// or not.
pub mod cache;
pub mod pacer;
pub mod strategies;
pub mod text;

use std::sync::Arc;

use tracing::{debug, warn};

use a11y_common::suggestion::SuggestionService;

use crate::model::{Issue, Priority, Severity, Suggestion, SuggestionType};
use cache::SuggestionCache;
use pacer::Pacer;
use strategies::{FixContext, StrategyRegistry};
use text::split_code_example;

const SUGGESTION_SYSTEM_PROMPT: &str = "You are a web accessibility engineer. Given one failing element \
and the rule it violates, explain the fix in two or three sentences and give the corrected markup in a single \
fenced code block (```html, or ```css when the fix is a style change). Do not restate the rule documentation.";

/// Replies containing any of these are refusals, not fixes.
const REFUSAL_PHRASES: &[&str] = &[
    "i cannot help",
    "i can't help",
    "i can not help",
    "i'm unable to",
    "i am unable to",
    "i'm not able to",
    "cannot assist",
    "can't assist",
    "unable to provide",
    "as an ai",
];

fn is_refusal(text: &str) -> bool {
    let lower = text.to_lowercase();
    REFUSAL_PHRASES.iter().any(|p| lower.contains(p))
}

pub struct RemediationGenerator {
    ai: Arc<dyn SuggestionService>,
    pacer: Arc<dyn Pacer>,
    cache: SuggestionCache,
    strategies: StrategyRegistry,
    ai_enabled: bool,
}

impl RemediationGenerator {
    pub fn new(ai: Arc<dyn SuggestionService>, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            ai,
            pacer,
            cache: SuggestionCache::new(),
            strategies: StrategyRegistry::standard(),
            ai_enabled: true,
        }
    }

    /// Skip the AI step entirely; cache, strategies and fallback still apply.
    pub fn with_ai_enabled(mut self, enabled: bool) -> Self {
        self.ai_enabled = enabled;
        self
    }

    pub fn with_strategies(mut self, strategies: StrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn cache(&self) -> &SuggestionCache {
        &self.cache
    }

    /// Replace each issue's suggestions with exactly one fresh suggestion.
    pub async fn attach_all(&mut self, issues: &mut [Issue]) {
        for issue in issues.iter_mut() {
            let suggestion = self.suggest(issue).await;
            issue.suggestions = vec![suggestion];
        }
    }

    pub async fn suggest(&mut self, issue: &Issue) -> Suggestion {
        let occurrence = issue.first_occurrence();
        let html = occurrence.map_or("", |o| o.html.as_str());
        let impact = occurrence.map_or(issue.impact, |o| o.impact);
        let priority = Priority::from_impact(impact);

        if let Some(raw) = self.cache.get(&issue.id, html) {
            debug!(rule_id = %issue.id, "suggestion cache hit");
            return from_text(raw, priority);
        }

        if let Some(occurrence) = occurrence.filter(|_| self.ai_enabled) {
            let prompt = suggestion_prompt(&issue.id, &occurrence.html, &occurrence.failure_summary, &occurrence.selector);
            let reply = self.ai.generate(&prompt, SUGGESTION_SYSTEM_PROMPT).await;
            self.pacer.pause().await;

            match reply {
                Ok(text) if text.trim().is_empty() => {
                    warn!(rule_id = %issue.id, "AI suggestion was empty, using heuristics");
                }
                Ok(text) if is_refusal(&text) => {
                    warn!(rule_id = %issue.id, "AI declined to suggest a fix, using heuristics");
                }
                Ok(text) => {
                    let suggestion = from_text(&text, priority);
                    self.cache.insert(&issue.id, html, text);
                    return suggestion;
                }
                Err(e) => {
                    warn!(rule_id = %issue.id, error = %e, "AI suggestion failed, using heuristics");
                }
            }
        }

        let ctx = FixContext {
            rule_id: &issue.id,
            html,
            selector: occurrence.map_or("", |o| o.selector.as_str()),
            failure_summary: occurrence.map_or("", |o| o.failure_summary.as_str()),
            impact,
        };
        if let Some(markdown) = self.strategies.suggest(&ctx) {
            return from_text(&markdown, priority);
        }

        fallback(issue, impact)
    }
}

fn suggestion_prompt(rule_id: &str, html: &str, failure_summary: &str, selector: &str) -> String {
    format!(
        "Rule: {rule_id}\nSelector: {selector}\nFailure: {failure_summary}\n\nOffending HTML:\n```html\n{html}\n```\n\n\
Suggest a fix for this accessibility issue."
    )
}

fn from_text(text: &str, priority: Priority) -> Suggestion {
    let split = split_code_example(text);
    let description = if split.description.is_empty() {
        "Apply the change shown in the code example.".to_string()
    } else {
        split.description
    };
    Suggestion {
        kind: SuggestionType::Fix,
        description,
        code_example: split.code_example,
        priority,
    }
}

fn fallback(issue: &Issue, impact: Severity) -> Suggestion {
    let description = issue
        .first_occurrence()
        .map(|o| o.failure_summary.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Fix the {} issue", issue.id));
    Suggestion {
        kind: SuggestionType::Warning,
        description,
        code_example: None,
        priority: Priority::from_impact(impact),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::model::Occurrence;
    use crate::remediation::pacer::NoopPacer;
    use crate::testing::ScriptedSuggestions;

    #[derive(Default)]
    struct CountingPacer(AtomicUsize);

    #[async_trait]
    impl Pacer for CountingPacer {
        async fn pause(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn issue(id: &str, html: &str, impact: Severity) -> Issue {
        Issue {
            id: id.to_string(),
            impact,
            tags: BTreeSet::new(),
            description: String::new(),
            help: String::new(),
            help_url: String::new(),
            occurrences: vec![Occurrence {
                html: html.to_string(),
                selector: "main img".to_string(),
                failure_summary: "Fix any of the following: Element does not have an alt attribute".to_string(),
                impact,
            }],
            suggestions: Vec::new(),
        }
    }

    fn generator(ai: &Arc<ScriptedSuggestions>, pacer: Arc<dyn Pacer>) -> RemediationGenerator {
        let ai: Arc<dyn SuggestionService> = ai.clone();
        RemediationGenerator::new(ai, pacer)
    }

    const AI_FIX: &str = "### Fix\nDescribe the photo.\n\n```html\n<img src=\"team-photo.jpg\" alt=\"Our team at the 2024 offsite\">\n```";

    #[tokio::test]
    async fn ai_reply_is_split_and_cached() {
        let ai = Arc::new(ScriptedSuggestions::new().otherwise(AI_FIX));
        let mut remedy = generator(&ai, Arc::new(NoopPacer));
        let img = issue("image-alt", "<img src=\"team-photo.jpg\">", Severity::Critical);

        let first = remedy.suggest(&img).await;
        let second = remedy.suggest(&img).await;

        assert_eq!(ai.call_count(), 1);
        assert_eq!(first, second);
        assert_eq!(first.kind, SuggestionType::Fix);
        assert_eq!(first.priority, Priority::High);
        assert_eq!(first.description, "Fix\nDescribe the photo.");
        assert!(first.code_example.unwrap().contains("Our team"));
        assert_eq!(remedy.cache().len(), 1);
        assert!(ai.prompts()[0].contains("Rule: image-alt"));
    }

    #[tokio::test]
    async fn refusal_falls_back_to_the_rule_strategy() {
        let ai = Arc::new(ScriptedSuggestions::new().otherwise("I'm unable to help with that request."));
        let pacer = Arc::new(CountingPacer::default());
        let mut remedy = generator(&ai, pacer.clone());

        let s = remedy.suggest(&issue("image-alt", "<img src=\"team-photo.jpg\">", Severity::Serious)).await;

        assert!(!s.description.to_lowercase().contains("unable"));
        assert!(s.description.contains("alternative text"));
        assert_eq!(s.code_example.as_deref(), Some("<img alt=\"Team\" src=\"team-photo.jpg\">"));
        assert!(remedy.cache().is_empty());
        assert_eq!(pacer.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_call_still_paces_and_suggests() {
        let ai = Arc::new(ScriptedSuggestions::new().fail("Rule:"));
        let pacer = Arc::new(CountingPacer::default());
        let mut remedy = generator(&ai, pacer.clone());

        let s = remedy.suggest(&issue("heading-order", "<h4>Main Content Area</h4>", Severity::Moderate)).await;

        assert_eq!(pacer.0.load(Ordering::SeqCst), 1);
        assert_eq!(s.kind, SuggestionType::Fix);
        assert_eq!(s.priority, Priority::Medium);
        assert_eq!(s.code_example.as_deref(), Some("<h2>Main Content Area</h2>"));
    }

    #[tokio::test]
    async fn generic_fallback_when_nothing_applies() {
        let ai = Arc::new(ScriptedSuggestions::new().fail("Rule:"));
        let mut remedy = generator(&ai, Arc::new(NoopPacer));

        // Heading level already fits, so the strategy has nothing to say.
        let s = remedy.suggest(&issue("heading-order", "<h2>Our Services</h2>", Severity::Minor)).await;
        assert_eq!(s.kind, SuggestionType::Warning);
        assert_eq!(s.priority, Priority::Low);
        assert!(s.description.contains("alt attribute"));

        let mut bare = issue("region", "", Severity::Moderate);
        bare.occurrences.clear();
        let s = remedy.suggest(&bare).await;
        assert_eq!(s.description, "Fix the region issue");
        assert_eq!(ai.call_count(), 1);
    }

    #[tokio::test]
    async fn attach_all_leaves_exactly_one_suggestion() {
        let ai = Arc::new(
            ScriptedSuggestions::new()
                .reply("Rule: label", "I cannot help with this.")
                .fail("Rule: link-name")
                .otherwise(AI_FIX),
        );
        let mut remedy = generator(&ai, Arc::new(NoopPacer));
        let mut stale = issue("image-alt", "<img src=\"a.png\">", Severity::Critical);
        stale.suggestions = vec![
            from_text("old one", Priority::Low),
            from_text("old two", Priority::Low),
        ];
        let mut empty = issue("ai-context-misplaced-search", "", Severity::Minor);
        empty.occurrences.clear();
        let mut issues = vec![
            stale,
            issue("label", "<input name=\"q\">", Severity::Serious),
            issue("link-name", "<a href=\"/about\"></a>", Severity::Serious),
            empty,
        ];

        remedy.attach_all(&mut issues).await;

        for i in &issues {
            assert_eq!(i.suggestions.len(), 1, "{} should have one suggestion", i.id);
        }
        assert!(issues[0].suggestions[0].description.contains("Describe the photo"));
        assert!(issues[1].suggestions[0].code_example.as_deref().unwrap().contains("<label for=\"q\">"));
        assert!(issues[2].suggestions[0].code_example.as_deref().unwrap().contains("aria-label=\"About\""));
        assert_eq!(issues[3].suggestions[0].kind, SuggestionType::Warning);
    }

    #[tokio::test]
    async fn disabled_ai_is_never_called() {
        let ai = Arc::new(ScriptedSuggestions::new().otherwise(AI_FIX));
        let mut remedy = generator(&ai, Arc::new(NoopPacer)).with_ai_enabled(false);
        let s = remedy.suggest(&issue("image-alt", "<img src=\"team-photo.jpg\">", Severity::Critical)).await;
        assert_eq!(ai.call_count(), 0);
        assert!(s.description.contains("alternative text"));
    }

    #[test]
    fn refusals_are_case_insensitive() {
        assert!(is_refusal("Sorry, I CANNOT HELP with that"));
        assert!(!is_refusal("Add an alt attribute."));
    }
}
