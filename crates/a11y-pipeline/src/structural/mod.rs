/// Structural rule evaluation through the in-page rule engine.
///
/// The engine itself is external: this module makes sure it is loaded, runs it
/// restricted to the resolved tags (plus a fixed set of force-enabled rules) and
/// normalises its output into `Issue`s. Any engine failure fails the page.
pub mod failure_summary;

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::ScanError;
use crate::model::{Issue, Occurrence, Severity};
use crate::page::RenderedPage;

pub const ENGINE_PROBE_SCRIPT: &str =
    "return typeof window.axe === 'object' && typeof window.axe.run === 'function';";

pub const ENGINE_INJECT_SCRIPT: &str = "const el = document.createElement('script'); \
el.textContent = args.source; \
(document.head || document.documentElement).appendChild(el); \
return true;";

pub const ENGINE_RUN_SCRIPT: &str = "return window.axe.run(document, { \
runOnly: { type: 'tag', values: args.tags }, \
rules: args.rules, \
resultTypes: ['violations', 'passes', 'incomplete', 'inapplicable'] \
}).then(r => ({ \
violations: r.violations, \
passes: r.passes.length, \
incomplete: r.incomplete.length, \
inapplicable: r.inapplicable.length \
}));";

/// Rules the default engine configuration leaves off but that catch high-value
/// problems. Enabled regardless of the selected tags.
pub const SUPPLEMENTARY_RULES: &[&str] = &[
    "landmark-one-main",
    "landmark-unique",
    "landmark-no-duplicate-banner",
    "landmark-no-duplicate-contentinfo",
    "landmark-no-duplicate-main",
    "landmark-banner-is-top-level",
    "landmark-contentinfo-is-top-level",
    "landmark-main-is-top-level",
    "landmark-complementary-is-top-level",
    "region",
    "heading-order",
    "page-has-heading-one",
    "empty-heading",
    "p-as-heading",
    "target-size",
    "aria-allowed-role",
    "aria-dialog-name",
    "aria-text",
    "aria-treeitem-name",
    "presentation-role-conflict",
    "scrollable-region-focusable",
    "nested-interactive",
    "table-duplicate-name",
    "td-has-header",
    "th-has-data-cells",
    "scope-attr-valid",
    "empty-table-header",
    "list",
    "listitem",
    "definition-list",
    "dlitem",
    "identical-links-same-purpose",
    "label-title-only",
    "skip-link",
    "tabindex",
    "meta-viewport-large",
    "image-redundant-alt",
    "color-contrast-enhanced",
];

/// Normalised output of one structural run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralOutcome {
    pub issues: Vec<Issue>,
    pub passes: usize,
    pub incomplete: usize,
    pub inapplicable: usize,
}

#[derive(Debug, Deserialize)]
struct RawEngineResults {
    #[serde(default)]
    violations: Vec<RawViolation>,
    #[serde(default)]
    passes: usize,
    #[serde(default)]
    incomplete: usize,
    #[serde(default)]
    inapplicable: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawViolation {
    id: String,
    impact: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    help: String,
    #[serde(default)]
    help_url: String,
    #[serde(default)]
    nodes: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    #[serde(default)]
    html: String,
    #[serde(default)]
    target: Vec<Value>,
    failure_summary: Option<String>,
    impact: Option<String>,
}

pub struct StructuralRunner<'a> {
    engine_script: Option<&'a str>,
}

impl<'a> StructuralRunner<'a> {
    pub fn new(engine_script: Option<&'a str>) -> Self {
        Self { engine_script }
    }

    /// Run the rule engine on `page` restricted to `tags`.
    pub async fn run(
        &self,
        page: &dyn RenderedPage,
        url: &str,
        tags: &BTreeSet<String>,
    ) -> Result<StructuralOutcome, ScanError> {
        self.ensure_engine(page).await?;

        let rules: HashMap<&str, Value> = SUPPLEMENTARY_RULES
            .iter()
            .map(|id| (*id, json!({ "enabled": true })))
            .collect();
        let args = json!({ "tags": tags, "rules": rules });

        let started = Instant::now();
        let raw = page
            .evaluate(ENGINE_RUN_SCRIPT, args)
            .await
            .map_err(|e| ScanError::Engine {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let results: RawEngineResults =
            serde_json::from_value(raw).map_err(|e| ScanError::Engine {
                url: url.to_string(),
                message: format!("unexpected engine output: {e}"),
            })?;

        let outcome = normalize(results);
        info!(
            url,
            violations = outcome.issues.len(),
            passes = outcome.passes,
            incomplete = outcome.incomplete,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "structural run complete"
        );
        Ok(outcome)
    }

    async fn ensure_engine(&self, page: &dyn RenderedPage) -> Result<(), ScanError> {
        if engine_present(page).await? {
            return Ok(());
        }
        let Some(source) = self.engine_script else {
            return Err(ScanError::Config(
                "rule engine is not loaded in the page and no engine script is configured".to_string(),
            ));
        };
        debug!(bytes = source.len(), "injecting rule engine");
        page.evaluate(ENGINE_INJECT_SCRIPT, json!({ "source": source }))
            .await?;
        if engine_present(page).await? {
            return Ok(());
        }
        Err(ScanError::Config(
            "rule engine is unavailable after injection".to_string(),
        ))
    }
}

async fn engine_present(page: &dyn RenderedPage) -> Result<bool, ScanError> {
    let probe = page.evaluate(ENGINE_PROBE_SCRIPT, Value::Null).await?;
    Ok(probe.as_bool().unwrap_or(false))
}

fn normalize(results: RawEngineResults) -> StructuralOutcome {
    let issues = results.violations.into_iter().map(to_issue).collect();
    StructuralOutcome {
        issues,
        passes: results.passes,
        incomplete: results.incomplete,
        inapplicable: results.inapplicable,
    }
}

fn to_issue(v: RawViolation) -> Issue {
    let impact = v
        .impact
        .as_deref()
        .and_then(Severity::from_label)
        .unwrap_or_else(|| {
            warn!(rule_id = %v.id, "violation without a recognised impact, treating as moderate");
            Severity::Moderate
        });

    let occurrences = v
        .nodes
        .into_iter()
        .map(|node| {
            let failure_summary = match node.failure_summary {
                Some(s) if !s.trim().is_empty() => s,
                _ => failure_summary::synthesize(&v.id, &node.html),
            };
            Occurrence {
                selector: selector_from_target(&node.target),
                impact: node
                    .impact
                    .as_deref()
                    .and_then(Severity::from_label)
                    .unwrap_or(impact),
                html: node.html,
                failure_summary,
            }
        })
        .collect();

    Issue {
        id: v.id,
        impact,
        tags: v.tags.into_iter().collect(),
        description: v.description,
        help: v.help,
        help_url: v.help_url,
        occurrences,
        suggestions: Vec::new(),
    }
}

/// Engine targets are a list of selectors, with nested lists for shadow roots.
fn selector_from_target(target: &[Value]) -> String {
    let parts: Vec<String> = target
        .iter()
        .filter_map(|part| match part {
            Value::String(s) => Some(s.clone()),
            Value::Array(inner) => Some(
                inner
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(" >>> "),
            ),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();
    parts.join(" ")
}
