/// The page scanner: tag resolution, structural run, AI checks, aggregation,
/// remediation and screenshot hints, in that order.
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use a11y_common::suggestion::{OpenAiSuggestionService, SuggestionService};

use crate::aggregate::aggregate;
use crate::config::ScannerConfig;
use crate::error::ScanError;
use crate::model::ScanResult;
use crate::page::RenderedPage;
use crate::remediation::pacer::{FixedDelayPacer, Pacer};
use crate::remediation::RemediationGenerator;
use crate::screenshots::screenshot_hints;
use crate::semantic::SemanticRunner;
use crate::structural::StructuralRunner;
use crate::tags::{resolve_tags, ComplianceLevel};

/// What to scan for. An empty request scans for AA plus best practices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanOptions {
    pub level: Option<ComplianceLevel>,
    pub tags: Vec<String>,
}

impl ScanOptions {
    pub fn level(level: ComplianceLevel) -> Self {
        Self {
            level: Some(level),
            tags: Vec::new(),
        }
    }
}

/// One scanner per session. It owns the suggestion cache, so reusing a scanner
/// across pages reuses cached fixes.
pub struct Scanner {
    config: ScannerConfig,
    ai: Arc<dyn SuggestionService>,
    remediation: RemediationGenerator,
}

impl Scanner {
    pub fn new(config: ScannerConfig, ai: Arc<dyn SuggestionService>, pacer: Arc<dyn Pacer>) -> Self {
        let remediation = RemediationGenerator::new(ai.clone(), pacer).with_ai_enabled(config.ai_suggestions);
        Self {
            config,
            ai,
            remediation,
        }
    }

    /// Scanner backed by the OpenAI-compatible service, paced by `A11Y_AI_PACING_MS`.
    pub fn from_env() -> Result<Self, ScanError> {
        let config = ScannerConfig::from_env()?;
        let ai = OpenAiSuggestionService::from_env().map_err(|e| ScanError::Config(e.to_string()))?;
        let pacer = FixedDelayPacer::new(config.ai_pacing);
        Ok(Self::new(config, Arc::new(ai), Arc::new(pacer)))
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Run the full pipeline on one page.
    ///
    /// Fails only for configuration problems, rule engine failures and page
    /// transport errors. AI trouble degrades suggestions but never the result.
    pub async fn scan_page(&mut self, page: &dyn RenderedPage, options: &ScanOptions) -> Result<ScanResult, ScanError> {
        let started = Instant::now();
        let url = page.current_url().await?;
        let tags = resolve_tags(options.level, &options.tags);
        info!(url = %url, tags = tags.len(), "scanning page");

        let structural = StructuralRunner::new(self.config.engine_script.as_deref())
            .run(page, &url, &tags)
            .await?;

        let semantic = if self.config.ai_checks {
            SemanticRunner::new(&*self.ai).run(page, &url).await
        } else {
            Vec::new()
        };

        let (mut issues, summary, compliance) = aggregate(structural, semantic);
        self.remediation.attach_all(&mut issues).await;
        let hints = screenshot_hints(&issues, self.config.screenshot_hints);

        info!(
            url = %url,
            issues = summary.total,
            critical = summary.critical,
            serious = summary.serious,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "page scan complete"
        );

        Ok(ScanResult {
            url,
            timestamp: Utc::now(),
            issues,
            summary,
            compliance,
            screenshot_hints: hints,
            screenshots: None,
        })
    }

    /// Scan pages one after another, stopping at the first page that fails.
    pub async fn scan_pages(
        &mut self,
        pages: &[&dyn RenderedPage],
        options: &ScanOptions,
    ) -> Result<Vec<ScanResult>, ScanError> {
        let mut results = Vec::with_capacity(pages.len());
        for page in pages {
            match self.scan_page(*page, options).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(error = %e, scanned = results.len(), "stopping multi-page scan");
                    return Err(e);
                }
            }
        }
        Ok(results)
    }
}
