//! In-crate fakes for the rendered page and the AI suggestion service.
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use a11y_common::suggestion::{AiError, SuggestionService};

use crate::page::{ElementBox, PageError, RenderedPage, ScreenshotOptions};
use crate::semantic::extract::PAGE_DATA_SCRIPT;
use crate::structural::{ENGINE_INJECT_SCRIPT, ENGINE_PROBE_SCRIPT, ENGINE_RUN_SCRIPT};

pub(crate) struct FakePage {
    url: String,
    engine_loaded: AtomicBool,
    engine_results: Result<Value, String>,
    page_data: Value,
    elements: HashMap<String, ElementBox>,
    broken_screenshots: HashSet<String>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl FakePage {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            engine_loaded: AtomicBool::new(true),
            engine_results: Ok(json!({ "violations": [], "passes": 0, "incomplete": 0, "inapplicable": 0 })),
            page_data: json!({}),
            elements: HashMap::new(),
            broken_screenshots: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn without_engine(self) -> Self {
        self.engine_loaded.store(false, Ordering::SeqCst);
        self
    }

    pub(crate) fn with_engine_results(mut self, results: Value) -> Self {
        self.engine_results = Ok(results);
        self
    }

    pub(crate) fn with_engine_failure(mut self, message: &str) -> Self {
        self.engine_results = Err(message.to_string());
        self
    }

    pub(crate) fn with_page_data(mut self, data: Value) -> Self {
        self.page_data = data;
        self
    }

    pub(crate) fn with_element(mut self, selector: &str, width: f64, height: f64) -> Self {
        self.elements.insert(
            selector.to_string(),
            ElementBox {
                x: 0.0,
                y: 0.0,
                width,
                height,
            },
        );
        self
    }

    pub(crate) fn with_broken_screenshot(mut self, selector: &str) -> Self {
        self.broken_screenshots.insert(selector.to_string());
        self
    }

    pub(crate) fn last_args_for(&self, script: &str) -> Option<Value> {
        let calls = self.calls.lock().unwrap();
        calls
            .iter()
            .rev()
            .find(|(s, _)| s == script)
            .map(|(_, args)| args.clone())
    }

    pub(crate) fn calls_to(&self, script: &str) -> usize {
        let calls = self.calls.lock().unwrap();
        calls.iter().filter(|(s, _)| s == script).count()
    }
}

#[async_trait]
impl RenderedPage for FakePage {
    async fn current_url(&self) -> Result<String, PageError> {
        Ok(self.url.clone())
    }

    async fn evaluate(&self, script: &str, args: Value) -> Result<Value, PageError> {
        self.calls
            .lock()
            .unwrap()
            .push((script.to_string(), args.clone()));

        if script == ENGINE_PROBE_SCRIPT {
            return Ok(Value::Bool(self.engine_loaded.load(Ordering::SeqCst)));
        }
        if script == ENGINE_INJECT_SCRIPT {
            let has_source = args["source"].as_str().is_some_and(|s| !s.is_empty());
            self.engine_loaded.store(has_source, Ordering::SeqCst);
            return Ok(Value::Bool(true));
        }
        if script == ENGINE_RUN_SCRIPT {
            return self
                .engine_results
                .clone()
                .map_err(PageError::Evaluation);
        }
        if script == PAGE_DATA_SCRIPT {
            return Ok(self.page_data.clone());
        }
        Err(PageError::Evaluation(format!("unexpected script: {script}")))
    }

    async fn query_selector(&self, selector: &str) -> Result<Option<ElementBox>, PageError> {
        Ok(self.elements.get(selector).copied())
    }

    async fn screenshot(&self, options: ScreenshotOptions) -> Result<Vec<u8>, PageError> {
        let Some(clip) = options.clip else {
            return Ok(vec![0u8; 16]);
        };
        let broken = self
            .elements
            .iter()
            .any(|(sel, b)| *b == clip && self.broken_screenshots.contains(sel));
        if broken {
            return Err(PageError::Screenshot("element detached".to_string()));
        }
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

/// Suggestion service that answers from a list of `(needle, reply)` pairs.
///
/// The first pair whose needle occurs in the prompt or system prompt wins.
/// Unmatched prompts get the fallback reply.
pub(crate) struct ScriptedSuggestions {
    replies: Vec<(String, Result<String, String>)>,
    fallback: Result<String, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedSuggestions {
    pub(crate) fn new() -> Self {
        Self {
            replies: Vec::new(),
            fallback: Ok("[]".to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn reply(mut self, needle: &str, text: &str) -> Self {
        self.replies.push((needle.to_string(), Ok(text.to_string())));
        self
    }

    pub(crate) fn fail(mut self, needle: &str) -> Self {
        self.replies
            .push((needle.to_string(), Err("connection reset".to_string())));
        self
    }

    pub(crate) fn otherwise(mut self, text: &str) -> Self {
        self.fallback = Ok(text.to_string());
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SuggestionService for ScriptedSuggestions {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self
            .replies
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()) || system_prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.fallback);
        reply.clone().map_err(AiError::Request)
    }
}
