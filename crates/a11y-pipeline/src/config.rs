use std::path::Path;
use std::time::Duration;

use crate::error::ScanError;

/// Pipeline configuration loaded explicitly from environment variables.
///
/// Every value has a default except the rule engine script, which is only
/// needed when the rendering host does not preload the engine.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Source of the rule engine, injected when the page does not already expose it.
    pub engine_script: Option<String>,
    /// Delay enforced after every AI suggestion attempt.
    pub ai_pacing: Duration,
    /// Run the four AI semantic checks.
    pub ai_checks: bool,
    /// Ask the AI service for remediation before falling back to heuristics.
    pub ai_suggestions: bool,
    /// Maximum number of screenshot hints emitted per page.
    pub screenshot_hints: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            engine_script: None,
            ai_pacing: Duration::from_millis(2_000),
            ai_checks: true,
            ai_suggestions: true,
            screenshot_hints: 5,
        }
    }
}

impl ScannerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `A11Y_ENGINE_SCRIPT_PATH`: file containing the rule engine source (must exist if set)
    /// - `A11Y_AI_PACING_MS`: pause after each AI suggestion attempt (default 2000)
    /// - `A11Y_AI_CHECKS`: `false`/`0` disables the semantic checks
    /// - `A11Y_AI_SUGGESTIONS`: `false`/`0` disables AI remediation
    /// - `A11Y_SCREENSHOT_HINTS`: hint limit (default 5)
    pub fn from_env() -> Result<Self, ScanError> {
        let defaults = Self::default();

        let engine_script = match std::env::var("A11Y_ENGINE_SCRIPT_PATH") {
            Ok(path) => Some(read_engine_script(Path::new(&path))?),
            Err(_) => None,
        };

        let ai_pacing = std::env::var("A11Y_AI_PACING_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.ai_pacing);

        let ai_checks = env_flag("A11Y_AI_CHECKS").unwrap_or(defaults.ai_checks);
        let ai_suggestions = env_flag("A11Y_AI_SUGGESTIONS").unwrap_or(defaults.ai_suggestions);

        let screenshot_hints = std::env::var("A11Y_SCREENSHOT_HINTS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.screenshot_hints);

        Ok(Self {
            engine_script,
            ai_pacing,
            ai_checks,
            ai_suggestions,
            screenshot_hints,
        })
    }
}

fn read_engine_script(path: &Path) -> Result<String, ScanError> {
    let script = std::fs::read_to_string(path).map_err(|e| {
        ScanError::Config(format!(
            "rule engine script not readable at {}: {e}",
            path.display()
        ))
    })?;
    if script.trim().is_empty() {
        return Err(ScanError::Config(format!(
            "rule engine script at {} is empty",
            path.display()
        )));
    }
    Ok(script)
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    parse_flag(&raw)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn missing_engine_script_is_a_config_error() {
        let err = read_engine_script(Path::new("/nonexistent/axe.min.js")).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
        assert!(!err.is_retryable());
    }
}
