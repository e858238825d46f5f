use crate::page::PageError;

/// Failures that abort a page scan.
///
/// AI failures are deliberately absent: they only reduce the richness of
/// remediation guidance and are resolved to fallbacks where they happen.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("config error: {0}")]
    Config(String),

    #[error("rule engine failed on {url}: {message}")]
    Engine { url: String, message: String },

    #[error(transparent)]
    Page(#[from] PageError),
}

impl ScanError {
    /// Whether re-running the same scan could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScanError::Config(_) => false,
            ScanError::Engine { .. } | ScanError::Page(_) => true,
        }
    }
}
