/// The rendered-page seam.
///
/// Browser automation lives outside this crate. The pipeline only needs to run
/// scripts in the page, locate elements and take clipped screenshots.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    #[error("element query failed for {selector}: {message}")]
    Query { selector: String, message: String },

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error("page is closed")]
    Closed,
}

/// Bounding box of an element, in CSS pixels relative to the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotOptions {
    pub clip: Option<ElementBox>,
    pub full_page: bool,
}

#[async_trait]
pub trait RenderedPage: Send + Sync {
    async fn current_url(&self) -> Result<String, PageError>;

    /// Evaluate `script` as a function body receiving `args`, returning its JSON result.
    async fn evaluate(&self, script: &str, args: Value) -> Result<Value, PageError>;

    async fn query_selector(&self, selector: &str) -> Result<Option<ElementBox>, PageError>;

    async fn screenshot(&self, options: ScreenshotOptions) -> Result<Vec<u8>, PageError>;
}
