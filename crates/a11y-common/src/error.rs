/// Error types shared across the accessibility crates.
///
/// These represent failures in infrastructure that more than one crate touches
/// (the AI client and its configuration). Pipeline-specific errors live in
/// `a11y-pipeline` and never wrap AI failures: those are degraded, not raised.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    OpenAi(#[from] crate::openai::OpenAiClientError),
}
