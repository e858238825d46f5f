use tracing_subscriber::EnvFilter;

/// Install the stderr `tracing` subscriber used by applications embedding the pipeline.
///
/// Stdout is left alone so hosts can stream scan results on it. Safe to call more
/// than once; later calls are no-ops and return `false`.
pub fn init_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .is_ok()
}
