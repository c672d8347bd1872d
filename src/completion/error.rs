use thiserror::Error;

/// Failures the completion engine can report.
///
/// Only `force_reload` surfaces these to callers; the completion path itself
/// swallows them and degrades to an empty candidate list.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[source] anyhow::Error),

    #[error("malformed input: {0}")]
    MalformedInput(String),
}
