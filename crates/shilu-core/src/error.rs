/// Error types for the classification core.
///
/// Absence of data (no text, no keyword hits, unknown filter nodes) is never an
/// error here; it surfaces as empty results. Only structural faults, such as a
/// classification key of the wrong shape, and export I/O failures are reported.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("malformed category key '{key}': expected 3 '{delimiter}'-separated parts, got {parts}")]
    MalformedCategoryKey {
        key: String,
        delimiter: char,
        parts: usize,
    },

    #[error("malformed filter key '{key}': at most 3 '/'-separated parts allowed")]
    MalformedFilter { key: String },

    #[error("export to {path} failed: {source}")]
    Export {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("category '{category}' has no keyword-file key: names must not contain '-'")]
    UnrepresentableKeywordKey { category: String },
}
