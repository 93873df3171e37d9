/// Errors raised while resolving a source's URL
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("source '{source_id}': no value for placeholder '{{{name}}}'")]
    UnresolvedPlaceholder { source_id: String, name: String },

    #[error("source '{source_id}': unterminated placeholder in '{path}'")]
    MalformedTemplate { source_id: String, path: String },

    #[error("source '{source_id}': {field} must be non-zero")]
    ZeroDuration {
        source_id: String,
        field: &'static str,
    },

    #[error("source '{source_id}': invalid URL: {message}")]
    InvalidUrl { source_id: String, message: String },
}
