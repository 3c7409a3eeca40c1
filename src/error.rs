//! Error kinds raised by a conversion call.
use std::fmt;
use std::sync::Arc;

/// One step from the document root to the node a diagnostic refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self { PathSegment::Key(key.to_string()) }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self { PathSegment::Key(key) }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self { PathSegment::Index(index) }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Location info attached to errors and warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMeta {
    pub path: Vec<PathSegment>,
    pub filename: Option<String>,
    /// Full text of the input document, when the loader kept it.
    pub source: Option<Arc<str>>,
}

impl ErrorMeta {
    pub fn display_path(&self) -> String {
        let steps = self.path.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        format!("[{}]", steps.join(", "))
    }
}

impl fmt::Display for ErrorMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(filename) = &self.filename {
            write!(f, "{filename} ")?;
        }
        write!(f, "at {}", self.display_path())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A recognized schema feature with no validator counterpart.
    #[error("{message} ({meta})")]
    Unsupported { message: String, meta: ErrorMeta },

    /// A `$ref` whose target is not defined in the document.
    #[error("reference to missing type: {name} ({meta})")]
    MissingReference { name: String, meta: ErrorMeta },

    /// Upstream contract violation; never a user-facing condition.
    #[error("internal error: {0}")]
    Internal(String),

    /// The input could not be deserialized.
    #[error("at JSON path {path} → {message}")]
    Load { path: String, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_renders_path_steps() {
        let meta = ErrorMeta {
            path: vec!["User".into(), "properties".into(), "tags".into(), 2usize.into()],
            filename: Some("user.json".into()),
            source: None,
        };
        assert_eq!(meta.to_string(), "user.json at [User, properties, tags, 2]");
    }

    #[test]
    fn missing_reference_names_the_type() {
        let err = Error::MissingReference { name: "Email".into(), meta: ErrorMeta::default() };
        assert!(err.to_string().contains("Email"));
    }
}
