//! Conversion settings. Every field has a default so a partial JSON file is a valid config.
use std::fmt;
use std::sync::Arc;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{ErrorMeta, Result};

/// Diagnostic sink: message plus the location it refers to.
pub type WarnFn = Arc<dyn Fn(&str, &ErrorMeta) + Send + Sync>;

/// What to do on an unsupported construct or a dangling reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    Ignore,
    #[default]
    Warn,
    Error,
}

/// A flag forwarded verbatim to every compiled validator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    String(String),
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// `unknown` rather than `any` for untyped nodes.
    pub use_unknown: bool,
    /// Back every type with its raw schema, not only the cyclic ones.
    pub forward_schema: bool,
    /// Structural type declarations instead of `TypeOf<typeof schema>`.
    /// Ignored (always on) when `forward_schema` is set.
    pub inline_types: bool,
    pub export_type: bool,
    pub export_schema: bool,
    pub export_validator: bool,
    pub export_ensurer: bool,
    pub export_type_guard: bool,
    pub unsupported: Policy,
    pub missing_reference: Policy,
    /// Reported in diagnostics.
    pub source_filename: Option<String>,
    pub validator_options: IndexMap<String, OptionValue>,
    #[serde(skip)]
    pub warn: Option<WarnFn>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            use_unknown: true,
            forward_schema: false,
            inline_types: true,
            export_type: true,
            export_schema: true,
            export_validator: true,
            export_ensurer: true,
            export_type_guard: true,
            unsupported: Policy::Warn,
            missing_reference: Policy::Warn,
            source_filename: None,
            validator_options: IndexMap::new(),
            warn: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("use_unknown", &self.use_unknown)
            .field("forward_schema", &self.forward_schema)
            .field("inline_types", &self.inline_types)
            .field("export_type", &self.export_type)
            .field("export_schema", &self.export_schema)
            .field("export_validator", &self.export_validator)
            .field("export_ensurer", &self.export_ensurer)
            .field("export_type_guard", &self.export_type_guard)
            .field("unsupported", &self.unsupported)
            .field("missing_reference", &self.missing_reference)
            .field("source_filename", &self.source_filename)
            .field("validator_options", &self.validator_options)
            .field("warn", &self.warn.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Options {
    pub fn from_json_str(src: &str) -> Result<Self> {
        crate::path_de::from_str_with_path(src)
    }

    pub fn with_warn(mut self, warn: impl Fn(&str, &ErrorMeta) + Send + Sync + 'static) -> Self {
        self.warn = Some(Arc::new(warn));
        self
    }

    pub fn inline_types(&self) -> bool {
        self.forward_schema || self.inline_types
    }

    pub(crate) fn emit_warning(&self, message: &str, meta: &ErrorMeta) {
        match &self.warn {
            Some(warn) => warn(message, meta),
            None => default_warn(message, meta),
        }
    }
}

fn default_warn(message: &str, meta: &ErrorMeta) {
    match &meta.filename {
        Some(file) => tracing::warn!(file = %file, "{message} at {}", meta.display_path()),
        None => tracing::warn!("{message} at {}", meta.display_path()),
    }
}
