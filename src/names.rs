//! Identifier derivation for generated declarations.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static LEADING_JUNK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^a-zA-Z_]+").unwrap());
static TRAILING_JUNK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_$]+$").unwrap());
static INNER_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_$]+(.)").unwrap());

/// Predicates that would shadow a global once prefixed with `is`.
const GLOBAL_PREDICATES: &[&str] = &["finite", "nan"];

/// The family of identifiers generated for one named type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    pub type_name: String,
    pub schema_name: String,
    pub validator_name: String,
    pub ensurer_name: String,
    pub type_guard_name: String,
}

/// Derive every generated identifier for `name`. Total and deterministic.
pub fn derive_names(name: &str) -> Names {
    let type_name = type_identifier(name);
    let guard_base = if GLOBAL_PREDICATES.contains(&type_name.to_lowercase().as_str()) {
        format!("_{type_name}")
    } else {
        type_name.clone()
    };
    Names {
        schema_name: format!("schema{type_name}"),
        validator_name: format!("validate{type_name}"),
        ensurer_name: format!("ensure{type_name}"),
        type_guard_name: format!("is{guard_base}"),
        type_name,
    }
}

fn type_identifier(name: &str) -> String {
    let trimmed = LEADING_JUNK.replace(name, "");
    let trimmed = TRAILING_JUNK.replace(&trimmed, "");
    let camel = INNER_SEPARATOR.replace_all(&trimmed, |caps: &Captures| caps[1].to_uppercase());
    capitalize(&camel)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bad_characters() {
        let names = derive_names(" 0Bad name-type €\"");
        assert_eq!(names, Names {
            type_name: "BadNameType".into(),
            schema_name: "schemaBadNameType".into(),
            validator_name: "validateBadNameType".into(),
            ensurer_name: "ensureBadNameType".into(),
            type_guard_name: "isBadNameType".into(),
        });
    }

    #[test]
    fn guards_global_predicates() {
        let names = derive_names("finite");
        assert_eq!(names.type_name, "Finite");
        assert_eq!(names.schema_name, "schemaFinite");
        assert_eq!(names.type_guard_name, "is_Finite");
        assert_eq!(derive_names("NaN").type_guard_name, "is_NaN");
        assert_eq!(derive_names("Nan").type_guard_name, "is_Nan");
    }

    #[test]
    fn keeps_underscores_and_dollars() {
        assert_eq!(derive_names("_private$id").type_name, "_private$id");
        assert_eq!(derive_names("user.profile").type_name, "UserProfile");
    }

    #[test]
    fn empty_input_is_total() {
        let names = derive_names("123 ");
        assert_eq!(names.type_name, "");
        assert_eq!(names.validator_name, "validate");
    }
}
