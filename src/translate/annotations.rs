use serde_json::Value;

use crate::expr::Expr;
use crate::schema::Annotations;

/// The annotation record attached to a validator, or `None` when there is
/// nothing to say. A bare `$comment` still yields an (empty) record.
pub fn annotation_record(
    annotations: &Annotations,
    default: Option<&Value>,
    top_level_name: Option<&str>,
) -> Option<Expr> {
    let mut descriptions = Vec::new();
    if let Some(description) = &annotations.description {
        descriptions.push(description.clone());
    }
    if !annotations.see.is_empty() {
        descriptions.push(format_see(&annotations.see));
    }
    if let Some(default) = default.filter(|d| !d.is_null()) {
        descriptions.push(format!("@default {default}"));
    }

    let mut entries = Vec::new();
    if let Some(name) = top_level_name {
        entries.push(("name".to_string(), Expr::string(name)));
    }
    if let Some(title) = &annotations.title {
        entries.push(("title".to_string(), Expr::string(title.as_str())));
    }
    if !annotations.examples.is_empty() {
        entries.push(("examples".to_string(), Expr::Array { items: super::literals(&annotations.examples) }));
    }
    if !descriptions.is_empty() {
        entries.push(("description".to_string(), Expr::string(descriptions.join("\n\n"))));
    }

    if entries.is_empty() && annotations.comment.is_none() {
        return None;
    }
    Some(Expr::Object { entries })
}

fn format_see(see: &[String]) -> String {
    see.iter().map(|s| format!("@see {s}")).collect::<Vec<_>>().join("\n")
}
