use serde_json::Value;

use crate::expr::Expr;

/// A JSON value as a literal expression. Object keys keep their insertion order.
///
/// `serde_json::Value` has no kind outside the JSON data model, so this is total.
pub fn literal(value: &Value) -> Expr {
    match value {
        Value::Null => Expr::Null,
        Value::Bool(value) => Expr::Bool { value: *value },
        Value::Number(value) => Expr::Number { value: value.clone() },
        Value::String(value) => Expr::string(value.as_str()),
        Value::Array(items) => Expr::Array { items: literals(items) },
        Value::Object(map) => Expr::Object {
            entries: map.iter().map(|(k, v)| (k.clone(), literal(v))).collect(),
        },
    }
}

pub fn literals(values: &[Value]) -> Vec<Expr> {
    values.iter().map(literal).collect()
}
