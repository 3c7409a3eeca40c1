//! Validator-construction expressions and their textual form.
use std::fmt::{self, Write as _};
use serde_json::Number;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `callee<type_args>(args)`
    Call { callee: String, type_args: Vec<String>, args: Vec<Expr> },
    /// `target.method(args)`
    Chain { target: Box<Expr>, method: String, args: Vec<Expr> },
    Ident { name: String },
    Null,
    Bool { value: bool },
    Number { value: Number },
    String { value: String },
    Array { items: Vec<Expr> },
    /// Insertion order is kept.
    Object { entries: Vec<(String, Expr)> },
}

impl Expr {
    pub fn call(callee: &str, args: Vec<Expr>) -> Self {
        Expr::Call { callee: callee.to_string(), type_args: Vec::new(), args }
    }

    pub fn generic_call(callee: &str, type_args: Vec<String>, args: Vec<Expr>) -> Self {
        Expr::Call { callee: callee.to_string(), type_args, args }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident { name: name.into() }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String { value: value.into() }
    }

    /// Append `.method(args)` to `self`.
    pub fn chain(self, method: &str, args: Vec<Expr>) -> Self {
        Expr::Chain { target: Box::new(self), method: method.to_string(), args }
    }

    /// Chain only when `arg` is present.
    pub fn chain_opt(self, method: &str, arg: Option<Expr>) -> Self {
        match arg {
            Some(arg) => self.chain(method, vec![arg]),
            None => self,
        }
    }

    /// Chained method names, innermost first.
    pub fn chain_methods(&self) -> Vec<&str> {
        match self {
            Expr::Chain { target, method, .. } => {
                let mut methods = target.chain_methods();
                methods.push(method);
                methods
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Call { callee, type_args, args } => {
                f.write_str(callee)?;
                if !type_args.is_empty() {
                    write!(f, "<{}>", type_args.join(", "))?;
                }
                write_args(f, args)
            }
            Expr::Chain { target, method, args } => {
                write!(f, "{target}.{method}")?;
                write_args(f, args)
            }
            Expr::Ident { name } => f.write_str(name),
            Expr::Null => f.write_str("null"),
            Expr::Bool { value } => write!(f, "{value}"),
            Expr::Number { value } => write!(f, "{value}"),
            Expr::String { value } => write_quoted(f, value),
            Expr::Array { items } => {
                f.write_char('[')?;
                write_list(f, items)?;
                f.write_char(']')
            }
            Expr::Object { entries } if entries.is_empty() => f.write_str("{}"),
            Expr::Object { entries } => {
                f.write_str("{ ")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if is_identifier(key) {
                        f.write_str(key)?;
                    } else {
                        write_quoted(f, key)?;
                    }
                    write!(f, ": {value}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    f.write_char('(')?;
    write_list(f, args)?;
    f.write_char(')')
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    // JSON string escaping is valid in the target syntax.
    write!(f, "{}", serde_json::Value::from(text))
}

pub(crate) fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_chains_and_literals() {
        let expr = Expr::call("v.object", vec![Expr::Object {
            entries: vec![
                ("id".into(), Expr::call("v.string", vec![]).chain("required", vec![])),
                ("first-name".into(), Expr::call("v.string", vec![]).chain("enum", vec![Expr::string("a\"b")])),
            ],
        }])
        .chain("additional", vec![Expr::Bool { value: true }]);
        assert_eq!(
            expr.to_string(),
            r#"v.object({ id: v.string().required(), "first-name": v.string().enum("a\"b") }).additional(true)"#
        );
        assert_eq!(expr.chain_methods(), ["additional"]);
    }

    #[test]
    fn renders_generic_calls() {
        let expr = Expr::generic_call("raw", vec!["Tree".into()], vec![Expr::ident("rawSchemaObject"), Expr::string("Tree")]);
        assert_eq!(expr.to_string(), r#"raw<Tree>(rawSchemaObject, "Tree")"#);
    }
}
