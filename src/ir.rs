// Structural type IR for derived type declarations. No serde_json::Value here
// except for literal types.
use std::fmt;

use crate::expr::is_identifier;

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Unknown,
    Any,
    Never,                   // the `false` schema
    Null,                    // exactly null
    Bool,
    Number,                  // integer and number alike
    String,
    Literal(serde_json::Value),
    ArrayList {
        item: Box<Ty>,
    },
    ArrayTuple {
        elems: Vec<Ty>,          // positional slots
        rest: Option<Box<Ty>>,   // additional items, None when closed
    },
    Object {
        fields: Vec<Field>,      // document order
        additional: Option<Box<Ty>>,
    },
    Ref(String),             // derived type name
    OneOf(Vec<Ty>),
    AllOf(Vec<Ty>),
    Nullable(Box<Ty>),       // X ∪ null
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
    pub required: bool,
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Unknown => f.write_str("unknown"),
            Ty::Any => f.write_str("any"),
            Ty::Never => f.write_str("never"),
            Ty::Null => f.write_str("null"),
            Ty::Bool => f.write_str("boolean"),
            Ty::Number => f.write_str("number"),
            Ty::String => f.write_str("string"),
            Ty::Literal(value) => write!(f, "{value}"),
            Ty::ArrayList { item } if needs_parens(item) => write!(f, "Array<{item}>"),
            Ty::ArrayList { item } => write!(f, "{item}[]"),
            Ty::ArrayTuple { elems, rest } => {
                f.write_str("[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                if let Some(rest) = rest {
                    if !elems.is_empty() {
                        f.write_str(", ")?;
                    }
                    write!(f, "...{}", Ty::ArrayList { item: rest.clone() })?;
                }
                f.write_str("]")
            }
            Ty::Object { fields, additional } => {
                if fields.is_empty() && additional.is_none() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for field in fields {
                    if is_identifier(&field.name) {
                        f.write_str(&field.name)?;
                    } else {
                        write!(f, "{}", serde_json::Value::from(field.name.as_str()))?;
                    }
                    let optional = if field.required { "" } else { "?" };
                    write!(f, "{optional}: {}; ", field.ty)?;
                }
                if let Some(additional) = additional {
                    write!(f, "[key: string]: {additional}; ")?;
                }
                f.write_str("}")
            }
            Ty::Ref(name) => f.write_str(name),
            Ty::OneOf(arms) => write_joined(f, arms, " | "),
            Ty::AllOf(arms) => write_joined(f, arms, " & "),
            Ty::Nullable(inner) if needs_parens(inner) => write!(f, "({inner}) | null"),
            Ty::Nullable(inner) => write!(f, "{inner} | null"),
        }
    }
}

fn needs_parens(ty: &Ty) -> bool {
    matches!(ty, Ty::OneOf(_) | Ty::AllOf(_) | Ty::Nullable(_))
}

fn write_joined(f: &mut fmt::Formatter<'_>, arms: &[Ty], sep: &str) -> fmt::Result {
    for (i, arm) in arms.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        if needs_parens(arm) {
            write!(f, "({arm})")?;
        } else {
            write!(f, "{arm}")?;
        }
    }
    Ok(())
}
