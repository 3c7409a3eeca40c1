//! Schema data model and the draft-07 `definitions` reader.
//!
//! Nodes are read once per conversion call and never mutated afterwards.
//! Exactly one [`Shape`] is authoritative per node; the shared modifiers
//! (`const`, `enum`, `default`, `anyOf`, `allOf`) and annotations sit beside it.
use std::sync::Arc;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Number, Value};

use crate::error::{Error, ErrorMeta, PathSegment, Result};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Named types in document order. Names are unique.
    pub types: IndexMap<String, NamedType>,
    /// Names an upstream collaborator failed to convert.
    pub not_converted: Vec<String>,
    /// Input text, attached to diagnostics.
    pub source: Option<Arc<str>>,
}

#[derive(Debug, Clone)]
pub struct NamedType {
    pub name: String,
    pub node: SchemaNode,
    /// The definition as it appeared in the input, for raw passthrough.
    pub raw: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    pub shape: Shape,
    pub const_: Option<Value>,
    pub enum_: Option<Vec<Value>>,
    pub default: Option<Value>,
    pub any_of: Option<Vec<SchemaNode>>,
    pub all_of: Option<Vec<SchemaNode>>,
    pub annotations: Annotations,
    /// The `type` keyword as written, or as inherited from a combinator parent.
    pub declared: DeclaredType,
}

/// Decides whether a combinator branch in modifier position survives.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DeclaredType {
    #[default]
    Unset,
    Single(TypeName),
    /// A list of types, or a name outside the draft-07 set.
    Other,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Shape {
    /// No shape keyword at all (or the `true` schema).
    #[default]
    Any,
    /// The `false` schema.
    Never,
    Null,
    Boolean,
    Integer(NumberRules),
    Number(NumberRules),
    String(StringRules),
    Array(ArrayRules),
    Object(ObjectRules),
    /// Decoded reference target name.
    Ref(String),
    /// A list-valued `type`; each entry is a singleton shape.
    Multi(Vec<Shape>),
}

/// Primitive kind of a shape, used to match combinator branches to a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberRules {
    pub multiple_of: Option<Number>,
    pub minimum: Option<Number>,
    pub exclusive_minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_maximum: Option<Number>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringRules {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Items {
    #[default]
    Unspecified,
    Single(Box<SchemaNode>),
    Tuple(Vec<SchemaNode>),
}

/// `additionalItems` / `additionalProperties`.
#[derive(Debug, Clone, PartialEq)]
pub enum Additional {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayRules {
    pub items: Items,
    pub additional_items: Option<Additional>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    /// Recognized keywords without a validator counterpart.
    pub unsupported: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub node: SchemaNode,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectRules {
    pub properties: IndexMap<String, Property>,
    pub additional_properties: Option<Additional>,
    pub unsupported: Vec<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    pub title: Option<String>,
    pub description: Option<String>,
    pub examples: Vec<Value>,
    pub see: Vec<String>,
    pub comment: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaNode {
    pub fn of(shape: Shape) -> Self {
        SchemaNode { shape, ..SchemaNode::default() }
    }

    /// A modifier branch is kept when it declares no type or exactly the parent's.
    pub fn matches_parent(&self, parent: Option<TypeName>) -> bool {
        match self.declared {
            DeclaredType::Unset => true,
            DeclaredType::Single(own) => Some(own) == parent,
            DeclaredType::Other => false,
        }
    }
}

impl Shape {
    pub fn type_name(&self) -> Option<TypeName> {
        match self {
            Shape::Null => Some(TypeName::Null),
            Shape::Boolean => Some(TypeName::Boolean),
            Shape::Integer(_) => Some(TypeName::Integer),
            Shape::Number(_) => Some(TypeName::Number),
            Shape::String(_) => Some(TypeName::String),
            Shape::Array(_) => Some(TypeName::Array),
            Shape::Object(_) => Some(TypeName::Object),
            Shape::Any | Shape::Never | Shape::Ref(_) | Shape::Multi(_) => None,
        }
    }
}

impl TypeName {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "null" => TypeName::Null,
            "boolean" => TypeName::Boolean,
            "integer" => TypeName::Integer,
            "number" => TypeName::Number,
            "string" => TypeName::String,
            "array" => TypeName::Array,
            "object" => TypeName::Object,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeName::Null => "null",
            TypeName::Boolean => "boolean",
            TypeName::Integer => "integer",
            TypeName::Number => "number",
            TypeName::String => "string",
            TypeName::Array => "array",
            TypeName::Object => "object",
        }
    }
}

impl Document {
    /// Read a draft-07 document carrying its named types under `definitions`.
    pub fn from_json_schema(json: &Value) -> Result<Document> {
        let definitions = match json.get("definitions") {
            Some(Value::Object(defs)) => defs,
            _ => {
                return Err(Error::Unsupported {
                    message: "JSON Schema must contain definitions".into(),
                    meta: ErrorMeta::default(),
                });
            }
        };

        let mut types = IndexMap::with_capacity(definitions.len());
        for (name, raw) in definitions {
            let node = match raw {
                Value::Bool(_) | Value::Object(_) => read_node(raw, None),
                other => {
                    return Err(Error::Unsupported {
                        message: format!("definition must be a schema, found {other}"),
                        meta: ErrorMeta {
                            path: vec![PathSegment::Key(name.clone())],
                            ..ErrorMeta::default()
                        },
                    });
                }
            };
            types.insert(name.clone(), NamedType { name: name.clone(), node, raw: raw.clone() });
        }
        Ok(Document { types, ..Document::default() })
    }

}

/// `#/definitions/Foo` → `Foo`; anything else is returned decoded but otherwise untouched.
///
/// Percent escapes are decoded before the JSON-pointer `~1`/`~0` escapes.
pub fn decode_ref_name(reference: &str) -> String {
    let local = reference.strip_prefix("#/definitions/").unwrap_or(reference);
    percent_decode_str(local)
        .decode_utf8_lossy()
        .replace("~1", "/")
        .replace("~0", "~")
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// `inherited` is the parent's single `type`, applied to combinator branches
/// that omit their own.
fn read_node(json: &Value, inherited: Option<TypeName>) -> SchemaNode {
    let obj = match json {
        Value::Bool(true) => return SchemaNode::of(Shape::Any),
        Value::Bool(false) => return SchemaNode::of(Shape::Never),
        Value::Object(obj) => obj,
        _ => return SchemaNode::of(Shape::Any),
    };

    let declared: Vec<TypeName> = match obj.get("type") {
        Some(Value::String(name)) => TypeName::parse(name).into_iter().collect(),
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(|n| n.as_str().and_then(TypeName::parse))
            .collect(),
        _ => inherited.into_iter().collect(),
    };
    let declared_type = match (obj.get("type"), declared.as_slice()) {
        (None, []) => DeclaredType::Unset,
        (None | Some(Value::String(_)), [single]) => DeclaredType::Single(*single),
        _ => DeclaredType::Other,
    };

    let shape = if let Some(Value::String(reference)) = obj.get("$ref") {
        Shape::Ref(decode_ref_name(reference))
    } else {
        match declared.as_slice() {
            [] => Shape::Any,
            [single] => read_shape(*single, obj),
            many => Shape::Multi(many.iter().map(|t| read_shape(*t, obj)).collect()),
        }
    };

    let branch_type = match declared.as_slice() {
        [single] => Some(*single),
        _ => None,
    };
    let read_branches = |key: &str| -> Option<Vec<SchemaNode>> {
        obj.get(key)
            .and_then(Value::as_array)
            .map(|xs| xs.iter().map(|x| read_node(x, branch_type)).collect())
    };

    SchemaNode {
        shape,
        const_: obj.get("const").cloned(),
        enum_: obj.get("enum").and_then(Value::as_array).cloned(),
        default: obj.get("default").cloned(),
        any_of: read_branches("anyOf"),
        all_of: read_branches("allOf"),
        annotations: read_annotations(obj),
        declared: declared_type,
    }
}

fn read_shape(type_name: TypeName, obj: &Map<String, Value>) -> Shape {
    match type_name {
        TypeName::Null => Shape::Null,
        TypeName::Boolean => Shape::Boolean,
        TypeName::Integer => Shape::Integer(read_number_rules(obj)),
        TypeName::Number => Shape::Number(read_number_rules(obj)),
        TypeName::String => Shape::String(StringRules {
            min_length: obj.get("minLength").and_then(Value::as_u64),
            max_length: obj.get("maxLength").and_then(Value::as_u64),
            pattern: string_of(obj, "pattern"),
            format: string_of(obj, "format"),
        }),
        TypeName::Array => Shape::Array(read_array_rules(obj)),
        TypeName::Object => Shape::Object(read_object_rules(obj)),
    }
}

fn read_number_rules(obj: &Map<String, Value>) -> NumberRules {
    let number = |key: &str| match obj.get(key) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    };
    NumberRules {
        multiple_of: number("multipleOf"),
        minimum: number("minimum"),
        exclusive_minimum: number("exclusiveMinimum"),
        maximum: number("maximum"),
        exclusive_maximum: number("exclusiveMaximum"),
    }
}

fn read_array_rules(obj: &Map<String, Value>) -> ArrayRules {
    let items = match obj.get("items") {
        Some(Value::Array(xs)) => Items::Tuple(xs.iter().map(|x| read_node(x, None)).collect()),
        Some(item @ (Value::Object(_) | Value::Bool(_))) => Items::Single(Box::new(read_node(item, None))),
        _ => Items::Unspecified,
    };
    let unsupported = ["contains", "uniqueItems"]
        .into_iter()
        .filter(|k| obj.contains_key(*k))
        .collect();
    ArrayRules {
        items,
        additional_items: obj.get("additionalItems").and_then(read_additional),
        min_items: obj.get("minItems").and_then(Value::as_u64),
        max_items: obj.get("maxItems").and_then(Value::as_u64),
        unsupported,
    }
}

fn read_object_rules(obj: &Map<String, Value>) -> ObjectRules {
    let required: Vec<&str> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|xs| xs.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| {
                    let property = Property {
                        node: read_node(prop, None),
                        required: required.contains(&name.as_str()),
                    };
                    (name.clone(), property)
                })
                .collect()
        })
        .unwrap_or_default();

    let unsupported = [
        "patternProperties",
        "propertyNames",
        "minProperties",
        "maxProperties",
        "dependencies",
    ]
    .into_iter()
    .filter(|k| obj.contains_key(*k))
    .collect();

    ObjectRules {
        properties,
        additional_properties: obj.get("additionalProperties").and_then(read_additional),
        unsupported,
    }
}

fn read_additional(json: &Value) -> Option<Additional> {
    match json {
        Value::Bool(allowed) => Some(Additional::Allowed(*allowed)),
        Value::Object(_) => Some(Additional::Schema(Box::new(read_node(json, None)))),
        _ => None,
    }
}

fn read_annotations(obj: &Map<String, Value>) -> Annotations {
    let examples = match obj.get("examples") {
        Some(Value::Array(xs)) => xs.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single.clone()],
    };
    let see = match obj.get("see") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(xs)) => xs.iter().filter_map(|x| x.as_str().map(String::from)).collect(),
        _ => Vec::new(),
    };
    Annotations {
        title: string_of(obj, "title"),
        description: string_of(obj, "description"),
        examples,
        see,
        comment: string_of(obj, "$comment"),
    }
}

fn string_of(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read(json: Value) -> SchemaNode {
        read_node(&json, None)
    }

    #[test]
    fn requires_definitions() {
        let err = Document::from_json_schema(&json!({ "type": "object" })).unwrap_err();
        assert!(err.to_string().contains("must contain definitions"));
    }

    #[test]
    fn keeps_definition_order() {
        let doc = Document::from_json_schema(&json!({
            "definitions": { "Zeta": {}, "Alpha": true, "Mid": false }
        }))
        .unwrap();
        let names: Vec<_> = doc.types.keys().cloned().collect();
        assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
        assert_eq!(doc.types["Alpha"].node.shape, Shape::Any);
        assert_eq!(doc.types["Mid"].node.shape, Shape::Never);
    }

    #[test]
    fn decodes_refs() {
        assert_eq!(decode_ref_name("#/definitions/User"), "User");
        assert_eq!(decode_ref_name("#/definitions/a~1b"), "a/b");
        assert_eq!(decode_ref_name("#/definitions/My%20Type"), "My Type");
        assert_eq!(decode_ref_name("#/properties/x"), "#/properties/x");
        assert_eq!(decode_ref_name("#/definitions/a%7E1b"), "a/b");
        assert_eq!(decode_ref_name("#/definitions/caf%C3%A9"), "café");
        let node = read(json!({ "$ref": "#/definitions/User", "type": "object" }));
        assert_eq!(node.shape, Shape::Ref("User".into()));
    }

    #[test]
    fn list_type_spreads_constraints() {
        let node = read(json!({ "type": ["string", "null"], "minLength": 2 }));
        let Shape::Multi(shapes) = node.shape else { panic!("expected multi") };
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0], Shape::String(StringRules { min_length: Some(2), ..StringRules::default() }));
        assert_eq!(shapes[1], Shape::Null);
    }

    #[test]
    fn combinator_branches_inherit_parent_type() {
        let node = read(json!({
            "type": "string",
            "anyOf": [{ "format": "email" }, { "type": "number" }]
        }));
        let branches = node.any_of.unwrap();
        assert_eq!(branches[0].shape, Shape::String(StringRules {
            format: Some("email".into()),
            ..StringRules::default()
        }));
        assert_eq!(branches[1].shape.type_name(), Some(TypeName::Number));
        assert_eq!(branches[0].declared, DeclaredType::Single(TypeName::String));
    }

    #[test]
    fn declared_type_decides_branch_survival() {
        let node = read(json!({
            "type": "string",
            "anyOf": [
                { "type": ["number", "null"] },
                { "$ref": "#/definitions/Count", "type": "number" },
                { "$ref": "#/definitions/Name" },
                { "type": "string", "minLength": 1 },
                { "type": "text" }
            ]
        }));
        let parent = node.shape.type_name();
        let kept: Vec<bool> = node.any_of.unwrap().iter().map(|b| b.matches_parent(parent)).collect();
        assert_eq!(kept, [false, false, true, true, false]);
    }

    #[test]
    fn reads_objects_and_unsupported_keywords() {
        let node = read(json!({
            "type": "object",
            "properties": { "b": { "type": "string" }, "a": {} },
            "required": ["a"],
            "additionalProperties": false,
            "minProperties": 1
        }));
        let Shape::Object(rules) = node.shape else { panic!("expected object") };
        let keys: Vec<_> = rules.properties.keys().cloned().collect();
        assert_eq!(keys, ["b", "a"]);
        assert!(rules.properties["a"].required);
        assert!(!rules.properties["b"].required);
        assert_eq!(rules.additional_properties, Some(Additional::Allowed(false)));
        assert_eq!(rules.unsupported, ["minProperties"]);
    }

    #[test]
    fn reads_tuples_and_annotations() {
        let node = read(json!({
            "type": "array",
            "items": [{ "type": "string" }],
            "additionalItems": { "type": "number" },
            "uniqueItems": true,
            "title": "Pair",
            "examples": "x",
            "see": ["a", "b"],
            "$comment": "note"
        }));
        let Shape::Array(rules) = &node.shape else { panic!("expected array") };
        assert!(matches!(rules.items, Items::Tuple(ref xs) if xs.len() == 1));
        assert!(matches!(rules.additional_items, Some(Additional::Schema(_))));
        assert_eq!(rules.unsupported, ["uniqueItems"]);
        assert_eq!(node.annotations.title.as_deref(), Some("Pair"));
        assert_eq!(node.annotations.examples, vec![json!("x")]);
        assert_eq!(node.annotations.see, ["a", "b"]);
        assert_eq!(node.annotations.comment.as_deref(), Some("note"));
    }
}
