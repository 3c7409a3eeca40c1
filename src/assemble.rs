//! Per-type artifact assembly and the conversion entry point.
//!
//! Cyclic types come first and are backed by their raw schema; the rest are
//! translated structurally in dependency order.
use std::fmt;
use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

use crate::analysis::{analyze, dependency_graph, Analysis};
use crate::context::{Context, Flag, Session};
use crate::error::{Error, PathSegment, Result};
use crate::expr::Expr;
use crate::ir::Ty;
use crate::lower::lower_to_ir;
use crate::names::{derive_names, Names};
use crate::options::{OptionValue, Options, Policy};
use crate::schema::{Document, NamedType, SchemaNode, Shape};
use crate::translate::{literal, translate_named};

const RAW_SCHEMA_OBJECT: &str = "rawSchemaObject";
const VALIDATOR_OPTIONS: &str = "validatorOptions";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// Every processed name, in processing order.
    pub converted_types: Vec<String>,
    pub not_converted_types: Vec<String>,
    pub output: Output,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Output {
    pub imports: Imports,
    pub declarations: Vec<Declaration>,
}

/// Runtime helpers the declarations refer to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Imports {
    pub regular: bool,
    pub raw: bool,
    pub compile: bool,
    pub annotate: bool,
    pub type_of: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    RawSchema,
    ValidatorOptions,
    Schema,
    Type,
    Validator,
    Ensurer,
    TypeGuard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Value(Expr),
    Type(Ty),
    /// The type inferred from the named schema declaration.
    TypeOf(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    pub exported: bool,
    pub doc: Option<String>,
    pub body: Body,
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINT
// ————————————————————————————————————————————————————————————————————————————

/// Convert every named type of `doc`. Fatal diagnostics abort the whole call.
pub fn translate(doc: &Document, options: &Options) -> Result<Conversion> {
    let analysis = analyze(doc);
    let session = Session::new(options).with_source(doc.source.clone());
    let fallbacks = missing_types(doc, &analysis, &session)?;

    let cyclic: IndexSet<&str> = analysis.cyclic.iter().map(String::as_str).collect();
    let order: Vec<&str> = analysis
        .cyclic
        .iter()
        .chain(&analysis.non_cyclic)
        .map(String::as_str)
        .collect();
    tracing::debug!(types = order.len(), cyclic = cyclic.len(), "assembling declarations");

    let mut declarations = Vec::new();
    let mut imports = Imports::default();

    let raw_names: Vec<&str> = if options.forward_schema {
        order.clone()
    } else {
        cyclic.iter().copied().collect()
    };
    if !raw_names.is_empty() {
        let mut definitions = Map::new();
        for &name in &raw_names {
            definitions.insert(name.to_string(), lookup(doc, &fallbacks, name)?.raw.clone());
        }
        let doc_comment = (!cyclic.is_empty()).then(|| {
            "These cyclic types need to be treated as raw JSON Schema\n\n\
             Their validator types cannot be inferred from the schema value"
                .to_string()
        });
        declarations.push(Declaration {
            kind: DeclarationKind::RawSchema,
            name: RAW_SCHEMA_OBJECT.into(),
            exported: false,
            doc: doc_comment,
            body: Body::Value(literal(&serde_json::json!({ "definitions": definitions }))),
        });
        imports.raw = true;
    }

    if !options.validator_options.is_empty() {
        let entries = options
            .validator_options
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    OptionValue::Bool(value) => Expr::Bool { value: *value },
                    OptionValue::String(value) => Expr::string(value.as_str()),
                };
                (key.clone(), value)
            })
            .collect();
        declarations.push(Declaration {
            kind: DeclarationKind::ValidatorOptions,
            name: VALIDATOR_OPTIONS.into(),
            exported: false,
            doc: None,
            body: Body::Value(Expr::Object { entries }),
        });
    }

    let any_node = SchemaNode::default();
    let mut converted_types = Vec::with_capacity(order.len());
    for &name in &order {
        let named = lookup(doc, &fallbacks, name)?;
        let names = derive_names(name);
        let is_cyclic = cyclic.contains(name);
        let is_raw = options.forward_schema || is_cyclic;
        let ctx = Context::new(&session, name);

        let node = if named.node.shape == Shape::Never {
            ctx.handle_unsupported("Top-level type being false is unsupported")?;
            &any_node
        } else {
            &named.node
        };

        let schema = if is_raw {
            Expr::generic_call(
                "raw",
                vec![names.type_name.clone()],
                vec![Expr::ident(RAW_SCHEMA_OBJECT), Expr::string(name)],
            )
        } else {
            imports.regular = true;
            translate_named(&ctx, name, node)?
        };
        declarations.push(Declaration {
            kind: DeclarationKind::Schema,
            name: names.schema_name.clone(),
            exported: options.export_schema,
            doc: options.export_schema.then(|| format!("The validation schema for a {}", names.type_name)),
            body: Body::Value(schema),
        });

        let type_body = if options.inline_types() || is_cyclic {
            Body::Type(lower_to_ir(node, options.use_unknown))
        } else {
            imports.type_of = true;
            Body::TypeOf(names.schema_name.clone())
        };
        declarations.push(Declaration {
            kind: DeclarationKind::Type,
            name: names.type_name.clone(),
            exported: options.export_type,
            doc: None,
            body: type_body,
        });

        declarations.extend(validator_functions(options, &names));
        tracing::debug!(name = %name, raw = is_raw, "converted type");
        converted_types.push(name.to_string());
    }

    imports.compile = !order.is_empty()
        && (options.export_validator || options.export_ensurer || options.export_type_guard);
    imports.annotate = session.has(Flag::UseAnnotate);

    let not_converted_types = doc.not_converted.iter().cloned().collect::<IndexSet<_>>().into_iter().collect();
    Ok(Conversion {
        converted_types,
        not_converted_types,
        output: Output { imports, declarations },
    })
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn lookup<'d>(doc: &'d Document, fallbacks: &'d IndexMap<String, NamedType>, name: &str) -> Result<&'d NamedType> {
    doc.types
        .get(name)
        .or_else(|| fallbacks.get(name))
        .ok_or_else(|| Error::Internal(format!("emission order names unknown type {name}")))
}

/// Apply the missing-reference policy, then stand in an untyped schema for
/// every dangling target.
fn missing_types(doc: &Document, analysis: &Analysis, session: &Session) -> Result<IndexMap<String, NamedType>> {
    if analysis.missing.is_empty() {
        return Ok(IndexMap::new());
    }
    let graph = dependency_graph(doc);
    let mut fallbacks = IndexMap::with_capacity(analysis.missing.len());
    for name in &analysis.missing {
        let referrer = graph
            .iter()
            .find(|(_, refs)| refs.contains(name))
            .map(|(from, _)| from.clone())
            .unwrap_or_default();
        let path = [PathSegment::Key(referrer)];
        match session.options.missing_reference {
            Policy::Error => {
                return Err(Error::MissingReference { name: name.clone(), meta: session.meta(&path) });
            }
            Policy::Warn => session.warn(&format!("Reference to missing type: {name}, ignoring"), &path),
            Policy::Ignore => {}
        }
        let stand_in = NamedType { name: name.clone(), node: SchemaNode::default(), raw: Value::Object(Map::new()) };
        fallbacks.insert(name.clone(), stand_in);
    }
    Ok(fallbacks)
}

fn validator_functions(options: &Options, names: &Names) -> Vec<Declaration> {
    let type_name = &names.type_name;
    let schema = || Expr::ident(names.schema_name.as_str());
    let compile_options = |mut entries: Vec<(String, Expr)>| {
        if !options.validator_options.is_empty() {
            entries.push(("ajvOptions".into(), Expr::ident(VALIDATOR_OPTIONS)));
        }
        (!entries.is_empty()).then_some(Expr::Object { entries })
    };

    let mut out = Vec::new();
    if options.export_validator {
        let args = std::iter::once(schema()).chain(compile_options(vec![])).collect();
        out.push(Declaration {
            kind: DeclarationKind::Validator,
            name: names.validator_name.clone(),
            exported: true,
            doc: Some(format!("## Validate that a variable is a {type_name}\n\n@returns ValidationResult")),
            body: Body::Value(Expr::call("compile", args)),
        });
    }
    if options.export_ensurer {
        let flags = vec![("ensure".to_string(), Expr::Bool { value: true })];
        let args = std::iter::once(schema()).chain(compile_options(flags)).collect();
        out.push(Declaration {
            kind: DeclarationKind::Ensurer,
            name: names.ensurer_name.clone(),
            exported: true,
            doc: Some(format!(
                "## Validates that a variable is a {type_name} (or throws)\n\n\
                 @throws {{ValidationError}}\n@returns {type_name}"
            )),
            body: Body::Value(Expr::generic_call(
                "compile",
                vec![format!("typeof {}", names.schema_name), type_name.clone()],
                args,
            )),
        });
    }
    if options.export_type_guard {
        let flags = vec![("simple".to_string(), Expr::Bool { value: true })];
        let args = std::iter::once(schema()).chain(compile_options(flags)).collect();
        out.push(Declaration {
            kind: DeclarationKind::TypeGuard,
            name: names.type_guard_name.clone(),
            exported: true,
            doc: Some(format!("## Is a variable a {type_name}\n\n@returns boolean")),
            body: Body::Value(Expr::call("compile", args)),
        });
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// RENDERING
// ————————————————————————————————————————————————————————————————————————————

impl Conversion {
    pub fn declaration(&self, kind: DeclarationKind, name: &str) -> Option<&Declaration> {
        self.output.declarations.iter().find(|d| d.kind == kind && d.name == name)
    }
}

impl Imports {
    fn helpers(&self) -> Vec<&'static str> {
        let mut helpers = Vec::new();
        if self.regular {
            helpers.extend(["suretype", "v"]);
        }
        if self.raw {
            helpers.push("raw");
        }
        if self.compile {
            helpers.push("compile");
        }
        if self.annotate {
            helpers.push("annotate");
        }
        helpers
    }
}

impl Output {
    /// Render the import line and every declaration, blank-line separated.
    pub fn to_source(&self) -> String {
        let mut blocks = Vec::with_capacity(self.declarations.len() + 2);
        let helpers = self.imports.helpers();
        if !helpers.is_empty() {
            blocks.push(format!("import {{ {} }} from \"suretype\";", helpers.join(", ")));
        }
        if self.imports.type_of {
            blocks.push("import type { TypeOf } from \"suretype\";".to_string());
        }
        blocks.extend(self.declarations.iter().map(Declaration::to_string));
        let mut source = blocks.join("\n\n");
        source.push('\n');
        source
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(doc) = &self.doc {
            f.write_str("/**\n")?;
            for line in doc.lines() {
                if line.is_empty() {
                    f.write_str(" *\n")?;
                } else {
                    writeln!(f, " * {line}")?;
                }
            }
            f.write_str(" */\n")?;
        }
        if self.exported {
            f.write_str("export ")?;
        }
        match &self.body {
            Body::Value(expr) => write!(f, "const {} = {expr};", self.name),
            Body::Type(ty) => write!(f, "type {} = {ty};", self.name),
            Body::TypeOf(schema) => write!(f, "type {} = TypeOf<typeof {schema}>;", self.name),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::tests::collecting;
    use serde_json::json;

    fn document(definitions: Value) -> Document {
        Document::from_json_schema(&json!({ "definitions": definitions })).unwrap()
    }

    fn schema_of(conversion: &Conversion, name: &str) -> String {
        let decl = conversion
            .declaration(DeclarationKind::Schema, &format!("schema{name}"))
            .unwrap_or_else(|| panic!("no schema for {name}"));
        match &decl.body {
            Body::Value(expr) => expr.to_string(),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn union_of_reference_and_enum() {
        let doc = document(json!({
            "Foo": { "anyOf": [{ "$ref": "#/definitions/Bar" }, { "type": "string", "enum": ["foo", "baz"] }] },
            "Bar": { "type": "string", "const": "bar" }
        }));
        let conversion = translate(&doc, &Options::default()).unwrap();
        assert_eq!(conversion.converted_types, ["Bar", "Foo"]);
        assert!(conversion.not_converted_types.is_empty());
        assert_eq!(
            schema_of(&conversion, "Foo"),
            r#"suretype({ name: "Foo" }, v.anyOf([schemaBar, v.string().enum("foo", "baz")]))"#
        );
        assert_eq!(schema_of(&conversion, "Bar"), r#"suretype({ name: "Bar" }, v.string().const("bar"))"#);
        let foo_type = conversion.declaration(DeclarationKind::Type, "Foo").unwrap();
        assert_eq!(foo_type.to_string(), r#"export type Foo = Bar | "foo" | "baz";"#);
    }

    #[test]
    fn tuple_with_additional_items() {
        let doc = document(json!({
            "Pair": {
                "type": "array",
                "items": [{ "type": "string" }],
                "additionalItems": { "type": "number" },
                "minItems": 1
            }
        }));
        let conversion = translate(&doc, &Options::default()).unwrap();
        assert_eq!(
            schema_of(&conversion, "Pair"),
            r#"suretype({ name: "Pair" }, v.array([v.string()]).minItems(1).additional(v.number()))"#
        );
    }

    #[test]
    fn missing_reference_policies() {
        let definitions = json!({
            "User": { "type": "object", "properties": { "email": { "$ref": "#/definitions/Email" } } }
        });

        let mut options = Options::default();
        options.missing_reference = Policy::Error;
        let err = translate(&document(definitions.clone()), &options).unwrap_err();
        assert!(matches!(err, Error::MissingReference { ref name, .. } if name == "Email"));

        let (options, seen) = collecting();
        let conversion = translate(&document(definitions.clone()), &options).unwrap();
        let messages = seen.lock().unwrap().clone();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Email"));
        assert_eq!(conversion.converted_types, ["Email", "User"]);
        assert_eq!(schema_of(&conversion, "Email"), r#"suretype({ name: "Email" }, v.unknown())"#);

        let (mut options, seen) = collecting();
        options.missing_reference = Policy::Ignore;
        translate(&document(definitions), &options).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn cyclic_types_use_raw_schema() {
        let doc = document(json!({
            "Node": {
                "type": "object",
                "properties": { "next": { "$ref": "#/definitions/Link" } }
            },
            "Link": { "anyOf": [{ "$ref": "#/definitions/Node" }, { "type": "null" }] },
            "Label": { "type": "string" }
        }));
        let conversion = translate(&doc, &Options::default()).unwrap();
        assert_eq!(conversion.converted_types, ["Node", "Link", "Label"]);

        let raw = &conversion.output.declarations[0];
        assert_eq!(raw.kind, DeclarationKind::RawSchema);
        assert!(raw.doc.as_deref().unwrap().contains("cyclic"));
        let Body::Value(Expr::Object { entries }) = &raw.body else { panic!("expected object") };
        let Expr::Object { entries: defs } = &entries[0].1 else { panic!("expected definitions") };
        let names: Vec<_> = defs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["Node", "Link"]);

        assert_eq!(schema_of(&conversion, "Node"), r#"raw<Node>(rawSchemaObject, "Node")"#);
        assert_eq!(schema_of(&conversion, "Label"), r#"suretype({ name: "Label" }, v.string())"#);
        let link = conversion.declaration(DeclarationKind::Type, "Link").unwrap();
        assert_eq!(link.to_string(), "export type Link = Node | null;");

        let imports = conversion.output.imports;
        assert!(imports.raw && imports.regular && imports.compile);
        assert!(!imports.type_of);
    }

    #[test]
    fn forward_schema_backs_every_type() {
        let doc = document(json!({ "A": { "type": "string" }, "B": { "$ref": "#/definitions/A" } }));
        let mut options = Options::default();
        options.forward_schema = true;
        options.inline_types = false;
        let conversion = translate(&doc, &options).unwrap();
        assert_eq!(schema_of(&conversion, "B"), r#"raw<B>(rawSchemaObject, "B")"#);
        // forwarded types are always inlined
        let b = conversion.declaration(DeclarationKind::Type, "B").unwrap();
        assert_eq!(b.body, Body::Type(Ty::Ref("A".into())));
        let raw = &conversion.output.declarations[0];
        assert_eq!(raw.doc, None);
        assert!(!conversion.output.imports.regular);
    }

    #[test]
    fn artifact_toggles() {
        let doc = document(json!({ "Id": { "type": "integer" } }));
        let mut options = Options::default();
        options.export_ensurer = false;
        options.export_type_guard = false;
        options.export_schema = false;
        options.inline_types = false;
        let conversion = translate(&doc, &options).unwrap();

        let kinds: Vec<_> = conversion.output.declarations.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, [DeclarationKind::Schema, DeclarationKind::Type, DeclarationKind::Validator]);
        let schema = conversion.declaration(DeclarationKind::Schema, "schemaId").unwrap();
        assert!(!schema.exported);
        let ty = conversion.declaration(DeclarationKind::Type, "Id").unwrap();
        assert_eq!(ty.body, Body::TypeOf("schemaId".into()));
        assert!(conversion.output.imports.type_of);

        let source = conversion.output.to_source();
        assert!(source.starts_with("import { suretype, v, compile } from \"suretype\";"));
        assert!(source.contains("const schemaId = suretype({ name: \"Id\" }, v.number().integer());"));
        assert!(source.contains("export const validateId = compile(schemaId);"));
    }

    #[test]
    fn validator_options_are_shared() {
        let doc = document(json!({ "Id": { "type": "string" } }));
        let options = Options::from_json_str(r#"{ "validatorOptions": { "allErrors": true } }"#).unwrap();
        let conversion = translate(&doc, &options).unwrap();
        let source = conversion.output.to_source();
        assert!(source.contains("const validatorOptions = { allErrors: true };"));
        assert!(source.contains("export const ensureId = compile<typeof schemaId, Id>(schemaId, { ensure: true, ajvOptions: validatorOptions });"));
        assert!(source.contains("export const isId = compile(schemaId, { simple: true, ajvOptions: validatorOptions });"));
    }

    #[test]
    fn false_top_level_type_becomes_untyped() {
        let doc = document(json!({ "Nothing": false }));
        let (options, seen) = collecting();
        let conversion = translate(&doc, &options).unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), ["Top-level type being false is unsupported [Nothing]"]);
        assert_eq!(schema_of(&conversion, "Nothing"), r#"suretype({ name: "Nothing" }, v.unknown())"#);
    }

    #[test]
    fn nested_annotations_import_helper() {
        let doc = document(json!({
            "Doc": { "type": "object", "properties": { "a": { "type": "string", "title": "A" } } }
        }));
        let conversion = translate(&doc, &Options::default()).unwrap();
        assert!(conversion.output.imports.annotate);
        assert!(conversion.output.to_source().contains("annotate"));
    }
}
