//! Schema node → validator expression.
//!
//! Every shape builds its base call, then the shared modifiers are layered
//! exactly once (required, const, enum, default, anyOf, allOf) and the
//! annotation record goes on the outermost expression.
mod annotations;
mod array;
mod literal;
mod number;
mod object;
mod string;

use crate::analysis::is_plain_reference;
use crate::context::{Context, Flag};
use crate::error::Result;
use crate::expr::Expr;
use crate::names::derive_names;
use crate::schema::{SchemaNode, Shape, TypeName};

pub use annotations::annotation_record;
pub use literal::{literal, literals};

/// Where a node sits, which decides how it is decorated.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Position<'n> {
    /// Set for the root node of a named type.
    top_level_name: Option<&'n str>,
    required: bool,
    include_annotations: bool,
}

impl Position<'_> {
    pub(crate) const NESTED: Position<'static> =
        Position { top_level_name: None, required: false, include_annotations: true };

    fn required(required: bool) -> Self {
        Position { required, ..Position::NESTED }
    }
}

/// Modifiers already consumed as the primary shape.
#[derive(Debug, Clone, Copy, Default)]
struct Consumed {
    any_of: bool,
    all_of: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

/// Translate the root node of the named type `name`. Annotations become the
/// first argument of a `suretype(...)` call.
pub fn translate_named(ctx: &Context, name: &str, node: &SchemaNode) -> Result<Expr> {
    create_validator(ctx, node, Position { top_level_name: Some(name), ..Position::NESTED })
}

/// Translate a nested node. Annotations are attached with `annotate(...)`.
pub fn translate_node(ctx: &Context, node: &SchemaNode) -> Result<Expr> {
    create_validator(ctx, node, Position::NESTED)
}

pub(crate) fn any_call(ctx: &Context) -> Expr {
    Expr::call(if ctx.use_unknown() { "v.unknown" } else { "v.any" }, vec![])
}

// ————————————————————————————————————————————————————————————————————————————
// DISPATCH
// ————————————————————————————————————————————————————————————————————————————

pub(crate) fn create_validator(ctx: &Context, node: &SchemaNode, pos: Position) -> Result<Expr> {
    let expr = match &node.shape {
        Shape::Never => {
            ctx.handle_unsupported("false is not a valid schema type")?;
            return Ok(any_call(ctx));
        }
        Shape::Ref(name) => with_required(reference(ctx, name)?, pos.required),
        Shape::Multi(shapes) => {
            let bare = Position { include_annotations: false, ..Position::NESTED };
            let branches = shapes
                .iter()
                .map(|shape| {
                    let single = SchemaNode { shape: shape.clone(), ..node.clone() };
                    create_validator(ctx, &single, bare)
                })
                .collect::<Result<Vec<_>>>()?;
            with_required(Expr::call("v.anyOf", vec![Expr::Array { items: branches }]), pos.required)
        }
        Shape::Null => {
            wrap_generics(ctx, node, pos.required, Expr::call("v.null", vec![]), Consumed::default())?
        }
        Shape::Boolean => {
            wrap_generics(ctx, node, pos.required, Expr::call("v.boolean", vec![]), Consumed::default())?
        }
        Shape::Integer(rules) => {
            let base = Expr::call("v.number", vec![]).chain("integer", vec![]);
            wrap_generics(ctx, node, pos.required, number::constrain(base, rules), Consumed::default())?
        }
        Shape::Number(rules) => {
            let base = Expr::call("v.number", vec![]);
            wrap_generics(ctx, node, pos.required, number::constrain(base, rules), Consumed::default())?
        }
        Shape::String(rules) => {
            let base = Expr::call("v.string", vec![]);
            wrap_generics(ctx, node, pos.required, string::constrain(base, rules), Consumed::default())?
        }
        Shape::Array(rules) => {
            wrap_generics(ctx, node, pos.required, array::translate(ctx, rules)?, Consumed::default())?
        }
        Shape::Object(rules) => {
            wrap_generics(ctx, node, pos.required, object::translate(ctx, rules)?, Consumed::default())?
        }
        Shape::Any => match (&node.any_of, &node.all_of) {
            (Some(branches), _) => {
                let union = composition(ctx, "v.anyOf", "anyOf", branches)?;
                wrap_generics(ctx, node, pos.required, union, Consumed { any_of: true, all_of: false })?
            }
            (None, Some(branches)) => {
                let intersection = composition(ctx, "v.allOf", "allOf", branches)?;
                wrap_generics(ctx, node, pos.required, intersection, Consumed { any_of: false, all_of: true })?
            }
            (None, None) => wrap_generics(ctx, node, pos.required, any_call(ctx), Consumed::default())?,
        },
    };

    Ok(decorate(ctx, node, pos, expr))
}

fn with_required(expr: Expr, required: bool) -> Expr {
    if required { expr.chain("required", vec![]) } else { expr }
}

fn decorate(ctx: &Context, node: &SchemaNode, pos: Position, expr: Expr) -> Expr {
    if !pos.include_annotations {
        return expr;
    }
    let Some(record) = annotation_record(&node.annotations, node.default.as_ref(), pos.top_level_name) else {
        return expr;
    };
    if pos.top_level_name.is_some() {
        Expr::call("suretype", vec![record, expr])
    } else {
        ctx.set(Flag::UseAnnotate);
        Expr::call("annotate", vec![record, expr])
    }
}

fn reference(ctx: &Context, name: &str) -> Result<Expr> {
    if name == ctx.top_level() {
        return Ok(Expr::call("v.recursive", vec![]));
    }
    if !is_plain_reference(name) {
        ctx.handle_unsupported(format!("Unsupported reference type: {name}"))?;
        return Ok(any_call(ctx));
    }
    Ok(Expr::ident(derive_names(name).schema_name))
}

/// Primary `anyOf`/`allOf`: every branch, as written.
fn composition(ctx: &Context, callee: &str, key: &str, branches: &[SchemaNode]) -> Result<Expr> {
    let walked = ctx.walk(key);
    let items = branches
        .iter()
        .enumerate()
        .map(|(i, branch)| create_validator(&walked.walk(i), branch, Position::NESTED))
        .collect::<Result<Vec<_>>>()?;
    Ok(Expr::call(callee, vec![Expr::Array { items }]))
}

/// Modifier `anyOf`/`allOf`: branches typed differently from the parent are dropped.
fn filtered_branches(ctx: &Context, branches: &[SchemaNode], parent: Option<TypeName>) -> Result<Expr> {
    let items = branches
        .iter()
        .filter(|branch| branch.matches_parent(parent))
        .enumerate()
        .map(|(i, branch)| create_validator(&ctx.walk(i), branch, Position::NESTED))
        .collect::<Result<Vec<_>>>()?;
    Ok(Expr::Array { items })
}

fn wrap_generics(
    ctx: &Context,
    node: &SchemaNode,
    required: bool,
    mut expr: Expr,
    consumed: Consumed,
) -> Result<Expr> {
    expr = with_required(expr, required);
    expr = expr.chain_opt("const", node.const_.as_ref().map(literal));
    if let Some(values) = &node.enum_ {
        expr = expr.chain("enum", literals(values));
    }
    expr = expr.chain_opt("default", node.default.as_ref().map(literal));

    let parent = node.shape.type_name();
    if let (false, Some(branches)) = (consumed.any_of, &node.any_of) {
        expr = expr.chain("anyOf", vec![filtered_branches(&ctx.walk("anyOf"), branches, parent)?]);
    }
    if let (false, Some(branches)) = (consumed.all_of, &node.all_of) {
        expr = expr.chain("allOf", vec![filtered_branches(&ctx.walk("allOf"), branches, parent)?]);
    }
    Ok(expr)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
