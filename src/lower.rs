use crate::analysis::is_plain_reference;
use crate::ir::{Field, Ty};
use crate::names::derive_names;
use crate::schema::{Additional, Items, SchemaNode, Shape, TypeName};

/// Lower a schema node to the structural type of the values it accepts.
///
/// `const`/`enum` narrow the node to its literal values. Combinators in
/// modifier position intersect with the base shape.
pub fn lower_to_ir(node: &SchemaNode, use_unknown: bool) -> Ty {
    let top = if use_unknown { Ty::Unknown } else { Ty::Any };
    lower_node(node, &top)
}

fn lower_node(node: &SchemaNode, top: &Ty) -> Ty {
    if let Some(value) = &node.const_ {
        return literal_ty(value);
    }
    if let Some(values) = &node.enum_ {
        return simplify_unions(values.iter().map(literal_ty).collect());
    }

    let (base, consumed_any_of, consumed_all_of) = match (&node.shape, &node.any_of, &node.all_of) {
        (Shape::Any, Some(branches), _) => (union_of(branches, top), true, false),
        (Shape::Any, None, Some(branches)) => (intersection_of(branches, top), false, true),
        (shape, _, _) => (lower_shape(shape, top), false, false),
    };

    let parent = node.shape.type_name();
    let mut arms = vec![base];
    if let (false, Some(branches)) = (consumed_any_of, &node.any_of) {
        let kept = matching(branches, parent);
        if !kept.is_empty() {
            push_distinct(&mut arms, union_of(&kept, top));
        }
    }
    if let (false, Some(branches)) = (consumed_all_of, &node.all_of) {
        for branch in matching(branches, parent) {
            push_distinct(&mut arms, lower_node(&branch, top));
        }
    }

    match arms.len() {
        1 => arms.remove(0),
        _ => Ty::AllOf(arms),
    }
}

fn lower_shape(shape: &Shape, top: &Ty) -> Ty {
    match shape {
        Shape::Any => top.clone(),
        Shape::Never => Ty::Never,
        Shape::Null => Ty::Null,
        Shape::Boolean => Ty::Bool,
        Shape::Integer(_) | Shape::Number(_) => Ty::Number,
        Shape::String(_) => Ty::String,
        Shape::Ref(name) if is_plain_reference(name) => Ty::Ref(derive_names(name).type_name),
        Shape::Ref(_) => top.clone(),
        Shape::Multi(shapes) => simplify_unions(shapes.iter().map(|s| lower_shape(s, top)).collect()),

        Shape::Array(rules) => match &rules.items {
            Items::Tuple(slots) => {
                let rest = match &rules.additional_items {
                    Some(Additional::Allowed(false)) => None,
                    Some(Additional::Schema(extra)) => Some(Box::new(lower_node(extra, top))),
                    Some(Additional::Allowed(true)) | None => Some(Box::new(top.clone())),
                };
                Ty::ArrayTuple { elems: slots.iter().map(|s| lower_node(s, top)).collect(), rest }
            }
            Items::Single(item) => Ty::ArrayList { item: Box::new(lower_node(item, top)) },
            Items::Unspecified => Ty::ArrayList { item: Box::new(top.clone()) },
        },

        Shape::Object(rules) => {
            let fields = rules
                .properties
                .iter()
                .map(|(name, prop)| Field {
                    name: name.clone(),
                    ty: lower_node(&prop.node, top),
                    required: prop.required,
                })
                .collect();
            let additional = match &rules.additional_properties {
                Some(Additional::Allowed(false)) => None,
                Some(Additional::Schema(extra)) if **extra != SchemaNode::default() => {
                    Some(Box::new(lower_node(extra, top)))
                }
                _ => Some(Box::new(top.clone())),
            };
            Ty::Object { fields, additional }
        }
    }
}

fn push_distinct(arms: &mut Vec<Ty>, ty: Ty) {
    if !arms.contains(&ty) {
        arms.push(ty);
    }
}

fn matching(branches: &[SchemaNode], parent: Option<TypeName>) -> Vec<SchemaNode> {
    branches
        .iter()
        .filter(|b| b.matches_parent(parent))
        .cloned()
        .collect()
}

fn union_of(branches: &[SchemaNode], top: &Ty) -> Ty {
    simplify_unions(branches.iter().map(|b| lower_node(b, top)).collect())
}

fn intersection_of(branches: &[SchemaNode], top: &Ty) -> Ty {
    let mut arms: Vec<Ty> = branches.iter().map(|b| lower_node(b, top)).collect();
    match arms.len() {
        0 => top.clone(),
        1 => arms.remove(0),
        _ => Ty::AllOf(arms),
    }
}

fn literal_ty(value: &serde_json::Value) -> Ty {
    match value {
        serde_json::Value::Null => Ty::Null,
        other => Ty::Literal(other.clone()),
    }
}

// Collapse common unions: X ∪ null → Nullable(X), nested unions flattened,
// duplicates dropped
fn simplify_unions(arms: Vec<Ty>) -> Ty {
    let mut had_null = false;
    let mut kept: Vec<Ty> = Vec::with_capacity(arms.len());
    for arm in arms {
        flatten_into(arm, &mut kept, &mut had_null);
    }

    let core = match kept.len() {
        0 if had_null => return Ty::Null,
        // no arm at all: nothing is accepted
        0 => return Ty::Never,
        1 => kept.remove(0),
        _ => Ty::OneOf(kept),
    };

    if had_null {
        Ty::Nullable(Box::new(core))
    } else {
        core
    }
}

fn flatten_into(arm: Ty, kept: &mut Vec<Ty>, had_null: &mut bool) {
    match arm {
        Ty::Null => *had_null = true,
        Ty::Nullable(inner) => {
            *had_null = true;
            flatten_into(*inner, kept, had_null);
        }
        Ty::OneOf(inner) => {
            for ty in inner {
                flatten_into(ty, kept, had_null);
            }
        }
        other => push_distinct(kept, other),
    }
}
