use crate::context::Context;
use crate::error::Result;
use crate::expr::Expr;
use crate::schema::{Additional, ObjectRules, SchemaNode};

use super::{create_validator, Position};

/// `v.object({ ... })`. Closed is the validator default, so only an open or
/// typed `additionalProperties` adds a modifier.
pub(super) fn translate(ctx: &Context, rules: &ObjectRules) -> Result<Expr> {
    let walked = ctx.walk("properties");
    let entries = rules
        .properties
        .iter()
        .map(|(name, prop)| {
            let expr = create_validator(&walked.walk(name.as_str()), &prop.node, Position::required(prop.required))?;
            Ok((name.clone(), expr))
        })
        .collect::<Result<Vec<_>>>()?;

    for keyword in &rules.unsupported {
        ctx.handle_unsupported(format!("Property '{keyword}' is not supported"))?;
    }

    let additional = match &rules.additional_properties {
        None | Some(Additional::Allowed(true)) => Some(Expr::Bool { value: true }),
        Some(Additional::Schema(extra)) if **extra == SchemaNode::default() => Some(Expr::Bool { value: true }),
        Some(Additional::Allowed(false)) => None,
        Some(Additional::Schema(extra)) => {
            Some(create_validator(&ctx.walk("additionalProperties"), extra, Position::NESTED)?)
        }
    };
    Ok(Expr::call("v.object", vec![Expr::Object { entries }]).chain_opt("additional", additional))
}
