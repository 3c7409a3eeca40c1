use crate::context::Context;
use crate::error::Result;
use crate::expr::Expr;
use crate::schema::{Additional, ArrayRules, Items};

use super::{create_validator, Position};

/// `v.array(item)` for lists, `v.array([a, b])` for tuples.
pub(super) fn translate(ctx: &Context, rules: &ArrayRules) -> Result<Expr> {
    let (args, is_tuple) = match &rules.items {
        Items::Tuple(items) => {
            let walked = ctx.walk("items");
            let items = items
                .iter()
                .enumerate()
                .map(|(i, item)| create_validator(&walked.walk(i), item, Position::NESTED))
                .collect::<Result<Vec<_>>>()?;
            (vec![Expr::Array { items }], true)
        }
        Items::Single(item) => (vec![create_validator(&ctx.walk("items"), item, Position::NESTED)?], false),
        Items::Unspecified => (Vec::new(), false),
    };

    if !is_tuple && !matches!(rules.additional_items, None | Some(Additional::Allowed(true))) {
        ctx.warn("Arrays with non-array items shouldn't set the 'additionalItems' property. Ignoring value.");
    }
    for keyword in &rules.unsupported {
        ctx.handle_unsupported(format!("Property '{keyword}' is not supported"))?;
    }

    let count = |n: Option<u64>| n.map(|n| Expr::Number { value: n.into() });
    let mut expr = Expr::call("v.array", args)
        .chain_opt("minItems", count(rules.min_items))
        .chain_opt("maxItems", count(rules.max_items));

    if is_tuple {
        match &rules.additional_items {
            None | Some(Additional::Allowed(true)) => {}
            Some(Additional::Allowed(false)) => {
                expr = expr.chain("additional", vec![Expr::Bool { value: false }]);
            }
            Some(Additional::Schema(extra)) => {
                let extra = create_validator(&ctx.walk("additionalItems"), extra, Position::NESTED)?;
                expr = expr.chain("additional", vec![extra]);
            }
        }
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use crate::options::{Options, Policy};
    use crate::translate::tests::{collecting, render, render_with};
    use serde_json::json;

    #[test]
    fn homogeneous_list() {
        let expr = render(json!({ "type": "array", "items": { "type": "boolean" }, "minItems": 2, "maxItems": 5 }));
        assert_eq!(expr, "v.array(v.boolean()).minItems(2).maxItems(5)");
        assert_eq!(render(json!({ "type": "array" })), "v.array()");
    }

    #[test]
    fn tuple_with_additional_items() {
        let expr = render(json!({
            "type": "array",
            "items": [{ "type": "string" }],
            "additionalItems": { "type": "number" },
            "minItems": 1
        }));
        assert_eq!(expr, "v.array([v.string()]).minItems(1).additional(v.number())");

        let closed = render(json!({ "type": "array", "items": [{ "type": "null" }], "additionalItems": false }));
        assert_eq!(closed, "v.array([v.null()]).additional(false)");

        let open = render(json!({ "type": "array", "items": [{ "type": "null" }], "additionalItems": true }));
        assert_eq!(open, "v.array([v.null()])");
    }

    #[test]
    fn additional_items_on_list_is_ignored_with_warning() {
        let (options, seen) = collecting();
        let expr = render_with(&options, json!({
            "type": "array",
            "items": { "type": "string" },
            "additionalItems": false
        }))
        .unwrap();
        assert_eq!(expr, "v.array(v.string())");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("additionalItems"));
    }

    #[test]
    fn unsupported_keywords_follow_policy() {
        let (options, seen) = collecting();
        let expr = render_with(&options, json!({ "type": "array", "contains": {}, "uniqueItems": true })).unwrap();
        assert_eq!(expr, "v.array()");
        assert_eq!(seen.lock().unwrap().len(), 2);

        let strict = Options { unsupported: Policy::Error, ..Options::default() };
        assert!(render_with(&strict, json!({ "type": "array", "uniqueItems": true })).is_err());
    }
}
