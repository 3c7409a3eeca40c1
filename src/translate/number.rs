use serde_json::Number;

use crate::expr::Expr;
use crate::schema::NumberRules;

/// Chain numeric constraints. The schema's `minimum`/`maximum` land on `gte`/`lt`,
/// the exclusive variants on `gt`/`lte`.
pub(super) fn constrain(expr: Expr, rules: &NumberRules) -> Expr {
    let num = |n: &Option<Number>| n.clone().map(|value| Expr::Number { value });
    expr.chain_opt("multipleOf", num(&rules.multiple_of))
        .chain_opt("gte", num(&rules.minimum))
        .chain_opt("gt", num(&rules.exclusive_minimum))
        .chain_opt("lt", num(&rules.maximum))
        .chain_opt("lte", num(&rules.exclusive_maximum))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_keep_operator_mapping() {
        let rules = NumberRules {
            minimum: Some(5.into()),
            maximum: Some(10.into()),
            ..NumberRules::default()
        };
        let expr = constrain(Expr::call("v.number", vec![]), &rules);
        assert_eq!(expr.chain_methods(), ["gte", "lt"]);
        assert_eq!(expr.to_string(), "v.number().gte(5).lt(10)");
    }

    #[test]
    fn no_rules_no_chain() {
        let expr = constrain(Expr::call("v.number", vec![]), &NumberRules::default());
        assert!(expr.chain_methods().is_empty());
    }
}
