use crate::expr::Expr;
use crate::schema::StringRules;

pub(super) fn constrain(expr: Expr, rules: &StringRules) -> Expr {
    let len = |n: Option<u64>| n.map(|n| Expr::Number { value: n.into() });
    expr.chain_opt("minLength", len(rules.min_length))
        .chain_opt("maxLength", len(rules.max_length))
        .chain_opt("pattern", rules.pattern.as_deref().map(Expr::string))
        .chain_opt("format", rules.format.as_deref().map(Expr::string))
}
