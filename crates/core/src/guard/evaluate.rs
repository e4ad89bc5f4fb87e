use crate::facts::FactSnapshot;
use crate::guard::model::GuardExpression;

/// Decides a guard against live fact values. An absent guard always passes.
///
/// Empty `all` holds and empty `any` does not. Missing facts read as `null`, so
/// `{"eq": [k, null]}` holds for a fact nobody has derived yet.
pub fn evaluate_guard(guard: Option<&GuardExpression>, snapshot: &FactSnapshot) -> bool {
    guard.map(|expression| evaluate_expression(expression, snapshot)).unwrap_or(true)
}

pub fn evaluate_expression(expression: &GuardExpression, snapshot: &FactSnapshot) -> bool {
    match expression {
        GuardExpression::All(children) => {
            children.iter().all(|child| evaluate_expression(child, snapshot))
        }
        GuardExpression::Any(children) => {
            children.iter().any(|child| evaluate_expression(child, snapshot))
        }
        GuardExpression::Not(child) => !evaluate_expression(child, snapshot),
        GuardExpression::Eq(key, value) => snapshot.value_of(key) == value,
        GuardExpression::Neq(key, value) => snapshot.value_of(key) != value,
        GuardExpression::Exists(key) => !snapshot.value_of(key).is_null(),
    }
}
