pub mod builders;
pub mod evaluate;
pub mod model;
pub mod translate;
pub mod validate;

pub use builders::{
    count_conditions, create_empty_guard, create_eq_condition, create_exists_condition,
    create_neq_condition, is_empty_guard, used_fact_keys, used_fact_keys_json, wrap_with_not,
};
pub use evaluate::{evaluate_expression, evaluate_guard};
pub use model::{
    FactValue, GuardExpression, GuardOperator, GuardParseError, UnsupportedFactValue,
    GUARD_OPERATORS,
};
pub use translate::{
    format_value, translate_guard, translate_guard_json, NO_RESTRICTIONS, UNKNOWN_CONDITION,
};
pub use validate::{
    validate_guard, validate_guard_json, GuardValidation, GuardValidator, DEFAULT_MAX_DEPTH,
    ROOT_PATH,
};
