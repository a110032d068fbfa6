//! Rule evaluation: reasons, the per-rule evaluator, the registry and
//! driver, and suggestion rendering.

pub mod evaluator;
pub mod reasons;
pub mod registry;
pub mod suggestion;

pub use evaluator::{
    evaluate_rule, evaluate_sentence_multiple_rule, EvalContext, DIFFERENCE_THRESHOLD,
    MIN_RATIO_THRESHOLD, THRESHOLD,
};
pub use reasons::{Reason, ResultItem, TemplateRef};
pub use registry::{evaluate_all, CancelFlag, Registry};
pub use suggestion::render_suggestion_by_reasons;
