//! Rule registry and evaluation driver.
//!
//! Rules group by family; the driver iterates families in a fixed order
//! and yields one result per rule, in registry order. A structural
//! self-check runs per family at the start — a bad rule aborts its
//! whole family but the remaining families continue. Cancellation is
//! cooperative, checked between rules.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error};

use crate::classify::Mold;
use crate::template::{validate_rule, Rule, RuleFamily};

use super::evaluator::{evaluate_rule, evaluate_sentence_multiple_rule, EvalContext};
use super::reasons::ResultItem;

/// Cooperative cancellation flag, checked by the driver between rules.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The rule library for one mold.
#[derive(Debug, Default)]
pub struct Registry {
    rules: Vec<Rule>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rules for a mold.
    pub fn for_mold(mold: Mold) -> Self {
        Self {
            rules: crate::rules::builtin_rules(mold),
        }
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Evaluate every registered rule, family by family, in registry order.
pub fn evaluate_all(
    registry: &Registry,
    ctx: &EvalContext<'_>,
    cancel: &CancelFlag,
) -> Vec<ResultItem> {
    let mut results = Vec::new();
    'families: for family in RuleFamily::ordered() {
        let family_rules: Vec<&Rule> = registry
            .rules
            .iter()
            .filter(|rule| rule.family == family)
            .collect();
        if family_rules.is_empty() {
            continue;
        }
        // structural self-check: fatal for the family only
        for rule in &family_rules {
            if let Err(err) = validate_rule(rule) {
                error!(family = ?family, %err, "rule family failed structural self-check");
                continue 'families;
            }
        }
        for rule in family_rules {
            if cancel.is_cancelled() {
                debug!("audit cancelled between rules");
                return results;
            }
            debug!(label = %rule.label, "evaluating rule");
            let result = match family {
                RuleFamily::SingleSentenceMultiple => evaluate_sentence_multiple_rule(rule, ctx),
                _ => evaluate_rule(rule, ctx),
            };
            results.push(result);
        }
    }
    results
}
