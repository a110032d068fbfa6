//! Built-in rule library, grouped by mold. Labels (`template_NNN`,
//! `schema_NNN`) are the stable external identifiers.

mod asset_management;
mod custody;
mod public_fund;

use crate::classify::Mold;
use crate::template::Rule;

/// The built-in rules for one mold, in registry order.
pub fn builtin_rules(mold: Mold) -> Vec<Rule> {
    match mold {
        Mold::PublicFund => public_fund::rules(),
        Mold::PublicCustody => custody::rules(),
        Mold::AssetManagement => asset_management::rules(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::validate_rule;

    #[test]
    fn all_builtin_rules_pass_the_structural_self_check() {
        for mold in [Mold::PublicFund, Mold::PublicCustody, Mold::AssetManagement] {
            for rule in builtin_rules(mold) {
                validate_rule(&rule).unwrap_or_else(|err| {
                    panic!("rule {} failed self-check: {err}", rule.label)
                });
            }
        }
    }

    #[test]
    fn labels_are_unique_per_mold() {
        for mold in [Mold::PublicFund, Mold::PublicCustody, Mold::AssetManagement] {
            let mut labels: Vec<String> = builtin_rules(mold)
                .into_iter()
                .map(|rule| rule.label)
                .collect();
            let count = labels.len();
            labels.sort();
            labels.dedup();
            assert_eq!(labels.len(), count, "duplicate label in {mold:?}");
        }
    }
}
