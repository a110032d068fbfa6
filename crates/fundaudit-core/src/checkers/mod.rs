//! Bespoke schema checkers: per-label checks that go beyond the
//! template DSL. They reuse the core primitives (conditions, similarity,
//! numeric parsing) and emit the same result records as template rules.

pub mod catalog;
pub mod meeting;
pub mod naming;
pub mod proportion;
pub mod raising;

use crate::classify::Mold;
use crate::evaluate::{EvalContext, ResultItem};
use crate::template::RuleType;

/// Scaffold a schema-checker result; checkers start compliant and flip
/// on failure.
pub(crate) fn base_result(
    ctx: &EvalContext<'_>,
    label: &str,
    name: &str,
    related_name: &str,
    schema_fields: &[&str],
    origin: &[&str],
    from: &[&str],
) -> ResultItem {
    let from_quoted: Vec<String> = from
        .iter()
        .map(|item| {
            if item.starts_with('《') && item.ends_with('》') {
                (*item).to_string()
            } else {
                format!("《{item}》")
            }
        })
        .collect();
    ResultItem {
        label: label.to_string(),
        name: name.to_string(),
        related_name: related_name.to_string(),
        rule_type: RuleType::Schema,
        is_compliance: true,
        reasons: Vec::new(),
        suggestion: String::new(),
        fid: ctx.fid.clone(),
        schema_id: None,
        schema_results: ctx.answers.build_schema_results(schema_fields.iter().copied()),
        origin_contents: [from_quoted.join("\n"), origin.join("\n")],
        contract_content: String::new(),
        tip: None,
    }
}

/// Run every schema checker registered for the document's mold, in a
/// fixed order.
pub fn run_schema_checkers(ctx: &EvalContext<'_>) -> Vec<ResultItem> {
    match ctx.mold {
        Mold::AssetManagement => vec![
            naming::check_plan_name_consistency(ctx),
            naming::check_manager_name_consistency(ctx),
            naming::check_trustee_name_consistency(ctx),
            proportion::check_investment_proportion(ctx),
            naming::check_naming_notations(ctx),
            catalog::check_catalog_accuracy(ctx),
            raising::check_raising_period(ctx),
            raising::check_subscribe_amount(ctx),
            raising::check_open_day(ctx),
            meeting::check_non_trading(ctx),
            meeting::check_meeting_matters(ctx),
            meeting::check_registry_responsibility(ctx),
        ],
        Mold::PublicFund => vec![
            naming::check_fund_name_consistency(ctx),
            naming::check_fund_manager_consistency(ctx),
            naming::check_fund_trustee_consistency(ctx),
            catalog::check_catalog_accuracy(ctx),
        ],
        Mold::PublicCustody => Vec::new(),
    }
}
