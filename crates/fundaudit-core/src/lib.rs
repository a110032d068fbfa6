//! # fundaudit-core
//!
//! Deterministic rule and template evaluation engine for Chinese
//! public-fund legal documents (fund contracts, custody agreements,
//! asset-management plan contracts).
//!
//! Given a parsed document bundle — hierarchical chapters, ordered
//! paragraphs with positional metadata, and pre-extracted answer fields
//! — the engine audits it against a library of regulatory rules and
//! produces, for each rule, a compliance verdict with evidence: a
//! matched template span, a conflict diff against a reference template,
//! a missing-chapter explanation, or an ignored marker when the rule's
//! preconditions fail.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: the same bundle always produces the same report
//! 2. **Pure compute**: no I/O beyond loading the bundle, no network
//! 3. **Total**: malformed values surface as reasons, never panics
//! 4. **Traceable**: every verdict cites pages, outlines and diffs
//!
//! ## Example
//!
//! ```rust,ignore
//! use fundaudit_core::{audit, DocumentBundle};
//!
//! let bundle = DocumentBundle::from_yaml_file("contract.yaml")?;
//! let report = audit(&bundle);
//! for result in &report.results {
//!     println!("{} compliant={}", result.label, result.is_compliance);
//! }
//! ```

pub mod chapters;
pub mod checkers;
pub mod classify;
pub mod condition;
pub mod document;
pub mod evaluate;
pub mod numeric;
pub mod pattern;
pub mod rules;
pub mod similarity;
pub mod template;
pub mod text;

use chrono::{DateTime, Utc};
use serde::Serialize;

// Re-export main types at crate root
pub use classify::{resolve_classification, Classification, ClassifyName, Mold, Tag};
pub use document::{AnswerManager, DocumentBundle, DocumentError, Reader};
pub use evaluate::{CancelFlag, EvalContext, Reason, Registry, ResultItem};
pub use pattern::{PatternCollection, PatternError};
pub use similarity::{ParagraphSimilarity, SimilarityOptions};
pub use template::{Rule, Template, TemplateError, TemplateItem};

/// The audit product for one document: results in registry order,
/// template rules first, schema checkers after.
#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub fid: String,
    pub mold: Mold,
    pub evaluated_at: DateTime<Utc>,
    pub results: Vec<ResultItem>,
}

impl AuditReport {
    pub fn compliant_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_compliance).count()
    }
}

/// Audit a document bundle against the built-in rule library for its
/// mold.
///
/// Classification is computed once and shared; rules are independent
/// and evaluated in registry order.
pub fn audit(bundle: &DocumentBundle) -> AuditReport {
    audit_with_cancel(bundle, &CancelFlag::new())
}

/// Audit with a cooperative cancellation flag, checked between rules.
pub fn audit_with_cancel(bundle: &DocumentBundle, cancel: &CancelFlag) -> AuditReport {
    let reader = Reader::new(bundle);
    let answers = AnswerManager::new(bundle);
    let classification = resolve_classification(&reader, &answers, bundle.mold);
    let ctx = EvalContext {
        reader: &reader,
        answers: &answers,
        classification: &classification,
        mold: bundle.mold,
        fid: bundle.fid.clone(),
    };

    let registry = Registry::for_mold(bundle.mold);
    let mut results = evaluate::evaluate_all(&registry, &ctx, cancel);
    if !cancel.is_cancelled() {
        results.extend(checkers::run_schema_checkers(&ctx));
    }
    AuditReport {
        fid: bundle.fid.clone(),
        mold: bundle.mold,
        evaluated_at: Utc::now(),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset_plan_yaml() -> &'static str {
        r#"
fid: "plan-001"
mold: asset_management
paragraphs:
  - index: 0
    page: 1
    text: "华富证券1号集合资产管理计划资产管理合同"
  - index: 1
    page: 2
    text: "第五部分 资产管理计划的募集"
  - index: 2
    page: 2
    text: "管理人可以自行销售本计划，也可以委托具有公募基金销售资格的机构销售或者推介本计划。"
chapters:
  - element_index: 1
    title: "第五部分 资产管理计划的募集"
    range: [1, 3]
answers:
  计划名称:
    value: "华富证券1号集合资产管理计划"
  计划管理人-名称:
    value: "华富证券有限责任公司"
  计划的类别、类型:
    value: "固定收益类"
  计划投资范围:
    value: "债券、银行存款"
  募集方式:
    value: "自行销售或委托机构销售"
  募集期限:
    value: "自计划份额发售之日起不超过三十天"
  资产管理计划的最低认购金额和支付方式:
    value: "募集期间的认购金额应不低于30万元"
  开放日:
    value: "每3个月至多开放1次"
  非交易过户认定及处理方式:
    value: "继承、捐赠及司法强制执行情形下可办理非交易过户"
"#
    }

    #[test]
    fn end_to_end_asset_plan_audit() {
        let bundle = DocumentBundle::from_yaml(asset_plan_yaml()).unwrap();
        let report = audit(&bundle);
        assert_eq!(report.fid, "plan-001");
        assert!(!report.results.is_empty());

        // the raise-mode template matches the document verbatim
        let raise = report
            .results
            .iter()
            .find(|r| r.label == "template_1027")
            .expect("raise-mode rule present");
        assert!(raise.is_compliance, "reasons: {:?}", raise.reasons);

        // the raising-period bound holds (30 ≤ 60)
        let period = report
            .results
            .iter()
            .find(|r| r.label == "schema_1026")
            .expect("raising-period checker present");
        assert!(period.is_compliance, "reasons: {:?}", period.reasons);

        // subscription floor holds for fixed income without non-standard
        let amount = report
            .results
            .iter()
            .find(|r| r.label == "schema_1028")
            .expect("subscribe-amount checker present");
        assert!(amount.is_compliance, "reasons: {:?}", amount.reasons);
    }

    #[test]
    fn end_to_end_public_fund_audit() {
        let yaml = r#"
fid: "fund-001"
mold: public_fund
paragraphs:
  - index: 0
    page: 1
    text: "天宁中证500指数证券投资基金基金合同"
  - index: 1
    page: 3
    text: "第二部分 基金的基本情况"
  - index: 2
    page: 3
    text: "本基金不设基金份额类别。"
chapters:
  - element_index: 1
    title: "第二部分 基金的基本情况"
    range: [1, 3]
answers:
  基金名称:
    value: "天宁中证500指数证券投资基金"
  基金的类别、类型:
    value: "股票型"
"#;
        let bundle = DocumentBundle::from_yaml(yaml).unwrap();
        let report = audit(&bundle);

        // the share-class template falls back to the no-classes branch
        // and matches the contract text
        let share = report
            .results
            .iter()
            .find(|r| r.label == "template_120")
            .expect("share-class rule present");
        assert!(share.is_compliance, "reasons: {:?}", share.reasons);

        // the fund name on the cover agrees with the extracted answer
        let name = report
            .results
            .iter()
            .find(|r| r.label == "schema_800")
            .expect("fund-name checker present");
        assert!(name.is_compliance, "reasons: {:?}", name.reasons);

        // the listing rule does not apply to an unlisted fund
        let listed = report
            .results
            .iter()
            .find(|r| r.label == "template_810")
            .expect("listing rule present");
        assert_eq!(listed.is_compliance_real(), None);
    }

    #[test]
    fn audit_is_deterministic() {
        // end to end determinism (modulo the timestamp)
        let bundle = DocumentBundle::from_yaml(asset_plan_yaml()).unwrap();
        let first = audit(&bundle);
        let second = audit(&bundle);
        assert_eq!(
            serde_json::to_string(&first.results).unwrap(),
            serde_json::to_string(&second.results).unwrap()
        );
    }

    #[test]
    fn cancellation_yields_partial_report() {
        let bundle = DocumentBundle::from_yaml(asset_plan_yaml()).unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let report = audit_with_cancel(&bundle, &cancel);
        assert!(report.results.is_empty());
    }
}
