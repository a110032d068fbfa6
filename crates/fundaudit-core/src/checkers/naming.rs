//! Name-consistency checks: one canonical name (plan / manager /
//! trustee) must appear on the cover, in the definition clauses, in the
//! main-afterword block and on the signature page.

use lazy_static::lazy_static;
use regex::Regex;

use crate::condition::{canned, verify_conditions};
use crate::document::{merge_outlines, min_page, Paragraph};
use crate::evaluate::{EvalContext, Reason, ResultItem};
use crate::pattern::PatternCollection;
use crate::text::clean_txt;

use super::base_result;

lazy_static! {
    static ref P_MAIN_AFTERWARD_START: PatternCollection =
        PatternCollection::compile(["(无正文|以下无正文)"]).unwrap();
    static ref P_SIGNATURE_START: PatternCollection =
        PatternCollection::compile(["签[署字](盖章)?[页]"]).unwrap();
    static ref P_MGR_ABBREVIATION: Regex =
        Regex::new(".*(基金|证券|银行|期货|资本|投资|资产)").unwrap();
}

/// Everything that varies between the three name checkers.
struct NameCheckProfile {
    label: &'static str,
    name: &'static str,
    field: &'static str,
    empty_reason: &'static str,
    mismatch_prefix: &'static str,
    empty_suggestion: &'static str,
    mismatch_suggestion: &'static str,
    cover: PatternCollection,
    main_afterward: PatternCollection,
    definitions: Vec<(&'static str, PatternCollection)>,
}

fn plan_profile() -> NameCheckProfile {
    NameCheckProfile {
        label: "schema_1000",
        name: "全文基金名称保持一致",
        field: "计划名称",
        empty_reason: "计划名称不能为空",
        mismatch_prefix: "计划名称不是",
        empty_suggestion: "请添加计划名称",
        mismatch_suggestion: "全文计划名称需保持一致",
        cover: PatternCollection::compile([".*计划"]).unwrap(),
        main_afterward: PatternCollection::compile([
            "(参与|认购).+计划.+资金",
            "为.+计划.+签[署字](盖章)?[页]",
        ])
        .unwrap(),
        definitions: vec![
            (
                "释义",
                PatternCollection::compile([
                    "签署的.*计划",
                    "(计划说明书|计划)[:：]指.*计划[,.。 ]?$",
                ])
                .unwrap(),
            ),
            (
                "资产管理计划的基本情况",
                PatternCollection::compile([".*计划的名称"]).unwrap(),
            ),
        ],
    }
}

fn manager_profile() -> NameCheckProfile {
    NameCheckProfile {
        label: "schema_1001",
        name: "全文管理人名称保持一致",
        field: "计划管理人-名称",
        empty_reason: "计划管理人名称不能为空",
        mismatch_prefix: "计划管理人名称不是",
        empty_suggestion: "请添加计划管理人名称",
        mismatch_suggestion: "全文计划管理人名称需保持一致",
        cover: PatternCollection::compile(["管理人([（(](盖章|签章)[)）])*[:：].*"]).unwrap(),
        main_afterward: PatternCollection::compile(["管理人([（(](盖章|签章)[)）])*[:：].*"])
            .unwrap(),
        definitions: vec![
            (
                "释义",
                PatternCollection::compile(["管理人[:：].*有限公司"]).unwrap(),
            ),
            (
                "当事人及权利义务",
                PatternCollection::compile(["管理人的?(基本情况|概况)"]).unwrap(),
            ),
        ],
    }
}

fn trustee_profile() -> NameCheckProfile {
    NameCheckProfile {
        label: "schema_1002",
        name: "全文托管人名称保持一致",
        field: "计划托管人-名称",
        empty_reason: "计划托管人名称不能为空",
        mismatch_prefix: "计划托管人名称不是",
        empty_suggestion: "请添加计划托管人名称",
        mismatch_suggestion: "全文计划托管人名称需保持一致",
        cover: PatternCollection::compile(["托管人([（(](盖章|签章)[)）])*[:：].*"]).unwrap(),
        main_afterward: PatternCollection::compile(["托管人([（(](盖章|签章)[)）])*[:：].*"])
            .unwrap(),
        definitions: vec![
            (
                "释义",
                PatternCollection::compile(["托管人[:：].*有限公司"]).unwrap(),
            ),
            (
                "资产管理计划的费用与税收",
                PatternCollection::compile([
                    "(收取|接收)托管费的?.*账户",
                    "托管费(收取|接收).*账户",
                ])
                .unwrap(),
            ),
        ],
    }
}

fn fund_profile() -> NameCheckProfile {
    NameCheckProfile {
        label: "schema_800",
        name: "全文基金名称保持一致",
        field: "基金名称",
        empty_reason: "基金名称不能为空",
        mismatch_prefix: "基金名称不是",
        empty_suggestion: "请添加基金名称",
        mismatch_suggestion: "全文基金名称需保持一致",
        cover: PatternCollection::compile([".*(?:证券投资)?基金"]).unwrap(),
        main_afterward: PatternCollection::compile([
            "为.+基金.+签[署字](盖章)?[页]",
            "(认购|申购).+基金.+资金",
        ])
        .unwrap(),
        definitions: vec![
            (
                "释义",
                PatternCollection::compile([
                    "签署的.*基金合同",
                    "(本基金|基金)[:：]指.*基金[,.。 ]?$",
                ])
                .unwrap(),
            ),
            (
                "基金的基本情况",
                PatternCollection::compile(["基金的?名称"]).unwrap(),
            ),
        ],
    }
}

fn fund_manager_profile() -> NameCheckProfile {
    NameCheckProfile {
        label: "schema_801",
        name: "全文基金管理人名称保持一致",
        field: "基金管理人-名称",
        empty_reason: "基金管理人名称不能为空",
        mismatch_prefix: "基金管理人名称不是",
        empty_suggestion: "请添加基金管理人名称",
        mismatch_suggestion: "全文基金管理人名称需保持一致",
        cover: PatternCollection::compile(["基金管理人([（(](盖章|签章)[)）])*[:：].*"]).unwrap(),
        main_afterward: PatternCollection::compile(["基金管理人([（(](盖章|签章)[)）])*[:：].*"])
            .unwrap(),
        definitions: vec![
            (
                "释义",
                PatternCollection::compile(["(基金)?管理人[:：].*有限公司"]).unwrap(),
            ),
            (
                "基金管理人、基金托管人",
                PatternCollection::compile(["基金管理人的?(基本情况|概况)"]).unwrap(),
            ),
        ],
    }
}

fn fund_trustee_profile() -> NameCheckProfile {
    NameCheckProfile {
        label: "schema_802",
        name: "全文基金托管人名称保持一致",
        field: "基金托管人-名称",
        empty_reason: "基金托管人名称不能为空",
        mismatch_prefix: "基金托管人名称不是",
        empty_suggestion: "请添加基金托管人名称",
        mismatch_suggestion: "全文基金托管人名称需保持一致",
        cover: PatternCollection::compile(["基金托管人([（(](盖章|签章)[)）])*[:：].*"]).unwrap(),
        main_afterward: PatternCollection::compile(["基金托管人([（(](盖章|签章)[)）])*[:：].*"])
            .unwrap(),
        definitions: vec![
            (
                "释义",
                PatternCollection::compile(["(基金)?托管人[:：].*有限公司"]).unwrap(),
            ),
            (
                "基金费用与税收",
                PatternCollection::compile([
                    "(收取|接收)托管费的?.*账户",
                    "托管费(收取|接收).*账户",
                ])
                .unwrap(),
            ),
        ],
    }
}

pub fn check_plan_name_consistency(ctx: &EvalContext<'_>) -> ResultItem {
    check_name_consistency(ctx, plan_profile())
}

pub fn check_fund_name_consistency(ctx: &EvalContext<'_>) -> ResultItem {
    check_name_consistency(ctx, fund_profile())
}

pub fn check_fund_manager_consistency(ctx: &EvalContext<'_>) -> ResultItem {
    check_name_consistency(ctx, fund_manager_profile())
}

pub fn check_fund_trustee_consistency(ctx: &EvalContext<'_>) -> ResultItem {
    check_name_consistency(ctx, fund_trustee_profile())
}

pub fn check_manager_name_consistency(ctx: &EvalContext<'_>) -> ResultItem {
    check_name_consistency(ctx, manager_profile())
}

pub fn check_trustee_name_consistency(ctx: &EvalContext<'_>) -> ResultItem {
    check_name_consistency(ctx, trustee_profile())
}

fn check_name_consistency(ctx: &EvalContext<'_>, profile: NameCheckProfile) -> ResultItem {
    let mut result = base_result(
        ctx,
        profile.label,
        profile.name,
        "基础规则",
        &[profile.field],
        &[],
        &[],
    );
    let answer = ctx.answers.get(profile.field);
    if answer.is_empty() {
        result.is_compliance = false;
        result
            .reasons
            .push(Reason::match_failed(profile.empty_reason.to_string(), 0, Default::default()));
        result.suggestion = profile.empty_suggestion.to_string();
        return result;
    }
    let canonical = clean_txt(answer.text());

    let fail = |paragraph: &Paragraph, result: &mut ResultItem| {
        let outlines = merge_outlines([paragraph]);
        result.is_compliance = false;
        result.reasons.push(Reason::match_failed(
            format!("{}“{}”", profile.mismatch_prefix, answer.text()),
            if outlines.is_empty() {
                paragraph.page
            } else {
                min_page(&outlines)
            },
            outlines,
        ));
        result.suggestion = profile.mismatch_suggestion.to_string();
    };

    // cover: the first page
    if let Some(first_page) = ctx.reader.paragraphs().first().map(|p| p.page) {
        let (_, cover_paragraphs) = ctx.reader.join_page_text(first_page);
        for paragraph in cover_paragraphs {
            let text = clean_txt(&paragraph.text);
            if let Some(matched) = profile.cover.find(&text) {
                if !matched.as_str().contains(canonical.as_str()) {
                    fail(paragraph, &mut result);
                }
                break;
            }
        }
    }

    // definition chapters
    for (chapter, pattern) in &profile.definitions {
        let chapter_regex = match Regex::new(chapter) {
            Ok(regex) => regex,
            Err(_) => continue,
        };
        let (found, paragraphs) = ctx
            .reader
            .find_paragraphs_by_chapters(&[chapter_regex], false);
        if found.is_empty() {
            continue;
        }
        for paragraph in paragraphs {
            let text = clean_txt(&paragraph.text);
            if pattern.is_match(&text) && !text.contains(canonical.as_str()) {
                fail(paragraph, &mut result);
            }
        }
    }

    // main afterword + signature blocks, searched from the tail
    let paragraphs = ctx.reader.paragraphs();
    let mut signature_start = None;
    let mut afterword_start = None;
    for (idx, paragraph) in paragraphs.iter().enumerate().rev() {
        let text = paragraph.text.trim();
        if P_SIGNATURE_START.is_match(text) {
            signature_start = Some(idx);
        } else if P_MAIN_AFTERWARD_START.is_match(text) {
            afterword_start = Some(idx);
            break;
        }
    }
    let tail_from = afterword_start.or(signature_start);
    if let Some(start) = tail_from {
        for paragraph in &paragraphs[start..] {
            let text = clean_txt(&paragraph.text);
            if let Some(matched) = profile.main_afterward.find(&text) {
                if !matched.as_str().contains(canonical.as_str()) {
                    fail(paragraph, &mut result);
                }
            }
        }
    }
    result
}

/// Plan-naming notation: the product name must embed the manager's
/// abbreviation; FOF plans must carry the "FOF" marker.
pub fn check_naming_notations(ctx: &EvalContext<'_>) -> ResultItem {
    let mut result = base_result(
        ctx,
        "schema_1005",
        "资管计划的命名要求",
        "封面",
        &["计划名称", "计划管理人-名称"],
        &[],
        &[],
    );
    let plan_name = ctx.answers.get("计划名称");
    if plan_name.is_empty() {
        result.is_compliance = false;
        result
            .reasons
            .push(Reason::match_failed("计划名称不能为空".into(), 0, Default::default()));
        result.suggestion = "请添加计划名称".into();
        return result;
    }
    if verify_conditions(&[canned::single_or_pooled()], ctx.classification) {
        let manager_name = ctx.answers.get("计划管理人-名称");
        if manager_name.is_empty() {
            result.is_compliance = false;
            result
                .reasons
                .push(Reason::match_failed("管理人名称不能为空".into(), 0, Default::default()));
            result.suggestion = "请添加管理人名称".into();
            return result;
        }
        if let Some(matched) = P_MGR_ABBREVIATION.find(manager_name.text()) {
            if !plan_name.text().contains(matched.as_str()) {
                result.is_compliance = false;
                result.reasons.push(Reason::match_failed(
                    format!("计划名称应包含管理人简称“{}”", matched.as_str()),
                    0,
                    Default::default(),
                ));
            }
        }
    } else if verify_conditions(&[canned::fof()], ctx.classification)
        && !plan_name.text().contains("FOF")
    {
        result.is_compliance = false;
        result
            .reasons
            .push(Reason::match_failed("计划名称应包含“FOF”".into(), 0, Default::default()));
    }
    if !result.is_compliance {
        result.suggestion = if result.suggestion.is_empty() {
            "检查计划名称".into()
        } else {
            result.suggestion.clone()
        };
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{resolve_classification, Mold};
    use crate::document::{Answer, AnswerManager, DocumentBundle, ParagraphKind, Reader};
    use std::collections::BTreeMap;

    fn paragraph(index: usize, page: u32, text: &str) -> Paragraph {
        Paragraph {
            index,
            page,
            text: text.to_string(),
            kind: ParagraphKind::Paragraph,
            rows: Vec::new(),
            fragment: false,
            outlines: Default::default(),
        }
    }

    fn bundle(paragraphs: Vec<Paragraph>, answers: &[(&str, &str)]) -> DocumentBundle {
        let mut map = BTreeMap::new();
        for (field, value) in answers {
            map.insert(
                field.to_string(),
                Answer {
                    value: Some(value.to_string()),
                    outlines: Default::default(),
                },
            );
        }
        DocumentBundle {
            fid: "doc".into(),
            mold: Mold::AssetManagement,
            paragraphs,
            chapters: Vec::new(),
            answers: map,
        }
    }

    fn run<F>(bundle: &DocumentBundle, check: F) -> ResultItem
    where
        F: Fn(&EvalContext<'_>) -> ResultItem,
    {
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
        check(&ctx)
    }

    #[test]
    fn consistent_cover_passes() {
        let bundle = bundle(
            vec![paragraph(0, 1, "甲方基金XX集合资产管理计划")],
            &[("计划名称", "甲方基金XX集合资产管理计划")],
        );
        let result = run(&bundle, check_plan_name_consistency);
        assert!(result.is_compliance, "reasons: {:?}", result.reasons);
    }

    #[test]
    fn cover_mismatch_fails() {
        let bundle = bundle(
            vec![paragraph(0, 1, "乙方基金YY集合资产管理计划")],
            &[("计划名称", "甲方基金XX集合资产管理计划")],
        );
        let result = run(&bundle, check_plan_name_consistency);
        assert!(!result.is_compliance);
        assert!(result.reasons[0].reason_text().starts_with("计划名称不是"));
    }

    #[test]
    fn empty_name_fails_with_suggestion() {
        let bundle = bundle(vec![paragraph(0, 1, "封面")], &[]);
        let result = run(&bundle, check_plan_name_consistency);
        assert!(!result.is_compliance);
        assert_eq!(result.suggestion, "请添加计划名称");
    }

    #[test]
    fn signature_block_is_checked() {
        let bundle = bundle(
            vec![
                paragraph(0, 1, "甲方基金XX集合资产管理计划"),
                paragraph(1, 9, "（以下无正文）"),
                paragraph(2, 9, "本页为乙方基金YY集合资产管理计划之签署页"),
            ],
            &[("计划名称", "甲方基金XX集合资产管理计划")],
        );
        let result = run(&bundle, check_plan_name_consistency);
        assert!(!result.is_compliance);
    }

    #[test]
    fn naming_notation_requires_manager_abbreviation() {
        let bundle = bundle(
            Vec::new(),
            &[
                ("计划名称", "华信1号集合资产管理计划"),
                ("计划管理人-名称", "华富证券有限责任公司"),
            ],
        );
        let result = run(&bundle, check_naming_notations);
        assert!(!result.is_compliance);
        assert!(result.reasons[0]
            .reason_text()
            .contains("计划名称应包含管理人简称"));

        let bundle = bundle_ok();
        let result = run(&bundle, check_naming_notations);
        assert!(result.is_compliance, "reasons: {:?}", result.reasons);
    }

    fn bundle_ok() -> DocumentBundle {
        bundle(
            Vec::new(),
            &[
                ("计划名称", "华富证券1号集合资产管理计划"),
                ("计划管理人-名称", "华富证券有限责任公司"),
            ],
        )
    }
}
