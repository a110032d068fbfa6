//! Enumeration checkers for the pooled plan: holder-meeting items,
//! non-trading transfer, share-registry responsibility.

use lazy_static::lazy_static;

use crate::chapters;
use crate::condition::{canned, verify_conditions, Condition};
use crate::document::{merge_outlines, min_page};
use crate::evaluate::{EvalContext, Reason, ResultItem};
use crate::pattern::{PatternCollection, R_CONJUNCTION};
use crate::text::clean_txt;

use super::base_result;

/// One item that must be present, with an optional gating condition.
struct CheckResultRelation {
    name: &'static str,
    pattern: PatternCollection,
    conditions: Vec<Condition>,
}

lazy_static! {
    static ref P_REGISTRY_SENTENCE: PatternCollection =
        PatternCollection::compile(["(份额|注册)登记机构的?(职责|义务)"]).unwrap();
}

fn meeting_items() -> Vec<CheckResultRelation> {
    vec![
        CheckResultRelation {
            name: "召集人和召集方式",
            pattern: PatternCollection::compile(["召集人|召集方式"]).unwrap(),
            conditions: Vec::new(),
        },
        CheckResultRelation {
            name: "召开会议的通知时间、通知内容、通知方式",
            pattern: PatternCollection::compile([format!(
                "(?:(?:通知时间|通知内容|通知方式)[{R_CONJUNCTION}]?){{3}}"
            )])
            .unwrap(),
            conditions: Vec::new(),
        },
        CheckResultRelation {
            name: "出席会议的方式",
            pattern: PatternCollection::compile(["出席会议的?方式"]).unwrap(),
            conditions: Vec::new(),
        },
        CheckResultRelation {
            name: "议事内容与程序",
            pattern: PatternCollection::compile([format!("议事内容[{R_CONJUNCTION}]程序")])
                .unwrap(),
            conditions: Vec::new(),
        },
        CheckResultRelation {
            name: "决议形成和生效的条件、表决方式、程序",
            pattern: PatternCollection::compile([format!(
                "决议形成[{R_CONJUNCTION}]生效的?(?:(?:条件|表决方式|程序)[{R_CONJUNCTION}]?){{3}}"
            )])
            .unwrap(),
            conditions: Vec::new(),
        },
    ]
}

/// 合同 must enumerate every holder-meeting item; success iff every
/// conditional item is present somewhere in the chapter (titles or
/// paragraph text).
pub fn check_meeting_matters(ctx: &EvalContext<'_>) -> ResultItem {
    let mut result = base_result(
        ctx,
        "schema_1041",
        "集合计划份额持有人大会-应在合同中订明的事项",
        "份额持有人大会及日常机构",
        &[],
        &[],
        &[],
    );
    let mut reason_parts = Vec::new();
    if !verify_conditions(&[canned::pooled()], ctx.classification) {
        reason_parts.push("不是集合类型");
    }
    if !verify_conditions(&[canned::holder_meeting_yes()], ctx.classification) {
        reason_parts.push("未披露持有人大会");
    }
    if !reason_parts.is_empty() {
        result.reasons.push(Reason::ignore_condition(format!(
            "当前基金{}",
            reason_parts.join("、")
        )));
        return result;
    }

    let patterns = vec![chapters::ASSET_GENERAL_MEETING.pattern.clone()];
    let (found, paragraphs) = ctx.reader.find_paragraphs_by_chapters(&patterns, true);
    if found.is_empty() {
        result.is_compliance = false;
        result.reasons.push(Reason::miss_content(
            "章节《份额持有人大会及日常机构》不存在",
            "《份额持有人大会及日常机构》",
            false,
        ));
        result.suggestion = "请补充份额持有人大会及日常机构章节".into();
        return result;
    }
    let mut haystack: Vec<String> = paragraphs
        .iter()
        .map(|p| clean_txt(&p.text))
        .collect();
    for chapter in &found {
        for child in ctx.reader.child_chapters(chapter) {
            haystack.push(clean_txt(&child.title));
        }
    }
    let outlines = merge_outlines(paragraphs.iter().copied());
    for item in meeting_items() {
        if !verify_conditions(&item.conditions, ctx.classification) {
            continue;
        }
        if !haystack.iter().any(|text| item.pattern.is_match(text)) {
            result.is_compliance = false;
            result.reasons.push(Reason::match_failed(
                format!("未找到“{}”", item.name),
                min_page(&outlines),
                outlines.clone(),
            ));
        }
    }
    if !result.is_compliance {
        result.suggestion = "请在份额持有人大会及日常机构章节中补充缺失事项".into();
    }
    result
}

/// The pooled plan must stipulate non-trading transfer handling.
pub fn check_non_trading(ctx: &EvalContext<'_>) -> ResultItem {
    let mut result = base_result(
        ctx,
        "schema_1037",
        "集合计划的非交易过户",
        "资产管理计划的参与、退出与转让",
        &["非交易过户认定及处理方式"],
        &[],
        &[],
    );
    if !verify_conditions(&[canned::pooled()], ctx.classification) {
        result
            .reasons
            .push(Reason::ignore_condition("当前基金类型不是集合类型".into()));
        return result;
    }
    if ctx.answers.get("非交易过户认定及处理方式").is_empty() {
        result.is_compliance = false;
        result
            .reasons
            .push(Reason::match_failed("没有约定非交易过户".into(), 0, Default::default()));
        result.suggestion = "请约定非交易过户".into();
    }
    result
}

/// The share-registry chapter must spell out the registrar's duties.
pub fn check_registry_responsibility(ctx: &EvalContext<'_>) -> ResultItem {
    let mut result = base_result(
        ctx,
        "schema_1045",
        "集合计划应订明份额登记机构的职责",
        "资产管理计划份额的登记",
        &[],
        &["第十六条 证券期货经营机构可以自行办理资产管理计划份额的登记、估值、核算，也可以委托中国证监会认可的其他机构代为办理。"],
        &["证券期货经营机构私募资产管理业务管理办法（证监会令第203号修订 2023年1月12日）"],
    );
    if !verify_conditions(&[canned::pooled()], ctx.classification) {
        result
            .reasons
            .push(Reason::ignore_condition("当前基金类型不是集合类型".into()));
        return result;
    }
    let patterns = vec![chapters::ASSET_REGISTRY.pattern.clone()];
    let (_, paragraphs) = ctx.reader.find_paragraphs_by_chapters(&patterns, true);
    if paragraphs
        .iter()
        .any(|p| P_REGISTRY_SENTENCE.is_match(&clean_txt(&p.text)))
    {
        return result;
    }
    let outlines = merge_outlines(paragraphs.iter().copied());
    result.is_compliance = false;
    result.reasons.push(Reason::match_failed(
        "未找到“份额登记机构的职责、份额登记机构的义务、注册登记机构的义务、注册登记机构的职责”"
            .into(),
        min_page(&outlines),
        outlines,
    ));
    result.suggestion =
        "请添加“份额登记机构的职责、份额登记机构的义务、注册登记机构的义务、注册登记机构的职责”"
            .into();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{resolve_classification, Mold};
    use crate::document::{
        Answer, AnswerManager, Chapter, DocumentBundle, Paragraph, ParagraphKind, Reader,
    };
    use std::collections::BTreeMap;

    fn paragraph(index: usize, text: &str) -> Paragraph {
        Paragraph {
            index,
            page: 1,
            text: text.to_string(),
            kind: ParagraphKind::Paragraph,
            rows: Vec::new(),
            fragment: false,
            outlines: Default::default(),
        }
    }

    fn bundle(paragraphs: Vec<Paragraph>, chapters: Vec<Chapter>) -> DocumentBundle {
        let mut answers = BTreeMap::new();
        answers.insert(
            "计划名称".to_string(),
            Answer {
                value: Some("XX集合资产管理计划".to_string()),
                outlines: Default::default(),
            },
        );
        DocumentBundle {
            fid: "doc".into(),
            mold: Mold::AssetManagement,
            paragraphs,
            chapters,
            answers,
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

    fn meeting_bundle(items: &[&str]) -> DocumentBundle {
        let mut paragraphs = vec![paragraph(0, "份额持有人大会及日常机构")];
        for (idx, item) in items.iter().enumerate() {
            paragraphs.push(paragraph(idx + 1, item));
        }
        let end = paragraphs.len();
        bundle(
            paragraphs,
            vec![Chapter {
                element_index: 0,
                title: "份额持有人大会及日常机构".into(),
                range: (0, end),
                parent: None,
                children: Vec::new(),
            }],
        )
    }

    #[test]
    fn all_items_present_passes() {
        let bundle = meeting_bundle(&[
            "一、召集人和召集方式",
            "二、召开会议的通知时间、通知内容、通知方式",
            "三、出席会议的方式",
            "四、议事内容与程序",
            "五、决议形成和生效的条件、表决方式、程序",
        ]);
        let result = run(&bundle, check_meeting_matters);
        assert!(result.is_compliance, "reasons: {:?}", result.reasons);
    }

    #[test]
    fn missing_item_fails_with_name() {
        let bundle = meeting_bundle(&["一、召集人和召集方式"]);
        let result = run(&bundle, check_meeting_matters);
        assert!(!result.is_compliance);
        assert!(result
            .reasons
            .iter()
            .any(|r| r.reason_text() == "未找到“出席会议的方式”"));
    }

    #[test]
    fn no_meeting_chapter_is_ignored() {
        // without the chapter the classification itself resolves to 无大会
        let bundle = bundle(Vec::new(), Vec::new());
        let result = run(&bundle, check_meeting_matters);
        assert!(result.reasons[0].is_ignore());
        assert!(result.reasons[0].reason_text().contains("未披露持有人大会"));
    }

    #[test]
    fn non_trading_missing_answer_fails() {
        let bundle = bundle(Vec::new(), Vec::new());
        let result = run(&bundle, check_non_trading);
        assert!(!result.is_compliance);
        assert_eq!(result.suggestion, "请约定非交易过户");
    }

    #[test]
    fn registry_duty_sentence_satisfies() {
        let bundle = bundle(
            vec![
                paragraph(0, "资产管理计划份额的登记"),
                paragraph(1, "份额登记机构的职责包括建立并管理投资者名册。"),
            ],
            vec![Chapter {
                element_index: 0,
                title: "资产管理计划份额的登记".into(),
                range: (0, 2),
                parent: None,
                children: Vec::new(),
            }],
        );
        let result = run(&bundle, check_registry_responsibility);
        assert!(result.is_compliance, "reasons: {:?}", result.reasons);

        let bundle = bundle_missing();
        let result = run(&bundle, check_registry_responsibility);
        assert!(!result.is_compliance);
    }

    fn bundle_missing() -> DocumentBundle {
        bundle(
            vec![
                paragraph(0, "资产管理计划份额的登记"),
                paragraph(1, "登记业务由管理人自行办理。"),
            ],
            vec![Chapter {
                element_index: 0,
                title: "资产管理计划份额的登记".into(),
                range: (0, 2),
                parent: None,
                children: Vec::new(),
            }],
        )
    }
}
