//! Cross-chapter consistency of investment proportion / restriction
//! clauses: the basic-information chapter is the baseline, the
//! investment chapter and the ultra-vires chapter must agree with it
//! under synonym equivalence.

use crate::chapters;
use crate::document::{merge_outlines, min_page, outlines_overlap, Paragraph};
use crate::evaluate::{EvalContext, Reason, ResultItem};
use crate::similarity::{
    ConvertType, ParagraphSimilarity, SentenceBlock, SimilarityOptions,
};

use super::base_result;

const CHAPTER_BASIC: &str = "资产管理计划的基本情况";
const CHAPTER_INVEST: &str = "资产管理计划的投资";
const CHAPTER_ULTRA_VIRES: &str = "越权交易的界定";

pub fn check_investment_proportion(ctx: &EvalContext<'_>) -> ResultItem {
    let mut result = base_result(
        ctx,
        "schema_1004",
        "全文投资比例限制内容保持一致",
        "",
        &[],
        &[],
        &[],
    );

    // the extraction splits the field by prefix depending on the
    // document's own phrasing
    let prefixes: Vec<&str> = if ctx
        .answers
        .mapping()
        .contains_key(&format!("投资比例-{CHAPTER_BASIC}"))
    {
        vec!["投资比例", "投资限制"]
    } else {
        vec!["投资比例及限制"]
    };

    for prefix in prefixes {
        let base_field = format!("{prefix}-{CHAPTER_BASIC}");
        let Some(base_paragraphs) = paragraphs_by_answer(ctx, &base_field) else {
            continue;
        };
        if base_paragraphs.is_empty() {
            add_miss(&mut result, CHAPTER_BASIC, prefix);
            continue;
        }
        // the investment chapter
        match paragraphs_by_answer(ctx, &format!("{prefix}-{CHAPTER_INVEST}")) {
            Some(paragraphs) if !paragraphs.is_empty() => compare_chapters(
                ctx,
                &mut result,
                &base_paragraphs,
                &paragraphs,
                CHAPTER_INVEST,
                prefix,
            ),
            _ => add_miss(&mut result, CHAPTER_INVEST, prefix),
        }
        // the ultra-vires chapter
        let patterns = vec![chapters::ASSET_ULTRA_VIRES.pattern.clone()];
        let (found, paragraphs) = ctx.reader.find_paragraphs_by_chapters(&patterns, true);
        if found.is_empty() || paragraphs.is_empty() {
            add_miss(&mut result, CHAPTER_ULTRA_VIRES, prefix);
        } else {
            compare_chapters(
                ctx,
                &mut result,
                &base_paragraphs,
                &paragraphs,
                CHAPTER_ULTRA_VIRES,
                prefix,
            );
        }
    }

    // vacuously compliant when the proportion fields were never
    // extracted for this document
    result.is_compliance = result
        .reasons
        .iter()
        .all(|reason| matches!(reason, Reason::MatchedSuccess { .. }));
    result
}

/// Paragraphs of the chapter containing an answer, located through the
/// answer's outlines. `None` when the field was never extracted.
fn paragraphs_by_answer<'a>(
    ctx: &EvalContext<'a>,
    field: &str,
) -> Option<Vec<&'a Paragraph>> {
    let answer = ctx.answers.get(field);
    if answer.is_empty() {
        return None;
    }
    let anchor = ctx
        .reader
        .paragraphs()
        .iter()
        .find(|p| outlines_overlap(&p.outlines, &answer.outlines))?;
    let chapter = ctx.reader.chapter_of_paragraph(anchor.index)?;
    Some(ctx.reader.paragraphs_in_range(chapter.range, chapter.element_index))
}

fn add_miss(result: &mut ResultItem, chapter: &str, invest_type: &str) {
    let suggestion = format!("请在《{chapter}》章节内补充{invest_type}的内容");
    result.reasons.push(Reason::TplMissContent {
        reason_text: format!("章节《{chapter}》的“{invest_type}”不存在"),
        miss_content: String::new(),
        template: None,
        matched: false,
    });
    if result.suggestion.is_empty() {
        result.suggestion = suggestion;
    } else {
        result.suggestion = format!("{}\n{suggestion}", result.suggestion);
    }
}

fn compare_chapters(
    ctx: &EvalContext<'_>,
    result: &mut ResultItem,
    base: &[&Paragraph],
    target: &[&Paragraph],
    chapter: &str,
    invest_type: &str,
) {
    let options = SimilarityOptions {
        ignore_extra_para: true,
        synonyms: ctx.synonym_patterns(),
        convert_types: ConvertType::all(),
        ..SimilarityOptions::default()
    };
    let similarity = ParagraphSimilarity::new(
        SentenceBlock::from_paragraphs(base),
        SentenceBlock::from_paragraphs(target),
        options,
    );
    if similarity.is_full_matched_or_contain() || similarity.is_full_matched_without_extra_para() {
        let outlines = similarity.right_outlines();
        result.reasons.push(Reason::MatchedSuccess {
            page: min_page(&outlines),
            outlines,
            content: similarity.right_content(),
            reason_text: format!(
                "《{CHAPTER_BASIC}》章节与《{chapter}》章节“{invest_type}”的内容一致"
            ),
        });
    } else if similarity.is_matched() {
        let outlines = similarity.right_outlines();
        result.reasons.push(Reason::match_failed(
            format!("《{CHAPTER_BASIC}》章节与《{chapter}》章节“{invest_type}”不一致"),
            min_page(&outlines),
            outlines,
        ));
        let suggestion = format!(
            "请修改《{CHAPTER_BASIC}》章节与《{chapter}》章节“{invest_type}”的内容保持一致"
        );
        push_suggestion(result, suggestion);
    } else {
        let outlines = merge_outlines(target.iter().copied());
        result.reasons.push(Reason::match_failed(
            format!(
                "《{chapter}》章节未找到与《{CHAPTER_BASIC}》章节“{invest_type}”相似的内容"
            ),
            min_page(&outlines),
            outlines,
        ));
        let suggestion = format!(
            "请在《{chapter}》章节中添加《{CHAPTER_BASIC}》章节中“{invest_type}”的内容"
        );
        push_suggestion(result, suggestion);
    }
}

fn push_suggestion(result: &mut ResultItem, suggestion: String) {
    if result.suggestion.is_empty() {
        result.suggestion = suggestion;
    } else if !result.suggestion.contains(&suggestion) {
        result.suggestion = format!("{}\n{suggestion}", result.suggestion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{resolve_classification, Mold};
    use crate::document::{
        Answer, AnswerManager, Chapter, DocumentBundle, Outlines, ParagraphKind, Reader,
    };
    use std::collections::BTreeMap;

    fn paragraph_with_outline(index: usize, page: u32, text: &str) -> Paragraph {
        let mut outlines = Outlines::new();
        outlines.insert(page, vec![[0.0, index as f64 * 10.0, 100.0, index as f64 * 10.0 + 9.0]]);
        Paragraph {
            index,
            page,
            text: text.to_string(),
            kind: ParagraphKind::Paragraph,
            rows: Vec::new(),
            fragment: false,
            outlines,
        }
    }

    fn bundle(invest_text: &str) -> DocumentBundle {
        let mut answers = BTreeMap::new();
        let mut outlines = Outlines::new();
        outlines.insert(1, vec![[0.0, 10.0, 100.0, 19.0]]);
        answers.insert(
            "投资比例及限制-资产管理计划的基本情况".to_string(),
            Answer {
                value: Some("股票投资比例不超过资产净值的50%".to_string()),
                outlines,
            },
        );
        DocumentBundle {
            fid: "doc".into(),
            mold: Mold::AssetManagement,
            paragraphs: vec![
                paragraph_with_outline(0, 1, "资产管理计划的基本情况"),
                paragraph_with_outline(1, 1, "股票投资比例不超过资产净值的50%。"),
                paragraph_with_outline(2, 2, "越权交易的界定"),
                paragraph_with_outline(3, 2, invest_text),
            ],
            chapters: vec![
                Chapter {
                    element_index: 0,
                    title: "资产管理计划的基本情况".into(),
                    range: (0, 2),
                    parent: None,
                    children: Vec::new(),
                },
                Chapter {
                    element_index: 2,
                    title: "越权交易的界定".into(),
                    range: (2, 4),
                    parent: None,
                    children: Vec::new(),
                },
            ],
            answers,
        }
    }

    fn run(bundle: &DocumentBundle) -> ResultItem {
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
        check_investment_proportion(&ctx)
    }

    #[test]
    fn consistent_chapters_pass_where_present() {
        let bundle = bundle("股票投资比例不超过资产净值的50%。");
        let result = run(&bundle);
        // ultra-vires agrees; the invest chapter is missing, so the
        // verdict is non-compliant with a miss reason
        assert!(result
            .reasons
            .iter()
            .any(|r| matches!(r, Reason::MatchedSuccess { .. })));
        assert!(result
            .reasons
            .iter()
            .any(|r| r.reason_text().contains("《资产管理计划的投资》")));
        assert!(!result.is_compliance);
    }

    #[test]
    fn conflicting_ultra_vires_fails() {
        let bundle = bundle("股票投资比例不超过资产净值的80%。");
        let result = run(&bundle);
        assert!(!result.is_compliance);
        assert!(result
            .reasons
            .iter()
            .any(|r| r.reason_text().contains("不一致")));
    }

    #[test]
    fn percentage_equivalent_phrasing_is_consistent() {
        let bundle = bundle("股票投资比例不超过资产净值的百分之五十。");
        let result = run(&bundle);
        assert!(result
            .reasons
            .iter()
            .any(|r| matches!(r, Reason::MatchedSuccess { .. })));
    }
}
