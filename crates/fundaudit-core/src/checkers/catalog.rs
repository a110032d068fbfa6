//! Catalog accuracy: every entry of the 目录 chapter must point at a
//! real page heading or an existing chapter title.

use crate::condition::{canned, verify_conditions};
use crate::document::{merge_outlines, min_page};
use crate::evaluate::{EvalContext, Reason, ResultItem};
use crate::pattern::{P_CATALOGUE, P_CATALOG_TITLE, P_NUMBERING};
use crate::text::clean_txt;

use super::base_result;

/// Strip the serial prefix off a catalog entry or chapter title.
fn strip_title_numbering(title: &str) -> String {
    let cleaned = clean_txt(title);
    match P_NUMBERING.find(&cleaned) {
        Some(matched) => cleaned[matched.end()..].to_string(),
        None => cleaned,
    }
}

pub fn check_catalog_accuracy(ctx: &EvalContext<'_>) -> ResultItem {
    let mut result = base_result(
        ctx,
        "schema_1006",
        "验证目录准确性",
        "目录",
        &[],
        &["第十二条 资产管理合同目录应当自首页开始排印。目录应当列明各个具体标题及相应的页码。"],
        &[],
    );
    if ctx.mold == crate::classify::Mold::AssetManagement
        && !verify_conditions(&[canned::single_or_pooled()], ctx.classification)
    {
        result.reasons.push(Reason::ignore_condition(
            "当前基金类型不是单一或集合类型".into(),
        ));
        return result;
    }

    let patterns = vec![P_CATALOGUE.patterns()[0].clone()];
    let (_, paragraphs) = ctx.reader.find_paragraphs_by_chapters(&patterns, false);
    for paragraph in paragraphs {
        let line = paragraph.text.trim_end();
        let mut found = false;
        let text;
        if let Some(caps) = P_CATALOG_TITLE.captures(line) {
            text = strip_title_numbering(&caps["content"]);
            if text.is_empty() {
                continue;
            }
            if let Ok(page_no) = caps["no"].parse::<u32>() {
                let (cover_text, _) = ctx.reader.join_page_text(page_no);
                if cover_text.contains(&text) {
                    found = true;
                }
            }
            if !found {
                // fall back to the chapter tree: a syllabus title that
                // matches still counts
                found = ctx
                    .reader
                    .chapters()
                    .iter()
                    .any(|chapter| strip_title_numbering(&chapter.title) == text);
            }
        } else {
            text = strip_title_numbering(line);
            if text.is_empty() {
                continue;
            }
            found = ctx
                .reader
                .chapters()
                .iter()
                .any(|chapter| strip_title_numbering(&chapter.title) == text);
        }
        if !found {
            let outlines = merge_outlines([paragraph]);
            result.reasons.push(Reason::match_failed(
                format!("目录章节\"{text}\"未找到"),
                min_page(&outlines),
                outlines,
            ));
        }
    }
    if !result.reasons.is_empty() {
        result.is_compliance = false;
        result.suggestion = "建议检查目录章节".into();
    }
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

    fn bundle(catalog_line: &str, cover_text: &str) -> DocumentBundle {
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
            paragraphs: vec![
                paragraph(0, 1, "目录"),
                paragraph(1, 1, catalog_line),
                paragraph(2, 12, cover_text),
            ],
            chapters: vec![Chapter {
                element_index: 0,
                title: "目录".into(),
                range: (0, 2),
                parent: None,
                children: Vec::new(),
            }],
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
        check_catalog_accuracy(&ctx)
    }

    #[test]
    fn entry_found_on_target_page_passes() {
        let bundle = bundle("基金的投资......12", "第四部分 基金的投资");
        let result = run(&bundle);
        assert!(result.is_compliance, "reasons: {:?}", result.reasons);
    }

    #[test]
    fn entry_missing_from_page_fails() {
        let bundle = bundle("基金的投资......12", "第四部分 基金的托管");
        let result = run(&bundle);
        assert!(!result.is_compliance);
        assert!(result
            .reasons
            .iter()
            .any(|r| r.reason_text() == "目录章节\"基金的投资\"未找到"));
        assert_eq!(result.suggestion, "建议检查目录章节");
    }

    #[test]
    fn entry_matching_chapter_title_passes() {
        let mut bundle = bundle("基金的投资......99", "别的内容");
        bundle.chapters.push(Chapter {
            element_index: 2,
            title: "第四部分 基金的投资".into(),
            range: (2, 3),
            parent: None,
            children: Vec::new(),
        });
        let result = run(&bundle);
        assert!(result.is_compliance, "reasons: {:?}", result.reasons);
    }
}
