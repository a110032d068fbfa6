//! Numeric-bound checkers for the pooled asset-management plan:
//! raising period, minimum subscription amount, open-day frequency.

use lazy_static::lazy_static;

use crate::condition::{canned, verify_conditions, Condition};
use crate::document::min_page;
use crate::evaluate::{EvalContext, Reason, ResultItem};
use crate::numeric::cn_number_to_digit;
use crate::pattern::PatternCollection;
use crate::similarity::{
    ConvertType, ParagraphSimilarity, SentenceBlock, SimilarityOptions,
};
use crate::text::clean_txt;

use super::base_result;

const R_PUNCT: &str = ",，。;；";
const R_CN: &str = "零〇壹贰叁肆伍陆柒捌玖拾佰仟萬億0-9两一二三四五六七八九十百千万亿";

lazy_static! {
    static ref P_RAISING_PERIOD: PatternCollection = PatternCollection::compile([
        format!("募集期[自从](?:(?:资产)?管理)?计划份额发售[^{R_PUNCT}]*?不超过(?P<day>[{R_CN}]+)[天日]"),
        format!("募集期[自从](?:(?:资产)?管理)?计划份额发售[^{R_PUNCT}]*?不超过(?P<month>[{R_CN}]+)个月"),
        format!("募集期[自从](?:(?:资产)?管理)?计划份额发售[^{R_PUNCT}]*?不超过(?P<year>[{R_CN}]+)年"),
        format!("募集期[自从](?:(?:资产)?管理)?计划份额发售[^{R_PUNCT}]*?不超过(?P<quarter>[{R_CN}]+)个季度"),
        // bare phrasings: the extracted answer often drops the chapter
        // boilerplate and starts at "自……发售之日起"
        format!("不超过(?P<day2>[{R_CN}]+)[天日]"),
        format!("不超过(?P<month2>[{R_CN}]+)个月"),
        format!("不超过(?P<year2>[{R_CN}]+)年"),
        format!("不超过(?P<quarter2>[{R_CN}]+)个季度"),
    ])
    .unwrap();
    static ref P_SUBSCRIBE_AMOUNT: PatternCollection = PatternCollection::compile([format!(
        "(?:募集期间的?)?认购金额应?不应?得?[低少]于(?P<number>(?:[{R_CN}]+[,，]?)+(?:[.．][0-9]+)?)元"
    )])
    .unwrap();
    static ref P_NUMBER_EXTRA_CHAR: PatternCollection =
        PatternCollection::compile([r"[\[\]【】]"]).unwrap();
    static ref P_QUARTER_OPEN_ONCE: PatternCollection = PatternCollection::compile([
        format!("开放日为[^{R_PUNCT}]*?【?(?P<day>[{R_CN}]+)】?个自然日"),
        format!("【?(?P<day1>[{R_CN}]+)】?个自然日[^{R_PUNCT}]*?为开放日"),
        format!("每(?:【?(?P<month>[{R_CN}]+)】?个月|季度)最后[1一]个工作日开放"),
        format!("开放日为每(?:【?(?P<month1>[{R_CN}]+)】?个月|季度)第.个?(?:自然)?月的[{R_CN}]+[号日天]"),
        format!("每隔?(?:【?(?P<month2>[{R_CN}]+)】?个月|季度)(?:[至最][多少])?开放[1一]次"),
    ])
    .unwrap();
    static ref P_NO_OPEN_DAY: PatternCollection =
        PatternCollection::compile(["(?:无|不设[置立]?)开放日"]).unwrap();
}

/// 【集合-非股权】raising period ≤ 60 days; 【集合-股权】 ≤ 365 days.
pub fn check_raising_period(ctx: &EvalContext<'_>) -> ResultItem {
    let mut result = base_result(
        ctx,
        "schema_1026",
        "集合计划的募集期限",
        "资产管理计划的募集",
        &["募集期限"],
        &["第五条 ……集合资产管理计划的初始募集期自资产管理计划份额发售之日起不得超过60天，专门投资于未上市企业股权的集合资产管理计划的初始募集期自资产管理计划份额发售之日起不得超过12个月。"],
        &["证券期货经营机构私募资产管理计划运作管理规定（证监会令第203号修订 2023年1月12日）"],
    );
    if !verify_conditions(&[canned::pooled()], ctx.classification) {
        result
            .reasons
            .push(Reason::ignore_condition("当前基金类型不是集合类型".into()));
        return result;
    }
    let answer = ctx.answers.get("募集期限");
    if answer.is_empty() {
        result.is_compliance = false;
        result.reasons.push(Reason::schema_failed("募集期限"));
        result.suggestion = "请补充“募集期限”".into();
        return result;
    }
    let Some(days) = extract_period_days(answer.text()) else {
        result.is_compliance = false;
        result
            .reasons
            .push(Reason::match_failed("未找到管理计划的募集期限".into(), 0, Default::default()));
        result.suggestion = "请在资产管理计划的募集中补充管理计划的募集期限".into();
        return result;
    };
    let threshold = if verify_conditions(&[canned::stock_right_yes()], ctx.classification) {
        365
    } else {
        60
    };
    if days <= threshold {
        result
            .reasons
            .push(Reason::match_success(format!("募集期限未超过{threshold}天")));
    } else {
        result.is_compliance = false;
        result.reasons.push(Reason::match_failed(
            format!("募集期限不应超过{threshold}天"),
            min_page(&answer.outlines),
            answer.outlines.clone(),
        ));
        result.suggestion = format!("请修改募集期限不超过{threshold}天");
    }
    result
}

pub(crate) fn extract_period_days(content: &str) -> Option<i64> {
    let cleaned = clean_txt(content);
    let caps = P_RAISING_PERIOD.captures(&cleaned)?;
    let grab = |name: &str| caps.name(name).and_then(|m| cn_number_to_digit(m.as_str()));
    if let Some(day) = grab("day").or_else(|| grab("day2")) {
        return Some(day);
    }
    if let Some(month) = grab("month").or_else(|| grab("month2")) {
        return Some(month * 30);
    }
    if let Some(year) = grab("year").or_else(|| grab("year2")) {
        return Some(year * 365);
    }
    if let Some(quarter) = grab("quarter").or_else(|| grab("quarter2")) {
        return Some(quarter * 90);
    }
    None
}

/// Minimum subscription amount by plan classification:
/// fixed income 30万, mixed 40万, equities/derivatives 100万,
/// non-standard investment always 100万.
pub fn check_subscribe_amount(ctx: &EvalContext<'_>) -> ResultItem {
    let mut result = base_result(
        ctx,
        "schema_1028",
        "集合计划投资者初始认购金额",
        "资产管理计划的募集",
        &["资产管理计划的最低认购金额和支付方式"],
        &["第三条……合格投资者投资于单只固定收益类资产管理计划的金额不低于30万元，投资于单只混合类资产管理计划的金额不低于40万元，投资于单只权益类、期货和衍生品类资产管理计划的金额不低于100万元。"],
        &["证券期货经营机构私募资产管理计划运作管理规定（证监会令第203号修订 2023年1月12日）"],
    );
    if !verify_conditions(&[canned::pooled()], ctx.classification) {
        result
            .reasons
            .push(Reason::ignore_condition("当前基金类型不是集合类型".into()));
        return result;
    }
    let answer = ctx.answers.get("资产管理计划的最低认购金额和支付方式");
    if answer.is_empty() {
        result.is_compliance = false;
        result
            .reasons
            .push(Reason::schema_failed("资产管理计划的最低认购金额和支付方式"));
        result.suggestion = "请补充“资产管理计划的最低认购金额和支付方式”".into();
        return result;
    }
    let content = P_NUMBER_EXTRA_CHAR.replace_all(answer.text(), "");
    let Some(amount) = extract_subscribe_amount(&content) else {
        result.is_compliance = false;
        result.reasons.push(Reason::match_failed(
            "未找到资产管理计划的最低认购金额".into(),
            min_page(&answer.outlines),
            answer.outlines.clone(),
        ));
        result.suggestion = "请在资产管理计划的募集中补充最低认购金额".into();
        return result;
    };

    let buckets: [(&str, Vec<Condition>); 5] = [
        ("30万", vec![canned::fixed_income(), canned::non_standard_no()]),
        ("100万", vec![canned::fixed_income(), canned::non_standard_yes()]),
        ("40万", vec![canned::mixed_class(), canned::non_standard_no()]),
        ("100万", vec![canned::mixed_class(), canned::non_standard_yes()]),
        ("100万", vec![canned::equities_or_derivatives()]),
    ];
    for (threshold, conditions) in buckets {
        if verify_conditions(&conditions, ctx.classification) {
            let floor = cn_number_to_digit(threshold).unwrap_or(0);
            if amount >= floor {
                result.reasons.push(Reason::match_success(format!(
                    "最低认购金额合规，不低于{threshold}元"
                )));
            } else {
                result.is_compliance = false;
                result.reasons.push(Reason::match_failed(
                    format!("最低认购金额不得低于{threshold}元"),
                    min_page(&answer.outlines),
                    answer.outlines.clone(),
                ));
                result.suggestion = format!("请修改最低认购金额不低于{threshold}元");
            }
            return result;
        }
    }
    result.reasons.push(Reason::ignore_condition(
        "当期基金不是固定收益类、混合类、权益类、期货和衍生品类、非标投资等类型".into(),
    ));
    result
}

pub(crate) fn extract_subscribe_amount(content: &str) -> Option<i64> {
    let cleaned = clean_txt(content);
    let caps = P_SUBSCRIBE_AMOUNT.captures(&cleaned)?;
    cn_number_to_digit(&caps["number"])
}

/// Open-day frequency: at most one open per quarter (X_day ≥ 91 or
/// X_month ≥ 3); closed plans may simply have no open day; otherwise
/// the liquidity-restriction clause must be present.
pub fn check_open_day(ctx: &EvalContext<'_>) -> ResultItem {
    const LIQUIDITY_TEMPLATE: &str =
        "本计划主动投资于流动性受限资产的市值在开放退出期内合计不得超过本计划资产净值的20%";
    let mut result = base_result(
        ctx,
        "schema_1035",
        "集合计划的开放日及其开放频率",
        "资产管理计划的参与、退出与转让",
        &["开放日", "计划投资范围"],
        &["第二十二条 ……开放式集合资产管理计划每三个月至多开放一次计划份额的参与、退出，中国证监会另有规定的除外。"],
        &["证券期货经营机构私募资产管理业务管理办法（证监会令第203号修订2023年1月12日）"],
    );
    if !verify_conditions(&[canned::pooled()], ctx.classification) {
        result
            .reasons
            .push(Reason::ignore_condition("当前基金类型不是集合类型".into()));
        return result;
    }
    let open_day = ctx.answers.get("开放日");
    let content = clean_txt(open_day.text());
    if content.is_empty() || P_NO_OPEN_DAY.is_match(&content) {
        if verify_conditions(&[canned::operate_close()], ctx.classification) {
            return result;
        }
        result.is_compliance = false;
        result
            .reasons
            .push(Reason::match_failed("开放日不能为空".into(), 0, Default::default()));
        result.suggestion = "请添加开放日".into();
        return result;
    }
    if quarter_open_once(&content) {
        return result;
    }
    result.is_compliance = false;
    if verify_conditions(&[canned::non_standard_yes()], ctx.classification) {
        let scope = ctx.answers.get("计划投资范围");
        result.reasons.push(Reason::match_failed(
            "计划投资范围包含非标投资".into(),
            min_page(&scope.outlines),
            scope.outlines.clone(),
        ));
        result.suggestion = "请检查计划投资范围".into();
        return result;
    }
    // more-than-quarterly plans must carry the liquidity restriction
    let paragraphs = ctx.reader.content_paragraphs();
    let options = SimilarityOptions {
        ignore_extra_para: true,
        synonyms: ctx.synonym_patterns(),
        convert_types: ConvertType::all(),
        ..SimilarityOptions::default()
    };
    let similarity = ParagraphSimilarity::new(
        SentenceBlock::from_texts(&[LIQUIDITY_TEMPLATE]),
        SentenceBlock::from_paragraphs(&paragraphs),
        options,
    );
    if similarity.is_full_matched_or_contain() || similarity.is_full_matched_without_extra_para() {
        result.is_compliance = true;
        let outlines = similarity.right_outlines();
        result.reasons.push(Reason::TplMatch {
            template: crate::evaluate::TemplateRef {
                content: similarity.left_content(),
                content_title: "合同范文".into(),
                name: "范文".into(),
            },
            content: similarity.right_content(),
            content_title: "当前合同".into(),
            page: min_page(&outlines),
            xpath: crate::evaluate::reasons::xpath_by_outlines(&outlines),
            outlines,
            diff: similarity.simple_results(),
            source: String::new(),
        });
    } else if similarity.is_matched() {
        let outlines = similarity.right_outlines();
        result.reasons.push(Reason::TplConflict {
            template: crate::evaluate::TemplateRef {
                content: similarity.left_content(),
                content_title: "合同范文".into(),
                name: "范文".into(),
            },
            content: similarity.right_content(),
            content_title: "当前合同".into(),
            page: min_page(&outlines),
            xpath: crate::evaluate::reasons::xpath_by_outlines(&outlines),
            outlines,
            diff: similarity.simple_results(),
            reason_text: String::new(),
            source: String::new(),
        });
        result.suggestion = "请检查投资比例及限制/投资限制".into();
    } else {
        result.reasons.push(Reason::match_failed(
            format!("投资限制需包含“{LIQUIDITY_TEMPLATE}”"),
            0,
            Default::default(),
        ));
        result.suggestion = "请检查投资比例及限制/投资限制".into();
    }
    result
}

pub(crate) fn quarter_open_once(content: &str) -> bool {
    let Some(caps) = P_QUARTER_OPEN_ONCE.captures(content) else {
        return false;
    };
    let grab = |name: &str| caps.name(name).and_then(|m| cn_number_to_digit(m.as_str()));
    if let Some(month) = grab("month").or_else(|| grab("month1")).or_else(|| grab("month2")) {
        return month >= 3;
    }
    if let Some(day) = grab("day").or_else(|| grab("day1")) {
        return day >= 91;
    }
    // the bare 季度 alternatives carry no captured number
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{resolve_classification, ClassifyName, Mold, Tag};
    use crate::document::{Answer, AnswerManager, DocumentBundle, Reader};
    use std::collections::BTreeMap;

    fn context_bundle(answers: &[(&str, &str)]) -> DocumentBundle {
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
            paragraphs: Vec::new(),
            chapters: Vec::new(),
            answers: map,
        }
    }

    fn run<F>(bundle: &DocumentBundle, f: F) -> ResultItem
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
        f(&ctx)
    }

    #[test]
    fn period_extraction_units() {
        assert_eq!(
            extract_period_days("募集期自计划份额发售之日起不超过九十天"),
            Some(90)
        );
        assert_eq!(
            extract_period_days("募集期自计划份额发售之日起不超过3个月"),
            Some(90)
        );
        assert_eq!(
            extract_period_days("募集期自计划份额发售之日起不超过1年"),
            Some(365)
        );
        assert_eq!(extract_period_days("没有相关表述"), None);
    }

    #[test]
    fn raising_period_without_stock_right_fails_over_60() {
        let bundle = context_bundle(&[
            ("计划名称", "XX集合资产管理计划"),
            ("计划投资范围", "债券"),
            ("募集期限", "自基金份额发售之日起不超过九十天"),
        ]);
        let result = run(&bundle, check_raising_period);
        assert!(!result.is_compliance);
        assert!(result
            .reasons
            .iter()
            .any(|r| r.reason_text() == "募集期限不应超过60天"));
    }

    #[test]
    fn raising_period_with_stock_right_passes() {
        let bundle = context_bundle(&[
            ("计划名称", "XX集合资产管理计划"),
            ("计划投资范围", "未上市企业股权"),
            ("募集期限", "自基金份额发售之日起不超过九十天"),
        ]);
        let result = run(&bundle, check_raising_period);
        assert!(result.is_compliance, "reasons: {:?}", result.reasons);
        assert!(result
            .reasons
            .iter()
            .any(|r| r.reason_text() == "募集期限未超过365天"));
    }

    #[test]
    fn non_pooled_plan_is_ignored() {
        let bundle = context_bundle(&[
            ("计划名称", "XX单一资产管理计划"),
            ("募集期限", "自基金份额发售之日起不超过九十天"),
        ]);
        let result = run(&bundle, check_raising_period);
        assert!(result.is_compliance);
        assert!(result.reasons[0].is_ignore());
    }

    #[test]
    fn subscribe_amount_buckets() {
        // fixed income without non-standard investment → 30万 floor
        let bundle = context_bundle(&[
            ("计划名称", "XX集合资产管理计划"),
            ("计划的类别、类型", "固定收益类"),
            ("计划投资范围", "债券"),
            ("资产管理计划的最低认购金额和支付方式", "认购金额应不低于30万元"),
        ]);
        let result = run(&bundle, check_subscribe_amount);
        assert!(result.is_compliance, "reasons: {:?}", result.reasons);

        // same amount with non-standard investment → 100万 floor
        let bundle = context_bundle(&[
            ("计划名称", "XX集合资产管理计划"),
            ("计划的类别、类型", "固定收益类"),
            ("计划投资范围", "信托计划及未上市企业股权"),
            ("资产管理计划的最低认购金额和支付方式", "认购金额应不低于30万元"),
        ]);
        let result = run(&bundle, check_subscribe_amount);
        assert!(!result.is_compliance);
        assert!(result
            .reasons
            .iter()
            .any(|r| r.reason_text() == "最低认购金额不得低于100万元"));
    }

    #[test]
    fn open_day_quarterly_passes() {
        let bundle = context_bundle(&[
            ("计划名称", "XX集合资产管理计划"),
            ("计划投资范围", "债券"),
            ("开放日", "每3个月至多开放1次"),
        ]);
        let result = run(&bundle, check_open_day);
        assert!(result.is_compliance, "reasons: {:?}", result.reasons);
    }

    #[test]
    fn open_day_monthly_without_clause_fails() {
        let bundle = context_bundle(&[
            ("计划名称", "XX集合资产管理计划"),
            ("计划投资范围", "债券"),
            ("开放日", "每1个月开放1次"),
        ]);
        let result = run(&bundle, check_open_day);
        assert!(!result.is_compliance);
    }

    #[test]
    fn quarter_detection() {
        assert!(quarter_open_once("每3个月至多开放1次"));
        assert!(!quarter_open_once("每1个月开放1次"));
        assert!(quarter_open_once("开放日为每季度最后1个工作日开放")
            || quarter_open_once("每季度最后1个工作日开放"));
        assert!(quarter_open_once("开放日为每满91个自然日"));
    }

    #[test]
    fn classification_wiring_for_stock_right() {
        let bundle = context_bundle(&[
            ("计划名称", "XX集合资产管理计划"),
            ("计划投资范围", "未上市企业股权"),
        ]);
        let reader = Reader::new(&bundle);
        let answers = AnswerManager::new(&bundle);
        let classification = resolve_classification(&reader, &answers, bundle.mold);
        assert_eq!(classification.tags(ClassifyName::StockRight), &[Tag::Yes]);
    }
}
