//! The rule evaluator: one rule against one document.
//!
//! Steps: resolve schema fields, rewrite templates into
//! candidates, scope paragraphs by chapter or answer outline, apply
//! content-value checks, run the similarity diff per candidate, pick the
//! winner and emit a typed reason per template, then aggregate the
//! per-template outcomes into a compliance verdict.

use std::collections::HashMap;

use regex::Regex;

use crate::classify::{Classification, Mold};
use crate::condition::{
    compare_value_with_relation, describe_conditions, verify_conditions, ContentType,
    ContentValueRelation, PatternValue,
};
use crate::document::{
    merge_outlines, min_page, outlines_overlap, AnswerManager, Paragraph, Reader,
};
use crate::pattern::{PUBLIC_SYNONYM_PATTERNS, STOCK_SYNONYM_PATTERN};
use crate::similarity::{
    ConvertType, ParagraphSimilarity, SentenceBlock, SimilarityOptions,
};
use crate::template::{
    collect_conditions, expand_candidates, Rule, RewriteContext, SchemaField, Template,
};
use crate::text::clean_txt;

use super::reasons::{Reason, ResultItem, TemplateRef};
use super::suggestion::render_suggestion_by_reasons;

/// Candidates below this weighted ratio are not considered at all.
pub const MIN_RATIO_THRESHOLD: f64 = 0.2;
/// A winner below this ratio may be displaced by a clearly better one.
pub const THRESHOLD: f64 = 0.8;
/// How much better the displacing candidate must be.
pub const DIFFERENCE_THRESHOLD: f64 = 0.2;

/// Read-only evaluation context for one document.
pub struct EvalContext<'a> {
    pub reader: &'a Reader<'a>,
    pub answers: &'a AnswerManager<'a>,
    pub classification: &'a Classification,
    pub mold: Mold,
    pub fid: String,
}

impl<'a> EvalContext<'a> {
    fn rewrite_ctx(&self) -> RewriteContext<'a> {
        RewriteContext {
            reader: self.reader,
            answers: self.answers,
            classification: self.classification,
        }
    }

    /// Synonym classes for this document: the public set, plus the
    /// bourse phrasing class when the investment scope mentions futures.
    pub fn synonym_patterns(&self) -> Vec<Regex> {
        let mut synonyms = PUBLIC_SYNONYM_PATTERNS.clone();
        if self.answers.value("基金投资范围").contains("期货") {
            synonyms.push(STOCK_SYNONYM_PATTERN.clone());
        }
        synonyms
    }
}

/// Evaluate a single rule into its result record.
pub fn evaluate_rule(rule: &Rule, ctx: &EvalContext<'_>) -> ResultItem {
    let mut result = init_result(rule, ctx);

    // S1: filter schema fields whose conditions fail; all filtered out
    // (but some were declared) means the rule does not apply.
    let active_fields: Vec<&SchemaField> = rule
        .schema_fields
        .iter()
        .filter(|field| verify_conditions(&field.conditions, ctx.classification))
        .collect();
    if active_fields.is_empty() && !rule.schema_fields.is_empty() {
        let conditions: Vec<_> = rule
            .schema_fields
            .iter()
            .flat_map(|field| field.conditions.iter().cloned())
            .collect();
        result
            .reasons
            .push(Reason::ignore_condition(describe_conditions(&conditions)));
        return finalize(rule, result, false);
    }

    // S2: missing required answers.
    let mut reasons: Vec<Reason> = active_fields
        .iter()
        .filter(|field| !ctx.answers.has_value(&field.name))
        .map(|field| Reason::schema_failed(&field.name))
        .collect();
    let all_schema_missing = !active_fields.is_empty() && reasons.len() == active_fields.len();

    if all_schema_missing && !rule.required_schema {
        // shown-but-marked-matched
        for reason in &mut reasons {
            if let Reason::SchemaFailed { matched, .. } = reason {
                *matched = true;
            }
        }
        result.reasons = reasons;
        return finalize(rule, result, false);
    }
    if all_schema_missing {
        result.reasons = reasons;
        return finalize(rule, result, false);
    }

    // S3: scope paragraphs by answer outlines when schema fields exist;
    // answers without positional outlines fall back to chapter scoping.
    let scoped = if active_fields.is_empty() {
        None
    } else {
        paragraphs_by_fields(ctx, &active_fields)
    };

    let mut templates_required = Vec::new();
    let mut templates_matched = Vec::new();
    for template in &rule.templates {
        templates_required.push(template.required);
        let reason = match_template(template, ctx, scoped.as_deref());
        if !reason.is_ignore() {
            templates_matched.push(reason.matched());
        }
        reasons.push(reason);
    }

    // A rule misses outright only when no template matched and at least
    // one was required.
    let miss_content = !templates_matched.iter().any(|&m| m)
        && templates_required.iter().any(|&r| r)
        && !templates_matched.is_empty();

    result.reasons = reasons;
    finalize(rule, result, miss_content)
}

fn init_result(rule: &Rule, ctx: &EvalContext<'_>) -> ResultItem {
    let mut fields: Vec<String> = rule
        .schema_fields
        .iter()
        .map(|field| field.name.clone())
        .collect();
    // fields a condition depends on are surfaced too
    for template in &rule.templates {
        for condition in collect_conditions(&template.items) {
            for name in crate::classify::resolver::answer_fields(condition.name, ctx.mold) {
                fields.push((*name).to_string());
            }
        }
    }
    ResultItem {
        label: rule.label.clone(),
        name: rule.name.clone(),
        related_name: rule.related_name.clone(),
        rule_type: rule.rule_type,
        is_compliance: false,
        reasons: Vec::new(),
        suggestion: String::new(),
        fid: ctx.fid.clone(),
        schema_id: None,
        schema_results: ctx.answers.build_schema_results(fields),
        origin_contents: rule.origin_contents(),
        contract_content: rule.contract_content.join("\n"),
        tip: rule.tip.clone(),
    }
}

/// Aggregate reasons into the compliance flag and render the
/// suggestion. A reason set that is entirely ignore markers counts as
/// compliant-by-inapplicability.
fn finalize(rule: &Rule, mut result: ResultItem, miss_content: bool) -> ResultItem {
    dedup_reasons(&mut result.reasons);
    let mut matched = if !result.reasons.is_empty()
        && result.reasons.iter().all(Reason::is_ignore)
    {
        true
    } else {
        result
            .reasons
            .iter()
            .filter(|reason| !reason.is_ignore())
            .any(Reason::matched)
    };
    if miss_content {
        matched = false;
    }
    result.is_compliance = matched;
    if !matched {
        result.suggestion = render_suggestion_by_reasons(&rule.related_name, &result.reasons);
    }
    result
}

/// Collapse duplicate reasons by (kind, reason text, page).
pub fn dedup_reasons(reasons: &mut Vec<Reason>) {
    let mut seen = std::collections::BTreeSet::new();
    reasons.retain(|reason| seen.insert((reason.kind(), reason.reason_text(), reason.page())));
}

/// Scope paragraphs via the outlines of the chosen answers: every
/// paragraph of the chapter containing an answer, excluding the chapter
/// title element itself. `None` when no answer carries outlines at all,
/// so the caller falls back to the template's chapter rule.
fn paragraphs_by_fields<'a>(
    ctx: &EvalContext<'a>,
    fields: &[&SchemaField],
) -> Option<Vec<&'a Paragraph>> {
    let mut collected: Vec<&Paragraph> = Vec::new();
    let mut any_outlined = false;
    for field in fields {
        let answer = ctx.answers.get(&field.name);
        if answer.outlines.is_empty() {
            continue;
        }
        any_outlined = true;
        let anchor = ctx
            .reader
            .paragraphs()
            .iter()
            .find(|p| outlines_overlap(&p.outlines, &answer.outlines));
        let Some(anchor) = anchor else { continue };
        match ctx.reader.chapter_of_paragraph(anchor.index) {
            Some(chapter) => collected
                .extend(ctx.reader.paragraphs_in_range(chapter.range, chapter.element_index)),
            None => collected.push(anchor),
        }
    }
    if !any_outlined {
        return None;
    }
    collected.sort_by_key(|p| p.index);
    collected.dedup_by_key(|p| p.index);
    Some(collected)
}

/// Evaluate one template into one reason.
fn match_template(
    template: &Template,
    ctx: &EvalContext<'_>,
    scoped: Option<&[&Paragraph]>,
) -> Reason {
    // paragraphs: answer scope wins over the chapter rule
    if let Some(scoped) = scoped {
        if scoped.is_empty() {
            return Reason::match_failed(
                "当前规则对应的要素答案未找到对应内容".to_string(),
                0,
                crate::document::Outlines::new(),
            );
        }
    }
    let (chapter_found, paragraphs): (bool, Vec<&Paragraph>) = match scoped {
        Some(paragraphs) => (true, paragraphs.to_vec()),
        _ => match &template.chapter {
            Some(chapter) => {
                let (found, paragraphs) = ctx.reader.find_paragraphs_by_rule(chapter);
                (!found.is_empty(), paragraphs)
            }
            None => (true, ctx.reader.content_paragraphs()),
        },
    };

    // S4: rewrite into candidates
    let rewrite_ctx = ctx.rewrite_ctx();
    let candidates = expand_candidates(&template.items, &rewrite_ctx, &paragraphs);
    if candidates.is_empty() {
        let conditions = collect_conditions(&template.items);
        return Reason::ignore_condition(describe_conditions(&conditions));
    }
    let template_ref = |content: String| TemplateRef {
        content,
        content_title: template.content_title.clone(),
        name: template.name.label().to_string(),
    };
    let origin_content = candidates[0].join("\n");

    if paragraphs.is_empty() {
        if let Some(chapter) = &template.chapter {
            if !chapter_found {
                let mut reason = Reason::miss_content(
                    &chapter.miss_reason,
                    &chapter.miss_content,
                    !template.required,
                );
                if let Reason::TplMissContent {
                    template: slot, ..
                } = &mut reason
                {
                    *slot = Some(template_ref(origin_content.clone()));
                }
                return reason;
            }
        }
        return Reason::no_match(template_ref(origin_content), !template.required);
    }

    // S5: content-value checks
    let (errors, candidates) = check_content_value(template, ctx, &paragraphs, candidates);
    if !errors.is_empty() && errors.iter().all(|errs| !errs.is_empty()) {
        let outlines = merge_outlines(paragraphs.iter().copied());
        let mut unique = errors[0].clone();
        unique.sort();
        unique.dedup();
        return Reason::match_failed(unique.join("；\n"), min_page(&outlines), outlines);
    }

    // S6: similarity per candidate, winner selection
    let synonyms = ctx.synonym_patterns();
    let right_blocks = SentenceBlock::from_paragraphs(&paragraphs);
    let mut runs: Vec<(usize, ParagraphSimilarity)> = Vec::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        let options = SimilarityOptions {
            min_ratio: template.min_ratio,
            ignore_numbering: true,
            fill_paragraph: false,
            ignore_extra_para: template.ignore_extra_para,
            split_sentence: template.split_sentence,
            synonyms: synonyms.clone(),
            convert_types: ConvertType::all(),
        };
        let similarity = ParagraphSimilarity::new(
            SentenceBlock::from_texts(candidate),
            right_blocks.clone(),
            options,
        );
        if similarity.max_ratio() > MIN_RATIO_THRESHOLD {
            runs.push((idx, similarity));
        }
    }

    let winner = select_winner(&runs);
    if let Some(pos) = winner {
        let (candidate_idx, similarity) = &runs[pos];
        if let Some(errs) = errors.get(*candidate_idx) {
            if !errs.is_empty() {
                let outlines = merge_outlines(paragraphs.iter().copied());
                let mut unique = errs.clone();
                unique.sort();
                unique.dedup();
                return Reason::match_failed(unique.join("；\n"), min_page(&outlines), outlines);
            }
        }
        let outlines = similarity.right_outlines();
        if similarity.is_full_matched_or_contain()
            || similarity.is_full_matched_without_extra_para()
        {
            return Reason::TplMatch {
                template: template_ref(similarity.left_content()),
                content: similarity.right_content(),
                content_title: "当前合同".to_string(),
                page: min_page(&outlines),
                xpath: super::reasons::xpath_by_outlines(&outlines),
                outlines,
                diff: similarity.simple_results(),
                source: template.source.clone(),
            };
        }
        if similarity.is_matched() {
            return Reason::TplConflict {
                template: template_ref(similarity.left_content()),
                content: similarity.right_content(),
                content_title: "当前合同".to_string(),
                page: min_page(&outlines),
                xpath: super::reasons::xpath_by_outlines(&outlines),
                outlines,
                diff: similarity.simple_results(),
                reason_text: template.diff_text.clone().unwrap_or_default(),
                source: template.source.clone(),
            };
        }
    }

    // S7 fallthrough: nothing matched; show the first error-free
    // candidate as the reference
    let shown = errors
        .iter()
        .zip(candidates.iter())
        .find(|(errs, _)| errs.is_empty())
        .map(|(_, candidate)| candidate.join("\n"))
        .unwrap_or(origin_content);
    Reason::no_match(template_ref(shown), !template.required)
}

/// Evaluate a rule of the single-sentence-multiple family: the template
/// is expected to occur once per qualifying paragraph, so the diff is
/// judged per document paragraph instead of over the whole scope. Any
/// fully matched occurrence makes the rule compliant.
pub fn evaluate_sentence_multiple_rule(rule: &Rule, ctx: &EvalContext<'_>) -> ResultItem {
    let mut result = init_result(rule, ctx);
    let mut reasons: Vec<Reason> = Vec::new();
    let mut any_full = false;
    let mut match_reasons: Vec<Reason> = Vec::new();

    for template in &rule.templates {
        let (chapter_found, paragraphs) = match &template.chapter {
            Some(chapter) => {
                let (found, paragraphs) = ctx.reader.find_paragraphs_by_rule(chapter);
                (!found.is_empty(), paragraphs)
            }
            None => (true, ctx.reader.content_paragraphs()),
        };
        if paragraphs.is_empty() {
            if let Some(chapter) = &template.chapter {
                if !chapter_found {
                    reasons.push(Reason::miss_content(
                        &chapter.miss_reason,
                        &chapter.miss_content,
                        false,
                    ));
                    continue;
                }
            }
        }

        let rewrite_ctx = ctx.rewrite_ctx();
        let candidates = expand_candidates(&template.items, &rewrite_ctx, &paragraphs);
        if candidates.is_empty() {
            let conditions = collect_conditions(&template.items);
            reasons.push(Reason::ignore_condition(describe_conditions(&conditions)));
            continue;
        }
        let (errors, candidates) = check_content_value(template, ctx, &paragraphs, candidates);
        if !errors.is_empty() && errors.iter().all(|errs| !errs.is_empty()) {
            let outlines = merge_outlines(paragraphs.iter().copied());
            let mut unique = errors[0].clone();
            unique.sort();
            unique.dedup();
            reasons.push(Reason::match_failed(
                unique.join("；\n"),
                min_page(&outlines),
                outlines,
            ));
            continue;
        }

        let synonyms = ctx.synonym_patterns();
        let right_blocks = SentenceBlock::from_paragraphs(&paragraphs);
        let template_ref = |content: String| TemplateRef {
            content,
            content_title: template.content_title.clone(),
            name: template.name.label().to_string(),
        };
        let mut found_any = false;
        for candidate in &candidates {
            let options = SimilarityOptions {
                min_ratio: template.min_ratio,
                ignore_numbering: true,
                fill_paragraph: false,
                ignore_extra_para: false,
                split_sentence: template.split_sentence,
                synonyms: synonyms.clone(),
                convert_types: ConvertType::all(),
            };
            let similarity = ParagraphSimilarity::new(
                SentenceBlock::from_texts(candidate),
                right_blocks.clone(),
                options,
            );
            for (_, rows) in similarity.results_by_paragraph() {
                let matched_rows: Vec<_> = rows
                    .iter()
                    .filter(|row| row.left.is_some() && row.right.is_some())
                    .cloned()
                    .collect();
                if matched_rows.is_empty() {
                    continue;
                }
                found_any = true;
                let (left, right, outlines) = similarity.group_contents(&matched_rows);
                if crate::similarity::judge_is_full_matched(&matched_rows) {
                    any_full = true;
                    match_reasons.push(Reason::TplMatch {
                        template: template_ref(left),
                        content: right,
                        content_title: "当前合同".to_string(),
                        page: min_page(&outlines),
                        xpath: super::reasons::xpath_by_outlines(&outlines),
                        outlines,
                        diff: similarity.simple_results(),
                        source: template.source.clone(),
                    });
                } else {
                    reasons.push(Reason::TplConflict {
                        template: template_ref(left),
                        content: right,
                        content_title: "当前合同".to_string(),
                        page: min_page(&outlines),
                        xpath: super::reasons::xpath_by_outlines(&outlines),
                        outlines,
                        diff: similarity.simple_results(),
                        reason_text: template.diff_text.clone().unwrap_or_default(),
                        source: template.source.clone(),
                    });
                }
            }
            if found_any {
                break;
            }
        }
        if !found_any {
            reasons.push(Reason::no_match(
                template_ref(candidates[0].join("\n")),
                !template.required,
            ));
        }
    }

    // any full occurrence wins and only the matches are reported
    if any_full {
        result.reasons = match_reasons;
        result.is_compliance = true;
        return result;
    }
    reasons.extend(match_reasons);
    result.reasons = reasons;
    finalize(rule, result, false)
}

/// Winner selection: most matched sentences, then highest ratio; a
/// higher-ratio candidate displaces the winner only when it is clearly
/// better and the winner is weak.
fn select_winner(runs: &[(usize, ParagraphSimilarity)]) -> Option<usize> {
    if runs.is_empty() {
        return None;
    }
    let max_count = runs
        .iter()
        .map(|(_, s)| s.valid_sentences_count())
        .max()
        .unwrap_or(0);
    let by_count = runs
        .iter()
        .enumerate()
        .filter(|(_, (_, s))| s.valid_sentences_count() == max_count)
        .max_by(|(_, (_, a)), (_, (_, b))| {
            a.max_ratio()
                .partial_cmp(&b.max_ratio())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(pos, _)| pos)?;
    let by_ratio = runs
        .iter()
        .enumerate()
        .max_by(|(_, (_, a)), (_, (_, b))| {
            a.max_ratio()
                .partial_cmp(&b.max_ratio())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(pos, _)| pos)?;
    if by_ratio != by_count {
        let count_ratio = runs[by_count].1.max_ratio();
        let ratio_ratio = runs[by_ratio].1.max_ratio();
        if ratio_ratio - count_ratio > DIFFERENCE_THRESHOLD && count_ratio < THRESHOLD {
            return Some(by_ratio);
        }
    }
    Some(by_count)
}

/// Content-value verification: extract each pattern value,
/// disambiguate multiple hits toward the single-hit reference, evaluate
/// each check's rule groups, and substitute resolved values into the
/// candidates. Unresolved keys substitute verbatim and carry a
/// "请补充" reason.
fn check_content_value(
    template: &Template,
    ctx: &EvalContext<'_>,
    paragraphs: &[&Paragraph],
    candidates: Vec<Vec<String>>,
) -> (Vec<Vec<String>>, Vec<Vec<String>>) {
    let Some(relation) = &template.content_condition else {
        return (Vec::new(), candidates);
    };
    let extracted = extract_content_values(relation, paragraphs);

    let mut reason_map: HashMap<String, Vec<String>> = HashMap::new();
    for check in &relation.conditions {
        let Some(value) = extracted.get(&check.key).cloned().flatten() else {
            reason_map
                .entry(check.key.clone())
                .or_default()
                .push(format!("请补充{}", check.name));
            continue;
        };
        let value = fix_percentage_unit(&value, check.content_type);

        let valid_keys: Vec<&str> = check
            .valid_keys
            .iter()
            .filter(|(_, conditions)| verify_conditions(conditions, ctx.classification))
            .map(|(key, _)| key.as_str())
            .collect();

        let mut check_reasons: Vec<String> = Vec::new();
        for group in &check.rules {
            let mut active = 0usize;
            let mut failed: Vec<(&crate::condition::ContentRule, Option<String>)> = Vec::new();
            for entry in group {
                if !check.valid_keys.is_empty() && !valid_keys.contains(&entry.ref_key.as_str()) {
                    continue;
                }
                active += 1;
                let reference = extracted.get(&entry.ref_key).cloned().flatten();
                match reference {
                    Some(reference) => {
                        let reference = fix_percentage_unit(&reference, check.content_type);
                        if !compare_value_with_relation(
                            &value,
                            &reference,
                            entry.relation,
                            check.content_type,
                        ) {
                            failed.push((entry, Some(reference)));
                        }
                    }
                    None => failed.push((entry, None)),
                }
            }
            if active > 0 && failed.len() == active {
                let mut parts = Vec::new();
                for (entry, reference) in failed {
                    match reference {
                        Some(reference) => {
                            let target = if entry.label.is_empty() {
                                reference
                            } else {
                                entry.label.clone()
                            };
                            parts.push(format!("{}{target}", entry.relation.label()));
                        }
                        None => check_reasons.push(format!("请补充{}", entry.label)),
                    }
                }
                if !parts.is_empty() {
                    check_reasons.push(format!("{}应{}", check.name, parts.join("或")));
                }
            }
        }
        if !check_reasons.is_empty() {
            reason_map
                .entry(check.key.clone())
                .or_default()
                .push(check_reasons.join("且"));
        }
    }

    // substitutions: resolved value, or the key itself verbatim
    let mut errors = Vec::with_capacity(candidates.len());
    let mut corrected = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let mut candidate_errors: Vec<String> = Vec::new();
        for (key, texts) in reason_map.iter() {
            let slot = format!("{{{key}}}");
            if candidate.iter().any(|text| text.contains(&slot)) {
                candidate_errors.extend(texts.iter().cloned());
            }
        }
        let rewritten: Vec<String> = candidate
            .iter()
            .map(|text| {
                let mut text = text.clone();
                for (key, value) in &extracted {
                    let slot = format!("{{{key}}}");
                    if !text.contains(&slot) {
                        continue;
                    }
                    let replacement = value.clone().unwrap_or_else(|| key.clone());
                    text = text.replace(&slot, &replacement);
                }
                text
            })
            .collect();
        errors.push(candidate_errors);
        corrected.push(rewritten);
    }
    (errors, corrected)
}

/// Extract every named pattern value from the scope, preferring the hit
/// closest to a single-hit reference when several paragraphs match.
fn extract_content_values(
    relation: &ContentValueRelation,
    paragraphs: &[&Paragraph],
) -> HashMap<String, Option<String>> {
    let mut extracted: HashMap<String, Option<String>> = HashMap::new();
    let mut refer_index: Option<usize> = None;
    for (key, value) in &relation.patterns {
        match value {
            PatternValue::Const(constant) => {
                extracted.insert(key.clone(), Some(constant.to_string()));
            }
            PatternValue::Patterns(patterns) => {
                let mut hits: Vec<(usize, String)> = Vec::new();
                for paragraph in paragraphs.iter().filter(|p| p.is_paragraph()) {
                    let content = clean_txt(&paragraph.text);
                    let Some(caps) = patterns.captures(&content) else {
                        continue;
                    };
                    let value = caps
                        .name("val")
                        .map(|m| m.as_str().to_string())
                        .or_else(|| caps.get(0).map(|m| m.as_str().to_string()));
                    if let Some(value) = value {
                        hits.push((paragraph.index, value));
                    }
                }
                if hits.is_empty() {
                    extracted.insert(key.clone(), None);
                    continue;
                }
                if hits.len() == 1 && refer_index.is_none() {
                    refer_index = Some(hits[0].0);
                }
                let chosen = match (hits.len() > 1, refer_index) {
                    (true, Some(reference)) => hits
                        .iter()
                        .min_by_key(|(index, _)| index.abs_diff(reference))
                        .cloned(),
                    _ => hits.first().cloned(),
                };
                extracted.insert(key.clone(), chosen.map(|(_, value)| value));
            }
        }
    }
    extracted
}

/// A bare number in percentage context means percent.
fn fix_percentage_unit(value: &str, content_type: ContentType) -> String {
    if content_type == ContentType::Percentage
        && !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == '.' || ch == '．')
        && !value.contains('.')
    {
        return format!("{value}%");
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::resolve_classification;
    use crate::document::{Answer, DocumentBundle, Outlines, ParagraphKind};
    use crate::template::{RuleFamily, TemplateItem, TemplateName};
    use std::collections::BTreeMap;

    fn paragraph(index: usize, text: &str) -> Paragraph {
        Paragraph {
            index,
            page: 1,
            text: text.to_string(),
            kind: ParagraphKind::Paragraph,
            rows: Vec::new(),
            fragment: false,
            outlines: Outlines::new(),
        }
    }

    fn bundle(paragraphs: Vec<Paragraph>, answers: &[(&str, &str)]) -> DocumentBundle {
        let mut map = BTreeMap::new();
        for (field, value) in answers {
            map.insert(
                field.to_string(),
                Answer {
                    value: Some(value.to_string()),
                    outlines: Outlines::new(),
                },
            );
        }
        DocumentBundle {
            fid: "doc-1".into(),
            mold: Mold::PublicFund,
            paragraphs,
            chapters: Vec::new(),
            answers: map,
        }
    }

    fn evaluate(bundle: &DocumentBundle, rule: &Rule) -> ResultItem {
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
        evaluate_rule(rule, &ctx)
    }

    fn simple_rule(text: &str) -> Rule {
        let mut rule = Rule::new("template_1", "测试规则", "测试章节");
        rule.family = RuleFamily::NormalCondition;
        rule.templates = vec![Template::new(
            TemplateName::Editing,
            vec![TemplateItem::leaf(text)],
        )];
        rule
    }

    #[test]
    fn full_match_is_compliant() {
        let bundle = bundle(
            vec![paragraph(0, "基金托管人应当安全保管基金财产。")],
            &[],
        );
        let rule = simple_rule("基金托管人应当安全保管基金财产。");
        let result = evaluate(&bundle, &rule);
        assert!(result.is_compliance);
        assert!(matches!(result.reasons[0], Reason::TplMatch { .. }));
    }

    #[test]
    fn near_match_is_conflict() {
        let bundle = bundle(
            vec![paragraph(
                0,
                "基金份额持有人大会应当由三十名持有人参加表决。",
            )],
            &[],
        );
        let rule = simple_rule("基金份额持有人大会应当由五十名持有人参加表决。");
        let result = evaluate(&bundle, &rule);
        assert!(!result.is_compliance);
        assert!(matches!(result.reasons[0], Reason::TplConflict { .. }));
        assert!(!result.suggestion.is_empty());
    }

    #[test]
    fn absent_text_is_no_match() {
        let bundle = bundle(vec![paragraph(0, "完全无关的内容。")], &[]);
        let rule = simple_rule("基金托管人应当安全保管基金财产，并开设独立账户。");
        let result = evaluate(&bundle, &rule);
        assert!(!result.is_compliance);
        assert!(matches!(
            result.reasons[0],
            Reason::TplNoMatch { matched: false, .. }
        ));
    }

    #[test]
    fn missing_chapter_is_miss_content() {
        use crate::chapters::{ChapterRule, FUND_INVEST};
        let bundle = bundle(vec![paragraph(0, "文档里没有投资章节。")], &[]);
        let mut rule = simple_rule("投资范围包括股票与债券。");
        rule.templates[0].chapter = Some(ChapterRule::of(&[&FUND_INVEST]));
        let result = evaluate(&bundle, &rule);
        assert!(!result.is_compliance);
        let Reason::TplMissContent { reason_text, .. } = &result.reasons[0] else {
            panic!("expected miss content, got {:?}", result.reasons[0]);
        };
        assert_eq!(reason_text, "章节《基金的投资》不存在");
    }

    #[test]
    fn failed_schema_field_reports_and_blocks() {
        let bundle = bundle(vec![paragraph(0, "内容")], &[]);
        let mut rule = simple_rule("模板内容。");
        rule.schema_fields = vec![SchemaField::plain("募集期限")];
        let result = evaluate(&bundle, &rule);
        assert!(!result.is_compliance);
        assert!(matches!(
            result.reasons[0],
            Reason::SchemaFailed { matched: false, .. }
        ));
        assert!(result.suggestion.contains("募集期限"));
    }

    #[test]
    fn optional_schema_marks_missing_as_matched() {
        let bundle = bundle(vec![paragraph(0, "内容")], &[]);
        let mut rule = simple_rule("模板内容。");
        rule.schema_fields = vec![SchemaField::plain("募集期限")];
        rule.required_schema = false;
        let result = evaluate(&bundle, &rule);
        assert!(result.is_compliance);
        assert!(matches!(
            result.reasons[0],
            Reason::SchemaFailed { matched: true, .. }
        ));
    }

    #[test]
    fn unsatisfied_field_conditions_are_ignored() {
        let bundle = bundle(vec![paragraph(0, "内容")], &[]);
        let mut rule = simple_rule("模板内容。");
        rule.schema_fields = vec![SchemaField::when(
            "募集期限",
            vec![crate::condition::canned::pooled()],
        )];
        let result = evaluate(&bundle, &rule);
        assert!(result.is_compliance);
        assert_eq!(result.is_compliance_real(), None);
        assert!(matches!(
            result.reasons[0],
            Reason::TplIgnoreCondition { .. }
        ));
    }

    #[test]
    fn gated_template_ignores_when_conditions_fail() {
        let bundle = bundle(vec![paragraph(0, "内容")], &[]);
        let mut rule = simple_rule("unused");
        rule.templates = vec![Template::new(
            TemplateName::Editing,
            vec![TemplateItem::gated(
                vec![crate::condition::canned::pooled()],
                vec![TemplateItem::leaf("集合限定内容。")],
            )],
        )];
        let result = evaluate(&bundle, &rule);
        assert!(result.is_compliance);
        assert!(result.reasons.iter().all(Reason::is_ignore));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let bundle = bundle(
            vec![
                paragraph(0, "第一段内容。"),
                paragraph(1, "基金托管人应当安全保管基金财产。"),
            ],
            &[("基金名称", "XX债券型证券投资基金")],
        );
        let rule = simple_rule("基金托管人应当安全保管基金财产。");
        let first = evaluate(&bundle, &rule);
        let second = evaluate(&bundle, &rule);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn content_value_failure_is_match_failed() {
        use crate::condition::content::payment_of_redemption;
        let bundle = bundle(
            vec![paragraph(0, "基金管理人应在T+9日内支付赎回款项。")],
            &[],
        );
        let mut rule = simple_rule("基金管理人应在T+{X}日内支付赎回款项。");
        rule.templates[0].content_condition = Some(payment_of_redemption());
        let result = evaluate(&bundle, &rule);
        assert!(!result.is_compliance);
        let Reason::TplFailed { reason_text, .. } = &result.reasons[0] else {
            panic!("expected match failed, got {:?}", result.reasons[0]);
        };
        assert!(reason_text.contains("支付赎回款项时间应小于等于7"));
    }

    #[test]
    fn content_value_substitutes_into_template() {
        use crate::condition::content::payment_of_redemption;
        let bundle = bundle(
            vec![paragraph(0, "基金管理人应在T+3日内支付赎回款项。")],
            &[],
        );
        let mut rule = simple_rule("基金管理人应在T+{X}日内支付赎回款项。");
        rule.templates[0].content_condition = Some(payment_of_redemption());
        let result = evaluate(&bundle, &rule);
        assert!(result.is_compliance, "reasons: {:?}", result.reasons);
        assert!(matches!(result.reasons[0], Reason::TplMatch { .. }));
    }
}
