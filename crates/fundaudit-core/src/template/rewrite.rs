//! Template rewriting: expand a template AST into concrete candidate
//! paragraph lists against one document.
//!
//! Candidates are built slot-by-slot (each slot is a list of acceptable
//! phrasings of one paragraph) and recombined as a cartesian product.
//! Rewrite-typed nodes compute a `{KEY}` substitution map from the bound
//! document paragraphs before their own items expand. Given the same
//! document and classification the expansion is deterministic.

use std::collections::HashMap;

use tracing::error;

use crate::classify::{Classification, Tag};
use crate::condition::{verify_conditions, Condition};
use crate::document::{AnswerManager, Paragraph, Reader};
use crate::numeric::{cn_number_to_digit, is_increment};
use crate::pattern::{P_EXCLUDE_SENTENCE, P_LINK_SENTENCE, P_REPLACE_KEY, P_SERIAL_NUM};
use crate::text::clean_txt;

use super::{RewriteKind, RewriteNode, RewriteRule, TemplateItem};

/// Everything a rewrite needs to see of the document.
pub struct RewriteContext<'a> {
    pub reader: &'a Reader<'a>,
    pub answers: &'a AnswerManager<'a>,
    pub classification: &'a Classification,
}

/// A `{KEY}` substitution value: one string, or alternatives that fork
/// the candidate set.
#[derive(Debug, Clone)]
enum FormatValue {
    One(String),
    Many(Vec<String>),
}

/// Expand template items into candidate paragraph lists. Every candidate
/// is one acceptable phrasing of the full template; blank paragraphs are
/// dropped from each candidate.
pub fn expand_candidates(
    items: &[TemplateItem],
    ctx: &RewriteContext<'_>,
    paragraphs: &[&Paragraph],
) -> Vec<Vec<String>> {
    let slots = split_items(items, ctx, paragraphs);
    cartesian(&slots)
        .into_iter()
        .map(|candidate| {
            candidate
                .into_iter()
                .filter(|text| !text.trim().is_empty())
                .collect::<Vec<String>>()
        })
        .filter(|candidate| !candidate.is_empty())
        .collect()
}

/// Conditions attached to the top level of `items`, used to render the
/// IgnoreCondition reason when nothing expanded. `single_optional`
/// branch conditions merge, since the branches are alternatives of one
/// block.
pub fn collect_conditions(items: &[TemplateItem]) -> Vec<Condition> {
    let mut conditions = Vec::new();
    for item in items {
        match item {
            TemplateItem::Gated {
                conditions: gate, ..
            } => conditions.extend(gate.iter().cloned()),
            TemplateItem::SingleOptional(branches) => {
                for branch in branches {
                    conditions.extend(branch.conditions.iter().cloned());
                }
            }
            _ => {}
        }
    }
    conditions
}

fn split_items(
    items: &[TemplateItem],
    ctx: &RewriteContext<'_>,
    paragraphs: &[&Paragraph],
) -> Vec<Vec<String>> {
    let mut slots = Vec::new();
    for item in items {
        slots.extend(split_item(item, ctx, paragraphs));
    }
    slots
}

fn split_item(
    item: &TemplateItem,
    ctx: &RewriteContext<'_>,
    paragraphs: &[&Paragraph],
) -> Vec<Vec<String>> {
    match item {
        TemplateItem::Leaf(text) => vec![vec![text.clone()]],
        TemplateItem::Alt(alternatives) => vec![alternatives.clone()],
        TemplateItem::Gated { conditions, items } => {
            if verify_conditions(conditions, ctx.classification) {
                split_items(items, ctx, paragraphs)
            } else {
                Vec::new()
            }
        }
        TemplateItem::SingleOptional(branches) => {
            for branch in branches {
                if verify_conditions(&branch.conditions, ctx.classification) {
                    return split_items(&branch.items, ctx, paragraphs);
                }
            }
            Vec::new()
        }
        TemplateItem::Rewrite(node) => apply_rewrite(node, ctx, paragraphs),
    }
}

fn cartesian(slots: &[Vec<String>]) -> Vec<Vec<String>> {
    if slots.is_empty() {
        return Vec::new();
    }
    let mut candidates: Vec<Vec<String>> = vec![Vec::new()];
    for slot in slots {
        if slot.is_empty() {
            continue;
        }
        let mut next = Vec::with_capacity(candidates.len() * slot.len());
        for candidate in &candidates {
            for alternative in slot {
                let mut extended = candidate.clone();
                extended.push(alternative.clone());
                next.push(extended);
            }
        }
        candidates = next;
    }
    candidates
}

// ---------------------------------------------------------------------
// rewrite dispatch
// ---------------------------------------------------------------------

fn apply_rewrite(
    node: &RewriteNode,
    ctx: &RewriteContext<'_>,
    paragraphs: &[&Paragraph],
) -> Vec<Vec<String>> {
    match node.kind {
        RewriteKind::InnerReplace => inner_replace(node, ctx, paragraphs),
        RewriteKind::InnerRecombination => inner_recombination(node, ctx, paragraphs),
        RewriteKind::Recombination => recombination(node, ctx, paragraphs, false),
        RewriteKind::ChapterCombination => recombination(node, ctx, paragraphs, true),
        RewriteKind::InnerRefer => inner_refer(node, ctx, paragraphs),
        RewriteKind::SingleSelect => single_select(node, ctx, paragraphs),
    }
}

fn formatted_item_slots(
    node: &RewriteNode,
    ctx: &RewriteContext<'_>,
    paragraphs: &[&Paragraph],
    format: &HashMap<String, FormatValue>,
) -> Vec<Vec<String>> {
    split_items(&node.items, ctx, paragraphs)
        .into_iter()
        .map(|slot| {
            slot.iter()
                .flat_map(|alternative| format_with(alternative, format))
                .collect()
        })
        .collect()
}

/// Substitute `{KEY}` slots. Unknown keys stay verbatim; `Many` values
/// fork one output string per alternative.
fn format_with(template: &str, format: &HashMap<String, FormatValue>) -> Vec<String> {
    let mut keys: Vec<String> = P_REPLACE_KEY
        .find_all(template)
        .iter()
        .filter_map(|m| {
            P_REPLACE_KEY
                .captures(&template[m.start()..m.end()])
                .map(|caps| caps["key"].to_string())
        })
        .collect();
    keys.sort();
    keys.dedup();
    if keys.is_empty() {
        return vec![template.to_string()];
    }
    let mut outputs = vec![template.to_string()];
    for key in keys {
        let values: Vec<String> = match format.get(&key) {
            Some(FormatValue::One(value)) => vec![value.clone()],
            Some(FormatValue::Many(values)) => values.clone(),
            None => continue,
        };
        let slot = format!("{{{key}}}");
        let mut next = Vec::with_capacity(outputs.len() * values.len());
        for output in &outputs {
            for value in &values {
                next.push(output.replace(&slot, value));
            }
        }
        outputs = next;
    }
    outputs
}

// ---------------------------------------------------------------------
// INNER_REPLACE
// ---------------------------------------------------------------------

/// Attribute-function dispatch table. An unknown function name logs an
/// error and substitutes "***" so the rule keeps evaluating.
fn dispatch_attr(func: &str, ctx: &RewriteContext<'_>) -> Option<Option<String>> {
    let nonempty = |value: &str| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    };
    Some(match func {
        "get_fund_bourse_name" => {
            let tags = ctx
                .classification
                .tags(crate::classify::ClassifyName::StockBourse);
            if tags.contains(&Tag::Shanghai) {
                Some("上海".to_string())
            } else if tags.contains(&Tag::Shenzhen) {
                Some("深圳".to_string())
            } else {
                None
            }
        }
        "get_fund_name" => nonempty(ctx.answers.value("基金名称")),
        "get_manager_name" => nonempty(ctx.answers.value("基金管理人-名称")),
        "get_trustee_name" => nonempty(ctx.answers.value("基金托管人-名称")),
        "get_plan_name" => nonempty(ctx.answers.value("计划名称")),
        _ => return None,
    })
}

fn inner_replace(
    node: &RewriteNode,
    ctx: &RewriteContext<'_>,
    paragraphs: &[&Paragraph],
) -> Vec<Vec<String>> {
    let mut format = HashMap::new();
    for (key, rule) in &node.rules {
        let RewriteRule::Replace { func, default } = rule else {
            continue;
        };
        let value = match dispatch_attr(func, ctx) {
            Some(Some(value)) => value,
            Some(None) => default.clone(),
            None => {
                error!(func = %func, "attribute dispatch has no such function");
                "***".to_string()
            }
        };
        format.insert(key.clone(), FormatValue::One(value));
    }
    formatted_item_slots(node, ctx, paragraphs, &format)
}

// ---------------------------------------------------------------------
// INNER_RECOMBINATION
// ---------------------------------------------------------------------

fn inner_recombination(
    node: &RewriteNode,
    ctx: &RewriteContext<'_>,
    paragraphs: &[&Paragraph],
) -> Vec<Vec<String>> {
    let mut format = HashMap::new();
    for (key, rule) in &node.rules {
        let RewriteRule::Recombine {
            para_pattern,
            entries,
            exclude_patterns,
            default,
        } = rule
        else {
            continue;
        };
        let mut best: Option<(Vec<(usize, String, String)>, Vec<String>)> = None;
        for paragraph in paragraphs.iter().filter(|p| p.is_paragraph()) {
            let content = clean_txt(&paragraph.text);
            let Some(caps) = para_pattern.captures(&content) else {
                continue;
            };
            let matched = caps
                .name("content")
                .map(|m| m.as_str())
                .unwrap_or_else(|| caps.get(0).map(|m| m.as_str()).unwrap_or(""));

            let pieces = split_by_links(matched, exclude_patterns.as_ref());
            let mut hits: Vec<(usize, String, String)> = Vec::new();
            let mut missing: Vec<String> = Vec::new();
            for entry in entries {
                if !verify_conditions(&entry.conditions, ctx.classification) {
                    continue;
                }
                match pieces
                    .iter()
                    .position(|(piece, _)| entry.pattern.is_match(piece))
                {
                    Some(idx) => {
                        hits.push((idx, entry.value.clone(), pieces[idx].1.clone()))
                    }
                    None if entry.required => missing.push(entry.value.clone()),
                    None => {}
                }
            }
            let better = best
                .as_ref()
                .map(|(_, best_missing)| missing.len() < best_missing.len())
                .unwrap_or(true);
            if better {
                best = Some((hits, missing));
            }
        }

        let value = match best {
            Some((mut hits, missing)) if !hits.is_empty() || !missing.is_empty() => {
                hits.sort_by_key(|(idx, _, _)| *idx);
                let mut parts: Vec<String> = Vec::new();
                for (_, value, linker) in hits {
                    parts.push(value);
                    parts.push(linker);
                }
                parts.pop();
                let mut joined: String = parts.concat();
                if !missing.is_empty() {
                    if joined.is_empty() {
                        joined = missing.join("、");
                    } else {
                        joined = format!("{joined}、{}", missing.join("、"));
                    }
                }
                if joined.is_empty() {
                    default.clone()
                } else {
                    joined
                }
            }
            _ => default.clone(),
        };
        format.insert(key.clone(), FormatValue::One(value));
    }
    formatted_item_slots(node, ctx, paragraphs, &format)
}

/// Split a clause at conjunction tokens, keeping the linker observed
/// after each piece. Tokens inside bracketed spans (or spans matched by
/// the rule's own exclude patterns) never split.
fn split_by_links(
    content: &str,
    exclude: Option<&crate::pattern::PatternCollection>,
) -> Vec<(String, String)> {
    let mut excluded: Vec<(usize, usize)> = P_EXCLUDE_SENTENCE
        .find_all(content)
        .iter()
        .map(|m| (m.start(), m.end()))
        .collect();
    if let Some(exclude) = exclude {
        excluded.extend(exclude.find_all(content).iter().map(|m| (m.start(), m.end())));
    }
    let in_excluded =
        |pos: usize| excluded.iter().any(|(start, end)| pos >= *start && pos < *end);

    let mut pieces = Vec::new();
    let mut prev = 0;
    for matched in P_LINK_SENTENCE.find_all(content) {
        if in_excluded(matched.start()) {
            continue;
        }
        pieces.push((
            content[prev..matched.start()].to_string(),
            matched.as_str().to_string(),
        ));
        prev = matched.end();
    }
    if prev < content.len() {
        pieces.push((content[prev..].to_string(), String::new()));
    }
    pieces
}

// ---------------------------------------------------------------------
// RECOMBINATION / CHAPTER_COMBINATION
// ---------------------------------------------------------------------

fn recombination(
    node: &RewriteNode,
    ctx: &RewriteContext<'_>,
    paragraphs: &[&Paragraph],
    with_children: bool,
) -> Vec<Vec<String>> {
    // locate the first matching paragraph per slot
    let mut matched: Vec<(usize, usize, &Paragraph)> = Vec::new();
    let mut unmatched: Vec<usize> = Vec::new();
    for (slot, pattern) in node.patterns.iter().enumerate() {
        let hit = paragraphs.iter().filter(|p| p.is_paragraph()).find_map(|p| {
            pattern
                .find(&clean_txt(&p.text))
                .map(|m| (slot, m.start(), *p))
        });
        match hit {
            Some(entry) => matched.push(entry),
            None => unmatched.push(slot),
        }
    }
    // document order wins; ties inside one paragraph order by match start
    matched.sort_by_key(|(_, start, paragraph)| (paragraph.index, *start));

    let mut slots: Vec<Vec<String>> = Vec::new();
    let mut prev_num: i64 = 0;
    for (slot, _, paragraph) in &matched {
        let mut prefix = String::new();
        if let Some(serial) = &node.serial_num {
            if let Some(caps) = serial.captures(&clean_txt(&paragraph.text)) {
                prefix = caps["prefix"].to_string();
                if let Some(num) = cn_number_to_digit(&caps["num"]) {
                    prev_num = num;
                }
            }
        }
        let item_slots = split_item(&node.items[*slot], ctx, &[*paragraph]);
        slots.extend(prefixed(prefix.as_str(), item_slots));
        if with_children {
            let following: Vec<&Paragraph> = paragraphs
                .iter()
                .filter(|p| p.index > paragraph.index)
                .copied()
                .collect();
            slots.extend(split_item(&node.child_items[*slot], ctx, &following));
        }
    }
    // slots that never matched keep their declared position at the tail
    for slot in unmatched {
        let mut prefix = String::new();
        if node.serial_num.is_some() {
            if let Some(template) = &node.default_prefix {
                prev_num += 1;
                prefix = template.replace("{num}", &prev_num.to_string());
            }
        }
        let item_slots = split_item(&node.items[slot], ctx, &[]);
        slots.extend(prefixed(prefix.as_str(), item_slots));
    }
    slots
}

fn prefixed(prefix: &str, slots: Vec<Vec<String>>) -> Vec<Vec<String>> {
    if prefix.is_empty() {
        return slots;
    }
    slots
        .into_iter()
        .map(|slot| {
            slot.into_iter()
                .map(|text| format!("{prefix}{text}"))
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------
// INNER_REFER
// ---------------------------------------------------------------------

fn inner_refer(
    node: &RewriteNode,
    ctx: &RewriteContext<'_>,
    paragraphs: &[&Paragraph],
) -> Vec<Vec<String>> {
    let mut format = HashMap::new();
    for (key, rule) in &node.rules {
        let RewriteRule::Refer {
            patterns,
            refer_chapter,
            multiple,
            default,
        } = rule
        else {
            continue;
        };
        let scoped: Vec<&Paragraph> = match refer_chapter {
            Some(chapter) => ctx.reader.find_paragraphs_by_rule(chapter).1,
            None => paragraphs.to_vec(),
        };
        let mut nums: Vec<i64> = Vec::new();
        for pattern in patterns {
            for paragraph in scoped.iter().filter(|p| p.is_paragraph()) {
                let content = clean_txt(&paragraph.text);
                if !pattern.is_match(&content) {
                    continue;
                }
                if let Some(caps) = P_SERIAL_NUM.captures(&content) {
                    if let Some(num) = cn_number_to_digit(&caps["num"]) {
                        if !nums.contains(&num) {
                            nums.push(num);
                        }
                    }
                }
                if !*multiple {
                    break;
                }
            }
        }
        nums.sort_unstable();
        let value = if nums.is_empty() {
            FormatValue::One(default.clone())
        } else {
            let joined = nums
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join("、");
            if is_increment(&nums) {
                // contiguous runs also offer the "m-n" range form
                let range = format!("{}-{}", nums[0], nums[nums.len() - 1]);
                FormatValue::Many(vec![range, joined])
            } else {
                FormatValue::One(joined)
            }
        };
        format.insert(key.clone(), value);
    }
    formatted_item_slots(node, ctx, paragraphs, &format)
}

// ---------------------------------------------------------------------
// SINGLE_SELECT
// ---------------------------------------------------------------------

fn single_select(
    node: &RewriteNode,
    ctx: &RewriteContext<'_>,
    paragraphs: &[&Paragraph],
) -> Vec<Vec<String>> {
    let mut format = HashMap::new();
    for (key, rule) in &node.rules {
        let RewriteRule::Select {
            para_pattern,
            entries,
            default,
        } = rule
        else {
            continue;
        };
        let mut value = default.clone();
        'outer: for paragraph in paragraphs.iter().filter(|p| p.is_paragraph()) {
            let content = clean_txt(&paragraph.text);
            let Some(caps) = para_pattern.captures(&content) else {
                continue;
            };
            let Some(matched) = caps.name("content") else {
                continue;
            };
            for entry in entries {
                if !verify_conditions(&entry.conditions, ctx.classification) {
                    continue;
                }
                if entry.pattern.is_match(matched.as_str()) {
                    value = entry.content.clone();
                    break 'outer;
                }
            }
        }
        format.insert(key.clone(), FormatValue::One(value));
    }
    formatted_item_slots(node, ctx, paragraphs, &format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ClassifyName, Mold};
    use crate::document::{DocumentBundle, ParagraphKind};
    use crate::pattern::{PatternCollection, P_PARA_PREFIX_NUM};
    use crate::template::{OptionalBranch, RecombineEntry, SelectEntry};
    use std::collections::BTreeMap;

    fn paragraph(index: usize, text: &str) -> Paragraph {
        Paragraph {
            index,
            page: 1,
            text: text.to_string(),
            kind: ParagraphKind::Paragraph,
            rows: Vec::new(),
            fragment: false,
            outlines: BTreeMap::new(),
        }
    }

    struct Fixture {
        bundle: DocumentBundle,
        classification: Classification,
    }

    impl Fixture {
        fn new(paragraphs: Vec<Paragraph>) -> Self {
            let bundle = DocumentBundle {
                fid: "doc".into(),
                mold: Mold::PublicFund,
                paragraphs,
                chapters: Vec::new(),
                answers: BTreeMap::new(),
            };
            Self {
                bundle,
                classification: Classification::default(),
            }
        }

        fn with_tags(mut self, name: ClassifyName, tags: Vec<Tag>) -> Self {
            let mut map = BTreeMap::new();
            map.insert(name, tags);
            self.classification = Classification::new(map);
            self
        }

        fn expand(&self, items: &[TemplateItem]) -> Vec<Vec<String>> {
            let reader = Reader::new(&self.bundle);
            let answers = AnswerManager::new(&self.bundle);
            let ctx = RewriteContext {
                reader: &reader,
                answers: &answers,
                classification: &self.classification,
            };
            let paragraphs: Vec<&Paragraph> = self.bundle.paragraphs.iter().collect();
            expand_candidates(items, &ctx, &paragraphs)
        }
    }

    #[test]
    fn unconditional_template_roundtrips() {
        // an all-unconditional template reproduces its own text
        let fixture = Fixture::new(Vec::new());
        let items = vec![
            TemplateItem::leaf("第一段原文。"),
            TemplateItem::leaf("（二）第二段原文。"),
        ];
        let candidates = fixture.expand(&items);
        assert_eq!(
            candidates,
            vec![vec![
                "第一段原文。".to_string(),
                "（二）第二段原文。".to_string()
            ]]
        );
    }

    #[test]
    fn alternatives_fork_candidates() {
        let fixture = Fixture::new(Vec::new());
        let items = vec![
            TemplateItem::leaf("头段。"),
            TemplateItem::alt(&["甲表述。", "乙表述。"]),
        ];
        let candidates = fixture.expand(&items);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0][1], "甲表述。");
        assert_eq!(candidates[1][1], "乙表述。");
    }

    #[test]
    fn gated_block_drops_when_conditions_fail() {
        let fixture = Fixture::new(Vec::new());
        let items = vec![
            TemplateItem::leaf("总有的段落。"),
            TemplateItem::gated(
                vec![crate::condition::canned::pooled()],
                vec![TemplateItem::leaf("集合限定段落。")],
            ),
        ];
        let candidates = fixture.expand(&items);
        assert_eq!(candidates, vec![vec!["总有的段落。".to_string()]]);
    }

    #[test]
    fn single_optional_first_holding_branch_wins() {
        // the first holding branch wins
        let fixture = Fixture::new(Vec::new()).with_tags(
            ClassifyName::ProjectName,
            vec![Tag::Pooled, Tag::Single],
        );
        let items = vec![TemplateItem::SingleOptional(vec![
            OptionalBranch {
                conditions: vec![crate::condition::canned::pooled()],
                items: vec![TemplateItem::leaf("集合分支。")],
            },
            OptionalBranch {
                conditions: vec![Condition::equal(ClassifyName::ProjectName, Tag::Single)],
                items: vec![TemplateItem::leaf("单一分支。")],
            },
            OptionalBranch {
                conditions: Vec::new(),
                items: vec![TemplateItem::leaf("默认分支。")],
            },
        ])];
        let candidates = fixture.expand(&items);
        assert_eq!(candidates, vec![vec!["集合分支。".to_string()]]);
    }

    #[test]
    fn single_optional_falls_back_to_unconditional() {
        let fixture = Fixture::new(Vec::new());
        let items = vec![TemplateItem::SingleOptional(vec![
            OptionalBranch {
                conditions: vec![crate::condition::canned::pooled()],
                items: vec![TemplateItem::leaf("集合分支。")],
            },
            OptionalBranch {
                conditions: Vec::new(),
                items: vec![TemplateItem::leaf("默认分支。")],
            },
        ])];
        let candidates = fixture.expand(&items);
        assert_eq!(candidates, vec![vec!["默认分支。".to_string()]]);
    }

    #[test]
    fn inner_replace_substitutes_bourse_name() {
        let fixture =
            Fixture::new(Vec::new()).with_tags(ClassifyName::StockBourse, vec![Tag::Shanghai]);
        let mut node = RewriteNode::new(RewriteKind::InnerReplace);
        node.rules = vec![(
            "IRP_1".to_string(),
            RewriteRule::Replace {
                func: "get_fund_bourse_name".to_string(),
                default: "***".to_string(),
            },
        )];
        node.items = vec![TemplateItem::leaf("{IRP_1}证券投资基金")];
        let candidates = fixture.expand(&[TemplateItem::Rewrite(Box::new(node))]);
        assert_eq!(candidates, vec![vec!["上海证券投资基金".to_string()]]);
    }

    #[test]
    fn inner_replace_unknown_func_substitutes_stars() {
        let fixture = Fixture::new(Vec::new());
        let mut node = RewriteNode::new(RewriteKind::InnerReplace);
        node.rules = vec![(
            "IRP_1".to_string(),
            RewriteRule::Replace {
                func: "no_such_func".to_string(),
                default: "默认".to_string(),
            },
        )];
        node.items = vec![TemplateItem::leaf("{IRP_1}基金")];
        let candidates = fixture.expand(&[TemplateItem::Rewrite(Box::new(node))]);
        assert_eq!(candidates, vec![vec!["***基金".to_string()]]);
    }

    #[test]
    fn inner_refer_contiguous_numbers_emit_range_form() {
        let fixture = Fixture::new(vec![
            paragraph(0, "（1）股票投资的情形"),
            paragraph(1, "（2）债券投资的情形"),
            paragraph(2, "（3）期货投资的情形"),
        ]);
        let mut node = RewriteNode::new(RewriteKind::InnerRefer);
        node.rules = vec![(
            "IRF_1".to_string(),
            RewriteRule::Refer {
                patterns: vec![PatternCollection::single("投资的情形").unwrap()],
                refer_chapter: None,
                multiple: true,
                default: "X".to_string(),
            },
        )];
        node.items = vec![TemplateItem::leaf("第{IRF_1}项")];
        let candidates = fixture.expand(&[TemplateItem::Rewrite(Box::new(node))]);
        let texts: Vec<&str> = candidates.iter().map(|c| c[0].as_str()).collect();
        assert!(texts.contains(&"第1-3项"));
        assert!(texts.contains(&"第1、2、3项"));
    }

    #[test]
    fn recombination_preserves_document_order_and_renumbers() {
        // document order wins, missing slots keep
        // declared order at the tail
        let fixture = Fixture::new(vec![
            paragraph(0, "1、境内货币市场基金按收益计提。"),
            paragraph(1, "2、境内非货币市场基金按净值估值。"),
        ]);
        let mut node = RewriteNode::new(RewriteKind::Recombination);
        node.patterns = vec![
            PatternCollection::compile(["非货币市场"]).unwrap(),
            PatternCollection::compile(["货币市场基金按收益"]).unwrap(),
            PatternCollection::compile(["永远匹配不到的东西"]).unwrap(),
        ];
        node.items = vec![
            TemplateItem::leaf("境内非货币市场基金按净值估值。"),
            TemplateItem::leaf("境内货币市场基金按收益计提。"),
            TemplateItem::leaf("缺失的段落。"),
        ];
        node.serial_num = Some(P_PARA_PREFIX_NUM.clone());
        node.default_prefix = Some("{num}、".to_string());
        let candidates = fixture.expand(&[TemplateItem::Rewrite(Box::new(node))]);
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        // document order: the money-market slot (paragraph 0) first
        assert!(candidate[0].starts_with("1、"));
        assert!(candidate[0].contains("货币市场基金按收益"));
        assert!(candidate[1].starts_with("2、"));
        // the missing slot keeps its declared position at the tail with a
        // regenerated serial
        assert_eq!(candidate[2], "3、缺失的段落。");
    }

    #[test]
    fn inner_recombination_reorders_and_fills_missing() {
        let fixture = Fixture::new(vec![paragraph(
            0,
            "本基金投资范围为债券、股票及银行存款。",
        )])
        .with_tags(ClassifyName::ProjectName, vec![Tag::Pooled]);
        let mut node = RewriteNode::new(RewriteKind::InnerRecombination);
        node.rules = vec![(
            "IRC_1".to_string(),
            RewriteRule::Recombine {
                para_pattern: PatternCollection::single(
                    "投资范围为(?P<content>.+?)。?$",
                )
                .unwrap(),
                entries: vec![
                    RecombineEntry::new(
                        PatternCollection::single("股票").unwrap(),
                        "股票",
                    ),
                    RecombineEntry::new(
                        PatternCollection::single("债券").unwrap(),
                        "债券",
                    ),
                    RecombineEntry::new(
                        PatternCollection::single("基金").unwrap(),
                        "证券投资基金",
                    ),
                ],
                exclude_patterns: None,
                default: "股票、债券".to_string(),
            },
        )];
        node.items = vec![TemplateItem::leaf("投资范围：{IRC_1}。")];
        let candidates = fixture.expand(&[TemplateItem::Rewrite(Box::new(node))]);
        assert_eq!(candidates.len(), 1);
        // observed order 债券、股票 with observed linkers, missing item
        // appended with 、
        assert_eq!(candidates[0][0], "投资范围：债券、股票、证券投资基金。");
    }

    #[test]
    fn single_select_picks_matching_variant() {
        let fixture = Fixture::new(vec![paragraph(
            0,
            "具有公募基金销售资格的机构可以募集。",
        )]);
        let mut node = RewriteNode::new(RewriteKind::SingleSelect);
        node.rules = vec![(
            "IR_1".to_string(),
            RewriteRule::Select {
                para_pattern: PatternCollection::single("有(?P<content>.+?)销售资格")
                    .unwrap(),
                entries: vec![
                    SelectEntry::new(
                        PatternCollection::single("公募基金").unwrap(),
                        "公募基金",
                    ),
                    SelectEntry::new(
                        PatternCollection::single("公开募集证券投资基金").unwrap(),
                        "公开募集证券投资基金",
                    ),
                ],
                default: "公募基金/公开募集证券投资基金".to_string(),
            },
        )];
        node.items = vec![TemplateItem::leaf("具有{IR_1}销售资格的机构")];
        let candidates = fixture.expand(&[TemplateItem::Rewrite(Box::new(node))]);
        assert_eq!(
            candidates,
            vec![vec!["具有公募基金销售资格的机构".to_string()]]
        );
    }

    #[test]
    fn unresolved_keys_stay_verbatim() {
        let fixture = Fixture::new(Vec::new());
        let mut node = RewriteNode::new(RewriteKind::InnerReplace);
        node.rules = vec![(
            "IRP_9".to_string(),
            RewriteRule::Replace {
                func: "get_fund_name".to_string(),
                default: "本基金".to_string(),
            },
        )];
        node.items = vec![TemplateItem::leaf("{X}的费率由{IRP_9}确定")];
        let candidates = fixture.expand(&[TemplateItem::Rewrite(Box::new(node))]);
        // {X} belongs to the content-value layer and survives the rewrite
        assert_eq!(candidates[0][0], "{X}的费率由本基金确定");
    }
}
