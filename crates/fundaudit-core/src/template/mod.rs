//! Rule and template model: the template AST, rewrite directives, and
//! the registration-time structural self-check.

pub mod rewrite;

use serde::Serialize;
use thiserror::Error;

use crate::chapters::ChapterRule;
use crate::condition::{Condition, ContentValueRelation};
use crate::pattern::PatternCollection;

pub use rewrite::{collect_conditions, expand_candidates, RewriteContext};

/// Structural problems detected when a rule registers. Fatal for the
/// owning rule family.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("rule {label}: template missing content_title")]
    MissingContentTitle { label: String },

    #[error("rule {label}: alternative list needs at least two entries")]
    ShortAlternative { label: String },

    #[error("rule {label}: single_optional fallback must be last")]
    FallbackNotLast { label: String },

    #[error("rule {label}: RECOMBINATION patterns/items mismatch")]
    RecombinationMismatch { label: String },

    #[error("rule {label}: CHAPTER_COMBINATION child_items mismatch")]
    ChapterChildMismatch { label: String },

    #[error("rule {label}: rewrite node carries no rules")]
    EmptyRewriteRules { label: String },
}

/// Which reference text a template quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemplateName {
    /// Regulation text.
    Law,
    /// Model contract text.
    Editing,
}

impl TemplateName {
    pub fn label(&self) -> &'static str {
        match self {
            TemplateName::Law => "法规",
            TemplateName::Editing => "范文",
        }
    }

    pub fn content_title(&self) -> &'static str {
        match self {
            TemplateName::Law => "法规条款",
            TemplateName::Editing => "合同范文",
        }
    }
}

/// The rewrite transformations a template node may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteKind {
    InnerReplace,
    InnerRecombination,
    Recombination,
    InnerRefer,
    SingleSelect,
    ChapterCombination,
}

/// One conjunction-split member of an INNER_RECOMBINATION rule.
#[derive(Debug, Clone)]
pub struct RecombineEntry {
    pub pattern: PatternCollection,
    pub value: String,
    pub conditions: Vec<Condition>,
    pub required: bool,
}

impl RecombineEntry {
    pub fn new(pattern: PatternCollection, value: &str) -> Self {
        Self {
            pattern,
            value: value.to_string(),
            conditions: Vec::new(),
            required: true,
        }
    }

    pub fn when(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// One vocabulary variant of a SINGLE_SELECT rule.
#[derive(Debug, Clone)]
pub struct SelectEntry {
    pub pattern: PatternCollection,
    pub content: String,
    pub conditions: Vec<Condition>,
}

impl SelectEntry {
    pub fn new(pattern: PatternCollection, content: &str) -> Self {
        Self {
            pattern,
            content: content.to_string(),
            conditions: Vec::new(),
        }
    }
}

/// A keyed rewrite directive.
#[derive(Debug, Clone)]
pub enum RewriteRule {
    /// Substitute from an attribute function on the dispatch table.
    Replace { func: String, default: String },
    /// Reorder/filter conjunction-split members of a matched clause.
    Recombine {
        para_pattern: PatternCollection,
        entries: Vec<RecombineEntry>,
        exclude_patterns: Option<PatternCollection>,
        default: String,
    },
    /// Resolve cross references ("第X项") from serial prefixes.
    Refer {
        patterns: Vec<PatternCollection>,
        refer_chapter: Option<ChapterRule>,
        multiple: bool,
        default: String,
    },
    /// Pick a fixed variant by probing the captured content.
    Select {
        para_pattern: PatternCollection,
        entries: Vec<SelectEntry>,
        default: String,
    },
}

/// A rewrite-typed template node.
#[derive(Debug, Clone)]
pub struct RewriteNode {
    pub kind: RewriteKind,
    /// key → directive, applied before descending into `items`.
    pub rules: Vec<(String, RewriteRule)>,
    pub items: Vec<TemplateItem>,
    /// Slot patterns for RECOMBINATION / CHAPTER_COMBINATION.
    pub patterns: Vec<PatternCollection>,
    /// Per-slot subtrees for CHAPTER_COMBINATION.
    pub child_items: Vec<TemplateItem>,
    /// Recognizes existing serial prefixes when renumbering.
    pub serial_num: Option<PatternCollection>,
    /// Prefix template ("（{num}）") for slots that never matched.
    pub default_prefix: Option<String>,
}

impl RewriteNode {
    pub fn new(kind: RewriteKind) -> Self {
        Self {
            kind,
            rules: Vec::new(),
            items: Vec::new(),
            patterns: Vec::new(),
            child_items: Vec::new(),
            serial_num: None,
            default_prefix: None,
        }
    }
}

/// A branch of a `single_optional` block.
#[derive(Debug, Clone)]
pub struct OptionalBranch {
    pub conditions: Vec<Condition>,
    pub items: Vec<TemplateItem>,
}

/// The template AST.
#[derive(Debug, Clone)]
pub enum TemplateItem {
    /// One fixed paragraph.
    Leaf(String),
    /// Alternative phrasings of one paragraph (at least two).
    Alt(Vec<String>),
    /// A block emitted only when its conditions hold.
    Gated {
        conditions: Vec<Condition>,
        items: Vec<TemplateItem>,
    },
    /// Mutually exclusive branches; first holding branch wins, a
    /// trailing unconditional branch is the default.
    SingleOptional(Vec<OptionalBranch>),
    /// A rewrite transformation over bound document paragraphs.
    Rewrite(Box<RewriteNode>),
}

impl TemplateItem {
    pub fn leaf(text: &str) -> Self {
        TemplateItem::Leaf(text.to_string())
    }

    pub fn alt<S: AsRef<str>>(texts: &[S]) -> Self {
        TemplateItem::Alt(texts.iter().map(|t| t.as_ref().to_string()).collect())
    }

    pub fn gated(conditions: Vec<Condition>, items: Vec<TemplateItem>) -> Self {
        TemplateItem::Gated { conditions, items }
    }
}

/// One reference template of a rule.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: TemplateName,
    pub content_title: String,
    pub chapter: Option<ChapterRule>,
    pub items: Vec<TemplateItem>,
    /// A rule fails when all of its required templates miss.
    pub required: bool,
    pub min_ratio: f64,
    pub content_condition: Option<ContentValueRelation>,
    pub ignore_extra_para: bool,
    pub split_sentence: bool,
    /// Citation line attached to Match/Conflict verdicts.
    pub source: String,
    /// Override reason text for Conflict verdicts.
    pub diff_text: Option<String>,
}

impl Template {
    pub fn new(name: TemplateName, items: Vec<TemplateItem>) -> Self {
        Self {
            name,
            content_title: name.content_title().to_string(),
            chapter: None,
            items,
            required: true,
            min_ratio: 0.6,
            content_condition: None,
            ignore_extra_para: false,
            split_sentence: true,
            source: String::new(),
            diff_text: None,
        }
    }

    pub fn in_chapter(mut self, chapter: ChapterRule) -> Self {
        self.chapter = Some(chapter);
        self
    }

    pub fn min_ratio(mut self, min_ratio: f64) -> Self {
        self.min_ratio = min_ratio;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_content_condition(mut self, condition: ContentValueRelation) -> Self {
        self.content_condition = Some(condition);
        self
    }
}

/// A required answer field, optionally gated by conditions.
#[derive(Debug, Clone)]
pub struct SchemaField {
    pub name: String,
    pub conditions: Vec<Condition>,
}

impl SchemaField {
    pub fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            conditions: Vec::new(),
        }
    }

    pub fn when(name: &str, conditions: Vec<Condition>) -> Self {
        Self {
            name: name.to_string(),
            conditions,
        }
    }
}

/// Rule family, iterated in a fixed order by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFamily {
    NormalCondition,
    ReplaceCondition,
    MultipleSentences,
    SingleSentenceMultiple,
}

impl RuleFamily {
    pub fn ordered() -> [RuleFamily; 4] {
        [
            RuleFamily::NormalCondition,
            RuleFamily::ReplaceCondition,
            RuleFamily::MultipleSentences,
            RuleFamily::SingleSentenceMultiple,
        ]
    }
}

/// Kind of record a rule produces, surfaced in results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Template,
    Schema,
}

/// A registry record: one auditable rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Stable external identifier ("template_950", "schema_1026").
    pub label: String,
    pub name: String,
    pub related_name: String,
    /// Quoted regulation text.
    pub origin: Vec<String>,
    /// Titles of the quoted regulations.
    pub from: Vec<String>,
    pub contract_content: Vec<String>,
    pub schema_fields: Vec<SchemaField>,
    pub templates: Vec<Template>,
    pub rule_type: RuleType,
    pub family: RuleFamily,
    pub tip: Option<String>,
    /// When false, missing schema answers stay visible but count as
    /// matched.
    pub required_schema: bool,
}

impl Rule {
    pub fn new(label: &str, name: &str, related_name: &str) -> Self {
        Self {
            label: label.to_string(),
            name: name.to_string(),
            related_name: related_name.to_string(),
            origin: Vec::new(),
            from: Vec::new(),
            contract_content: Vec::new(),
            schema_fields: Vec::new(),
            templates: Vec::new(),
            rule_type: RuleType::Template,
            family: RuleFamily::NormalCondition,
            tip: None,
            required_schema: true,
        }
    }

    /// The "origin contents" pair shown with every result: quoted
    /// regulation titles and their text.
    pub fn origin_contents(&self) -> [String; 2] {
        let from: Vec<String> = self
            .from
            .iter()
            .map(|item| {
                if item.starts_with('《') && item.ends_with('》') {
                    item.clone()
                } else {
                    format!("《{item}》")
                }
            })
            .collect();
        [from.join("\n"), self.origin.join("\n")]
    }
}

/// Registration-time structural self-check over a rule's templates.
pub fn validate_rule(rule: &Rule) -> Result<(), TemplateError> {
    for template in &rule.templates {
        if template.content_title.trim().is_empty() {
            return Err(TemplateError::MissingContentTitle {
                label: rule.label.clone(),
            });
        }
        for item in &template.items {
            validate_item(item, &rule.label)?;
        }
    }
    Ok(())
}

fn validate_item(item: &TemplateItem, label: &str) -> Result<(), TemplateError> {
    match item {
        TemplateItem::Leaf(_) => Ok(()),
        TemplateItem::Alt(alternatives) => {
            if alternatives.len() < 2 {
                return Err(TemplateError::ShortAlternative {
                    label: label.to_string(),
                });
            }
            Ok(())
        }
        TemplateItem::Gated { items, .. } => {
            for child in items {
                validate_item(child, label)?;
            }
            Ok(())
        }
        TemplateItem::SingleOptional(branches) => {
            let unconditional = branches
                .iter()
                .enumerate()
                .filter(|(_, branch)| branch.conditions.is_empty())
                .collect::<Vec<_>>();
            if unconditional.len() > 1 {
                return Err(TemplateError::FallbackNotLast {
                    label: label.to_string(),
                });
            }
            if let Some((idx, _)) = unconditional.first() {
                if *idx + 1 != branches.len() {
                    return Err(TemplateError::FallbackNotLast {
                        label: label.to_string(),
                    });
                }
            }
            for branch in branches {
                for child in &branch.items {
                    validate_item(child, label)?;
                }
            }
            Ok(())
        }
        TemplateItem::Rewrite(node) => validate_rewrite(node, label),
    }
}

fn validate_rewrite(node: &RewriteNode, label: &str) -> Result<(), TemplateError> {
    match node.kind {
        RewriteKind::Recombination => {
            if node.patterns.len() != node.items.len() {
                return Err(TemplateError::RecombinationMismatch {
                    label: label.to_string(),
                });
            }
        }
        RewriteKind::ChapterCombination => {
            if node.patterns.len() != node.items.len()
                || node.items.len() != node.child_items.len()
            {
                return Err(TemplateError::ChapterChildMismatch {
                    label: label.to_string(),
                });
            }
        }
        RewriteKind::InnerReplace
        | RewriteKind::InnerRecombination
        | RewriteKind::InnerRefer
        | RewriteKind::SingleSelect => {
            if node.rules.is_empty() {
                return Err(TemplateError::EmptyRewriteRules {
                    label: label.to_string(),
                });
            }
        }
    }
    for child in node.items.iter().chain(node.child_items.iter()) {
        validate_item(child, label)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_with(items: Vec<TemplateItem>) -> Rule {
        let mut rule = Rule::new("template_1", "测试", "测试");
        rule.templates = vec![Template::new(TemplateName::Editing, items)];
        rule
    }

    #[test]
    fn plain_leaf_validates() {
        let rule = rule_with(vec![TemplateItem::leaf("第一段")]);
        assert!(validate_rule(&rule).is_ok());
    }

    #[test]
    fn single_alternative_is_rejected() {
        let rule = rule_with(vec![TemplateItem::Alt(vec!["唯一".into()])]);
        assert!(matches!(
            validate_rule(&rule),
            Err(TemplateError::ShortAlternative { .. })
        ));
    }

    #[test]
    fn fallback_must_be_last() {
        let rule = rule_with(vec![TemplateItem::SingleOptional(vec![
            OptionalBranch {
                conditions: Vec::new(),
                items: vec![TemplateItem::leaf("默认")],
            },
            OptionalBranch {
                conditions: vec![crate::condition::canned::pooled()],
                items: vec![TemplateItem::leaf("集合")],
            },
        ])]);
        assert!(matches!(
            validate_rule(&rule),
            Err(TemplateError::FallbackNotLast { .. })
        ));
    }

    #[test]
    fn recombination_lengths_must_agree() {
        let mut node = RewriteNode::new(RewriteKind::Recombination);
        node.patterns = vec![PatternCollection::single("甲").unwrap()];
        node.items = vec![TemplateItem::leaf("甲段"), TemplateItem::leaf("乙段")];
        let rule = rule_with(vec![TemplateItem::Rewrite(Box::new(node))]);
        assert!(matches!(
            validate_rule(&rule),
            Err(TemplateError::RecombinationMismatch { .. })
        ));
    }

    #[test]
    fn origin_contents_quotes_sources() {
        let mut rule = Rule::new("template_2", "名称", "相关");
        rule.from = vec!["证券投资基金法".into()];
        rule.origin = vec!["第一条……".into()];
        let [from, origin] = rule.origin_contents();
        assert_eq!(from, "《证券投资基金法》");
        assert_eq!(origin, "第一条……");
    }
}
