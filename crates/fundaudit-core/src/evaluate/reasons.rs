//! Typed verdict reasons and the per-rule result record.
//!
//! Every rule yields exactly one [`ResultItem`]; a result carries any
//! number of reasons. A result is compliant iff all non-ignored reasons
//! are matched.

use serde::Serialize;

use crate::document::answers::SchemaResult;
use crate::document::Outlines;
use crate::similarity::SimpleDiff;
use crate::template::RuleType;

/// Reference text attached to a reason.
#[derive(Debug, Clone, Serialize, Default)]
pub struct TemplateRef {
    pub content: String,
    pub content_title: String,
    /// "法规" or "范文".
    pub name: String,
}

/// One justification for a rule verdict.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reason {
    /// The reference text was found within tolerance.
    TplMatch {
        template: TemplateRef,
        content: String,
        content_title: String,
        page: u32,
        outlines: Outlines,
        diff: Vec<SimpleDiff>,
        xpath: Option<String>,
        source: String,
    },
    /// The reference text was found but differs; carries the diff.
    TplConflict {
        template: TemplateRef,
        content: String,
        content_title: String,
        page: u32,
        outlines: Outlines,
        diff: Vec<SimpleDiff>,
        xpath: Option<String>,
        reason_text: String,
        source: String,
    },
    /// The reference text was not found in scope.
    TplNoMatch {
        template: TemplateRef,
        reason_text: String,
        matched: bool,
    },
    /// The scoping chapter path does not exist.
    TplMissContent {
        reason_text: String,
        miss_content: String,
        template: Option<TemplateRef>,
        matched: bool,
    },
    /// Preconditions failed; informational.
    TplIgnoreCondition { reason_text: String },
    /// A required answer field is missing.
    SchemaFailed {
        reason_text: String,
        suggestion: String,
        matched: bool,
    },
    /// Ad-hoc failure with a text reason and page anchor.
    TplFailed {
        page: u32,
        outlines: Outlines,
        reason_text: String,
    },
    /// Ad-hoc success (numeric bound cleared, consistency held).
    MatchedSuccess {
        page: u32,
        outlines: Outlines,
        content: String,
        reason_text: String,
    },
}

/// Display pointer for the UI; outlines stay the source of truth.
pub fn xpath_by_outlines(outlines: &Outlines) -> Option<String> {
    outlines
        .keys()
        .next()
        .map(|page| format!("//page[{page}]"))
}

impl Reason {
    pub fn no_match(template: TemplateRef, matched: bool) -> Self {
        let name = if template.name.is_empty() {
            "范文与法规".to_string()
        } else {
            template.name.clone()
        };
        Reason::TplNoMatch {
            template,
            reason_text: format!("未找到与{name}匹配的内容"),
            matched,
        }
    }

    pub fn miss_content(reason_text: &str, miss_content: &str, matched: bool) -> Self {
        Reason::TplMissContent {
            reason_text: reason_text.to_string(),
            miss_content: miss_content.to_string(),
            template: None,
            matched,
        }
    }

    pub fn ignore_condition(reason_text: String) -> Self {
        Reason::TplIgnoreCondition { reason_text }
    }

    pub fn schema_failed(field: &str) -> Self {
        Reason::SchemaFailed {
            reason_text: format!("要素“{field}”为空"),
            suggestion: format!("请补充“{field}”"),
            matched: false,
        }
    }

    pub fn match_failed(reason_text: String, page: u32, outlines: Outlines) -> Self {
        Reason::TplFailed {
            page,
            outlines,
            reason_text,
        }
    }

    pub fn match_success(reason_text: String) -> Self {
        Reason::MatchedSuccess {
            page: 0,
            outlines: Outlines::new(),
            content: String::new(),
            reason_text,
        }
    }

    /// Whether this reason counts toward compliance.
    pub fn matched(&self) -> bool {
        match self {
            Reason::TplMatch { .. } => true,
            Reason::TplConflict { .. } => false,
            Reason::TplNoMatch { matched, .. } => *matched,
            Reason::TplMissContent { matched, .. } => *matched,
            Reason::TplIgnoreCondition { .. } => true,
            Reason::SchemaFailed { matched, .. } => *matched,
            Reason::TplFailed { .. } => false,
            Reason::MatchedSuccess { .. } => true,
        }
    }

    pub fn is_ignore(&self) -> bool {
        matches!(self, Reason::TplIgnoreCondition { .. })
    }

    /// Stable kind key, used for reason deduplication.
    pub fn kind(&self) -> &'static str {
        match self {
            Reason::TplMatch { .. } => "tpl_match",
            Reason::TplConflict { .. } => "tpl_conflict",
            Reason::TplNoMatch { .. } => "tpl_no_match",
            Reason::TplMissContent { .. } => "tpl_miss_content",
            Reason::TplIgnoreCondition { .. } => "tpl_ignore_condition",
            Reason::SchemaFailed { .. } => "schema_failed",
            Reason::TplFailed { .. } => "tpl_failed",
            Reason::MatchedSuccess { .. } => "matched_success",
        }
    }

    pub fn reason_text(&self) -> String {
        match self {
            Reason::TplMatch { template, .. } => {
                format!("匹配到{}的内容", template.name)
            }
            Reason::TplConflict { reason_text, template, .. } => {
                if reason_text.is_empty() {
                    format!("与{}不一致", template.name)
                } else {
                    reason_text.clone()
                }
            }
            Reason::TplNoMatch { reason_text, .. }
            | Reason::TplMissContent { reason_text, .. }
            | Reason::TplIgnoreCondition { reason_text }
            | Reason::SchemaFailed { reason_text, .. }
            | Reason::TplFailed { reason_text, .. }
            | Reason::MatchedSuccess { reason_text, .. } => reason_text.clone(),
        }
    }

    pub fn page(&self) -> u32 {
        match self {
            Reason::TplMatch { page, .. }
            | Reason::TplConflict { page, .. }
            | Reason::TplFailed { page, .. }
            | Reason::MatchedSuccess { page, .. } => *page,
            _ => 0,
        }
    }

    /// Template name this reason compares against, when any.
    pub fn template(&self) -> Option<&TemplateRef> {
        match self {
            Reason::TplMatch { template, .. } | Reason::TplConflict { template, .. } => {
                Some(template)
            }
            Reason::TplNoMatch { template, .. } => Some(template),
            Reason::TplMissContent { template, .. } => template.as_ref(),
            _ => None,
        }
    }

    /// Revision prescription shown to the user, if this reason carries
    /// one.
    pub fn render_suggestion(&self, rule_name: &str) -> Option<String> {
        let place = if rule_name.is_empty() { "合同" } else { rule_name };
        match self {
            Reason::SchemaFailed { suggestion, .. } => {
                if suggestion.is_empty() {
                    None
                } else {
                    Some(suggestion.clone())
                }
            }
            Reason::TplNoMatch { template, matched, .. } => {
                if *matched {
                    return None;
                }
                Some(format!("请在{place}中补充“{}”", template.content))
            }
            Reason::TplMissContent {
                reason_text: _,
                miss_content,
                template,
                matched,
            } => {
                if *matched {
                    return None;
                }
                let content = if miss_content.is_empty() {
                    template
                        .as_ref()
                        .map(|t| t.content.clone())
                        .unwrap_or_default()
                } else {
                    miss_content.clone()
                };
                let lines: Vec<String> = content
                    .split('\n')
                    .filter(|line| !line.is_empty())
                    .map(|line| format!("请在{place}中补充{line}"))
                    .collect();
                Some(lines.join("\n"))
            }
            Reason::TplConflict { template, content, .. } => Some(format!(
                "请将{place}中的“{content}”修改为“{}”",
                template.content
            )),
            _ => None,
        }
    }
}

/// The product of evaluating one rule against one document.
#[derive(Debug, Clone, Serialize)]
pub struct ResultItem {
    pub label: String,
    pub name: String,
    pub related_name: String,
    pub rule_type: RuleType,
    pub is_compliance: bool,
    pub reasons: Vec<Reason>,
    pub suggestion: String,
    pub fid: String,
    /// External schema identifier, assigned by the caller when results
    /// are persisted.
    pub schema_id: Option<String>,
    pub schema_results: Vec<SchemaResult>,
    /// Quoted regulation titles and text.
    pub origin_contents: [String; 2],
    pub contract_content: String,
    pub tip: Option<String>,
}

impl ResultItem {
    /// Compliance is undecidable when every reason is an ignore marker.
    pub fn is_compliance_real(&self) -> Option<bool> {
        if !self.reasons.is_empty() && self.reasons.iter().all(Reason::is_ignore) {
            None
        } else {
            Some(self.is_compliance)
        }
    }
}
