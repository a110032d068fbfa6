//! Access to externally extracted answer fields.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Answer, DocumentBundle, Outlines};

/// A serializable view of one answer field, attached to rule results so
/// the caller can render which inputs the verdict depended on.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchemaResult {
    pub name: String,
    pub value: Option<String>,
    pub outlines: Outlines,
}

/// Read-only answer lookup. Missing fields resolve to an empty answer so
/// conditions downstream fail cleanly instead of erroring.
pub struct AnswerManager<'a> {
    answers: &'a BTreeMap<String, Answer>,
    empty: Answer,
}

impl<'a> AnswerManager<'a> {
    pub fn new(bundle: &'a DocumentBundle) -> Self {
        Self {
            answers: &bundle.answers,
            empty: Answer::default(),
        }
    }

    /// The answer for `field`; an empty answer when absent.
    pub fn get(&self, field: &str) -> &Answer {
        self.answers.get(field).unwrap_or(&self.empty)
    }

    /// The raw answer value for `field`, empty string when absent.
    pub fn value(&self, field: &str) -> &str {
        self.get(field).text()
    }

    /// All extracted answers.
    pub fn mapping(&self) -> &'a BTreeMap<String, Answer> {
        self.answers
    }

    /// True when `field` was extracted with a non-blank value.
    pub fn has_value(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    /// Serializable view over a set of fields, in iteration order.
    pub fn build_schema_results<I, S>(&self, fields: I) -> Vec<SchemaResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = std::collections::BTreeSet::new();
        let mut results = Vec::new();
        for field in fields {
            let field = field.as_ref();
            if !seen.insert(field.to_string()) {
                continue;
            }
            let answer = self.get(field);
            results.push(SchemaResult {
                name: field.to_string(),
                value: answer.value.clone(),
                outlines: answer.outlines.clone(),
            });
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Mold;

    fn bundle() -> DocumentBundle {
        let mut answers = BTreeMap::new();
        answers.insert(
            "运作方式".to_string(),
            Answer {
                value: Some("开放式".to_string()),
                outlines: Outlines::new(),
            },
        );
        answers.insert(
            "空字段".to_string(),
            Answer {
                value: Some("  ".to_string()),
                outlines: Outlines::new(),
            },
        );
        DocumentBundle {
            fid: "doc".into(),
            mold: Mold::PublicFund,
            paragraphs: Vec::new(),
            chapters: Vec::new(),
            answers,
        }
    }

    #[test]
    fn missing_field_resolves_empty() {
        let bundle = bundle();
        let manager = AnswerManager::new(&bundle);
        assert_eq!(manager.value("不存在"), "");
        assert!(!manager.has_value("不存在"));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let bundle = bundle();
        let manager = AnswerManager::new(&bundle);
        assert!(!manager.has_value("空字段"));
        assert!(manager.has_value("运作方式"));
    }

    #[test]
    fn schema_results_deduplicate() {
        let bundle = bundle();
        let manager = AnswerManager::new(&bundle);
        let results = manager.build_schema_results(["运作方式", "运作方式", "缺失"]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "运作方式");
        assert_eq!(results[1].value, None);
    }
}
