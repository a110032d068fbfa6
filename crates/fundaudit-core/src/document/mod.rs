//! Parsed-document model.
//!
//! The engine does not parse PDFs; it consumes a *bundle* produced by an
//! external reader: ordered paragraphs with positional metadata, the
//! chapter tree, and pre-extracted answer fields. Bundles load from YAML
//! or JSON and validate against `spec/document.schema.json`.

pub mod answers;
pub mod reader;
pub mod schema;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::Mold;

pub use answers::AnswerManager;
pub use reader::Reader;

/// Page → bounding boxes, the display evidence for a span of text.
pub type Outlines = BTreeMap<u32, Vec<[f64; 4]>>;

/// Errors raised while loading a document bundle.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read bundle file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bundle schema validation failed: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error("invalid bundle: {0}")]
    Invalid(String),
}

/// Element kind of a paragraph record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphKind {
    #[default]
    Paragraph,
    Table,
}

/// One parsed element, immutable after parse. `index` is monotone in
/// document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub index: usize,
    #[serde(default)]
    pub page: u32,
    pub text: String,
    #[serde(default)]
    pub kind: ParagraphKind,
    /// Table rows, present when `kind == Table`.
    #[serde(default)]
    pub rows: Vec<String>,
    /// True for OCR fragments glued to the tail of a real paragraph.
    #[serde(default)]
    pub fragment: bool,
    #[serde(default)]
    pub outlines: Outlines,
}

impl Paragraph {
    pub fn is_paragraph(&self) -> bool {
        self.kind == ParagraphKind::Paragraph
    }
}

/// A chapter node. Contains paragraphs whose index lies in `range`
/// (half-open, starting at the title element).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// Paragraph index of the title element.
    pub element_index: usize,
    pub title: String,
    /// Half-open paragraph-index range covered by this chapter.
    pub range: (usize, usize),
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub children: Vec<usize>,
}

/// An externally extracted answer field. Consumed read-only.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Answer {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub outlines: Outlines,
}

impl Answer {
    pub fn text(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.value.as_deref().map(str::trim).unwrap_or("").is_empty()
    }
}

/// The full engine input for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentBundle {
    /// Document identifier, echoed into every result.
    pub fid: String,
    pub mold: Mold,
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub answers: BTreeMap<String, Answer>,
}

impl DocumentBundle {
    /// Parse a bundle from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, DocumentError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        schema::validate_bundle_schema(&value).map_err(DocumentError::Schema)?;
        let bundle: DocumentBundle = serde_json::from_value(value)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Parse a bundle from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        schema::validate_bundle_schema(&value).map_err(DocumentError::Schema)?;
        let bundle: DocumentBundle = serde_json::from_value(value)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Load a bundle from disk, dispatching on the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Structural checks the schema cannot express.
    fn validate(&self) -> Result<(), DocumentError> {
        for pair in self.paragraphs.windows(2) {
            if pair[1].index <= pair[0].index {
                return Err(DocumentError::Invalid(format!(
                    "paragraph indexes must be strictly increasing, got {} after {}",
                    pair[1].index, pair[0].index
                )));
            }
        }
        for (idx, chapter) in self.chapters.iter().enumerate() {
            if chapter.range.1 < chapter.range.0 {
                return Err(DocumentError::Invalid(format!(
                    "chapter {idx} has an inverted range"
                )));
            }
            if let Some(parent) = chapter.parent {
                if parent >= self.chapters.len() {
                    return Err(DocumentError::Invalid(format!(
                        "chapter {idx} points at missing parent {parent}"
                    )));
                }
            }
            for &child in &chapter.children {
                if child >= self.chapters.len() {
                    return Err(DocumentError::Invalid(format!(
                        "chapter {idx} points at missing child {child}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Merge the outlines of several paragraphs.
pub fn merge_outlines<'a, I>(paragraphs: I) -> Outlines
where
    I: IntoIterator<Item = &'a Paragraph>,
{
    let mut merged: Outlines = BTreeMap::new();
    for paragraph in paragraphs {
        for (page, boxes) in &paragraph.outlines {
            merged.entry(*page).or_default().extend(boxes.iter().copied());
        }
    }
    merged
}

/// The smallest page in an outline set; 0 when unknown.
pub fn min_page(outlines: &Outlines) -> u32 {
    outlines.keys().next().copied().unwrap_or(0)
}

fn boxes_overlap(a: &[f64; 4], b: &[f64; 4]) -> bool {
    a[0] < b[2] && b[0] < a[2] && a[1] < b[3] && b[1] < a[3]
}

/// True when the two outline sets share a page with intersecting boxes.
pub fn outlines_overlap(left: &Outlines, right: &Outlines) -> bool {
    for (page, left_boxes) in left {
        let Some(right_boxes) = right.get(page) else {
            continue;
        };
        for a in left_boxes {
            if right_boxes.iter().any(|b| boxes_overlap(a, b)) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
fid: "doc-1"
mold: public_fund
paragraphs:
  - index: 0
    page: 1
    text: "基金合同"
  - index: 1
    page: 1
    text: "第一部分 前言"
chapters:
  - element_index: 1
    title: "第一部分 前言"
    range: [1, 2]
answers:
  运作方式:
    value: "开放式"
"#
    }

    #[test]
    fn parses_minimal_bundle() {
        let bundle = DocumentBundle::from_yaml(minimal_yaml()).unwrap();
        assert_eq!(bundle.fid, "doc-1");
        assert_eq!(bundle.paragraphs.len(), 2);
        assert_eq!(bundle.answers["运作方式"].text(), "开放式");
    }

    #[test]
    fn rejects_unsorted_paragraphs() {
        let yaml = r#"
fid: "doc-1"
mold: public_fund
paragraphs:
  - index: 1
    text: "b"
  - index: 0
    text: "a"
"#;
        assert!(matches!(
            DocumentBundle::from_yaml(yaml),
            Err(DocumentError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_missing_required_fields() {
        let yaml = r#"
mold: public_fund
paragraphs: []
"#;
        assert!(matches!(
            DocumentBundle::from_yaml(yaml),
            Err(DocumentError::Schema(_))
        ));
    }

    #[test]
    fn outline_helpers() {
        let mut paragraph = Paragraph {
            index: 0,
            page: 3,
            text: String::new(),
            kind: ParagraphKind::Paragraph,
            rows: Vec::new(),
            fragment: false,
            outlines: BTreeMap::new(),
        };
        paragraph.outlines.insert(3, vec![[0.0, 0.0, 1.0, 1.0]]);
        let merged = merge_outlines([&paragraph]);
        assert_eq!(min_page(&merged), 3);
    }
}
