//! Sentence splitting and cleaning for the similarity diff.

use crate::document::{Outlines, Paragraph, ParagraphKind};
use crate::pattern::{P_DATE, P_NUMBERING};
use crate::text::{clean_txt, is_bracket, is_punctuation, is_sentence_end};

/// Where a sentence block came from; table rows keep their row index so
/// grouping can tell rows of the same table apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Paragraph,
    TableRow(usize),
}

/// A source block fed into the similarity engine: one template paragraph
/// or one document paragraph (tables expand to one block per row).
#[derive(Debug, Clone)]
pub struct SentenceBlock {
    pub text: String,
    pub para_index: usize,
    pub kind: SourceKind,
    pub outlines: Outlines,
}

impl SentenceBlock {
    /// Blocks from plain template strings.
    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Vec<SentenceBlock> {
        texts
            .iter()
            .enumerate()
            .map(|(idx, text)| SentenceBlock {
                text: text.as_ref().to_string(),
                para_index: idx,
                kind: SourceKind::Paragraph,
                outlines: Outlines::new(),
            })
            .collect()
    }

    /// Blocks from document paragraphs; tables split into rows.
    pub fn from_paragraphs(paragraphs: &[&Paragraph]) -> Vec<SentenceBlock> {
        let mut blocks = Vec::new();
        for paragraph in paragraphs {
            match paragraph.kind {
                ParagraphKind::Paragraph => blocks.push(SentenceBlock {
                    text: paragraph.text.clone(),
                    para_index: paragraph.index,
                    kind: SourceKind::Paragraph,
                    outlines: paragraph.outlines.clone(),
                }),
                ParagraphKind::Table => {
                    for (row, text) in paragraph.rows.iter().enumerate() {
                        blocks.push(SentenceBlock {
                            text: text.clone(),
                            para_index: paragraph.index,
                            kind: SourceKind::TableRow(row),
                            outlines: paragraph.outlines.clone(),
                        });
                    }
                }
            }
        }
        blocks
    }
}

/// One sentence of a block, with its cleaned comparison text.
#[derive(Debug, Clone)]
pub struct Sentence {
    /// Global sentence index across the whole side.
    pub index: usize,
    pub para_index: usize,
    pub kind: SourceKind,
    /// Position within the owning block.
    pub sentence_index: usize,
    /// Raw sentence text without its terminator.
    pub text: String,
    /// The terminator that ended this sentence ("" for the last one).
    pub ends: String,
    /// Junk-stripped text used for comparison.
    pub cleaned: String,
    pub outlines: Outlines,
}

impl Sentence {
    pub fn origin_text(&self) -> String {
        format!("{}{}", self.text, self.ends)
    }

    pub fn same_source(&self, other: &Sentence) -> bool {
        self.para_index == other.para_index && self.kind == other.kind
    }
}

/// Remove comparison-junk characters. A dot between two digits survives
/// so decimal literals stay intact.
fn strip_junk(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut cleaned = String::new();
    for (idx, &ch) in chars.iter().enumerate() {
        if ch == '\n' {
            continue;
        }
        if is_punctuation(ch) || is_bracket(ch) {
            let decimal_dot = (ch == '.' || ch == '．')
                && idx > 0
                && idx + 1 < chars.len()
                && chars[idx - 1].is_ascii_digit()
                && chars[idx + 1].is_ascii_digit();
            if !decimal_dot {
                continue;
            }
        }
        cleaned.push(ch);
    }
    cleaned
}

/// Strip a leading numbering prefix unless it is actually part of a
/// date.
fn strip_numbering(text: &str) -> &str {
    if let Some(matched) = P_NUMBERING.find(text) {
        if let Some(date) = P_DATE.find(text) {
            if date.start() <= matched.end() && matched.end() <= date.end() {
                return text;
            }
        }
        return &text[matched.end()..];
    }
    text
}

/// Split blocks into sentences.
///
/// With `split=false` each block yields exactly one sentence. Leading
/// numbering is recognized and removed from the comparison text when
/// `ignore_numbering` is set, so regenerated serials do not cause false
/// diffs.
pub fn create_sentences(
    blocks: &[SentenceBlock],
    ignore_numbering: bool,
    split: bool,
) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut total = 0;
    for block in blocks {
        let normalized = clean_txt(&block.text);
        let pieces: Vec<(String, String)> = if split {
            split_block(&normalized)
        } else {
            vec![(normalized.clone(), String::new())]
        };
        for (sentence_index, (text, ends)) in pieces.into_iter().enumerate() {
            let base = if ignore_numbering && sentence_index == 0 {
                strip_numbering(&text)
            } else {
                &text
            };
            let cleaned = strip_junk(base);
            sentences.push(Sentence {
                index: total,
                para_index: block.para_index,
                kind: block.kind,
                sentence_index,
                text,
                ends,
                cleaned,
                outlines: block.outlines.clone(),
            });
            total += 1;
        }
    }
    sentences
}

/// Split a block at sentence terminators, keeping each terminator run
/// with its sentence. Blank sentences between consecutive terminators
/// are dropped.
fn split_block(text: &str) -> Vec<(String, String)> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut ends = String::new();
    for ch in text.chars() {
        if is_sentence_end(ch) {
            ends.push(ch);
        } else {
            if !ends.is_empty() {
                if !current.is_empty() {
                    pieces.push((current.clone(), ends.clone()));
                }
                current.clear();
                ends.clear();
            }
            current.push(ch);
        }
    }
    if !current.is_empty() || !ends.is_empty() {
        pieces.push((current, ends));
    }
    if pieces.is_empty() {
        pieces.push((String::new(), String::new()));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(block: &str) -> Vec<Sentence> {
        create_sentences(&SentenceBlock::from_texts(&[block]), true, true)
    }

    #[test]
    fn splits_on_terminators() {
        let sentences = texts("第一句。第二句；第三句");
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0].text, "第一句");
        assert_eq!(sentences[0].ends, "。");
        assert_eq!(sentences[2].ends, "");
    }

    #[test]
    fn strips_leading_numbering() {
        let sentences = texts("（一）基金托管人的职责");
        assert_eq!(sentences[0].cleaned, "基金托管人的职责");
    }

    #[test]
    fn keeps_date_looking_prefix() {
        let sentences = texts("2023年6月1日起施行");
        assert!(sentences[0].cleaned.starts_with("2023年"));
    }

    #[test]
    fn strips_punctuation_but_keeps_decimal_dot() {
        let sentences = texts("费率为0.25，按日计提");
        assert_eq!(sentences[0].cleaned, "费率为0.25按日计提");
    }

    #[test]
    fn table_rows_become_blocks() {
        use crate::document::Paragraph;
        let table = Paragraph {
            index: 7,
            page: 2,
            text: String::new(),
            kind: ParagraphKind::Table,
            rows: vec!["行一".into(), "行二".into()],
            fragment: false,
            outlines: Outlines::new(),
        };
        let blocks = SentenceBlock::from_paragraphs(&[&table]);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, SourceKind::TableRow(0));
        assert_eq!(blocks[1].para_index, 7);
    }

    #[test]
    fn unsplit_mode_yields_one_sentence() {
        let sentences = create_sentences(
            &SentenceBlock::from_texts(&["第一句。第二句"]),
            true,
            false,
        );
        assert_eq!(sentences.len(), 1);
    }
}
