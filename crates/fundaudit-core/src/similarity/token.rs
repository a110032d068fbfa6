//! Sentence tokenization for the diff: plain characters plus collapsed
//! equivalence tokens.
//!
//! Before two sentences diff against each other, spans matched by a
//! synonym class or by an enabled convert type collapse into single
//! tokens. Two synonym tokens of the same class compare equal regardless
//! of surface text (the equivalence is transitive within a class); two
//! convert tokens compare equal when their canonical values agree, which
//! merges "百分之五" with "5%" and "二〇二三年" with "2023年".

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::numeric::{cn_number_to_digit, DateUtil, PercentageUtil};
use crate::pattern::{P_DATE, P_NUMBER, P_PERCENTAGE};

/// Literal families the similarity engine may normalize before
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvertType {
    Number,
    Percentage,
    Date,
}

impl ConvertType {
    pub fn all() -> Vec<ConvertType> {
        vec![ConvertType::Percentage, ConvertType::Date, ConvertType::Number]
    }
}

/// A diff token: a single character, a synonym-class span, or a
/// normalized literal span.
#[derive(Debug, Clone)]
pub enum Token {
    Char(char),
    Synonym { class: usize, surface: String },
    Convert {
        kind: ConvertType,
        canon: String,
        surface: String,
    },
}

impl Token {
    /// Surface text, used for rendering and ratio weighting.
    pub fn surface(&self) -> String {
        match self {
            Token::Char(ch) => ch.to_string(),
            Token::Synonym { surface, .. } => surface.clone(),
            Token::Convert { surface, .. } => surface.clone(),
        }
    }

    /// Weight of this token in ratio computations: its surface width.
    pub fn weight(&self) -> usize {
        match self {
            Token::Char(_) => 1,
            Token::Synonym { surface, .. } => surface.chars().count(),
            Token::Convert { surface, .. } => surface.chars().count(),
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Char(a), Token::Char(b)) => a == b,
            (Token::Synonym { class: a, .. }, Token::Synonym { class: b, .. }) => a == b,
            (
                Token::Convert { kind: a, canon: ca, .. },
                Token::Convert { kind: b, canon: cb, .. },
            ) => a == b && ca == cb,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
}

fn overlaps(spans: &[(Span, Token)], start: usize, end: usize) -> bool {
    spans
        .iter()
        .any(|(span, _)| start < span.end && span.start < end)
}

fn canonical(kind: ConvertType, surface: &str) -> String {
    match kind {
        ConvertType::Percentage => {
            PercentageUtil::canonical(surface).unwrap_or_else(|| surface.to_string())
        }
        ConvertType::Date => DateUtil::to_human_date(surface),
        ConvertType::Number => cn_number_to_digit(surface)
            .map(|n| n.to_string())
            .unwrap_or_else(|| surface.to_string()),
    }
}

/// Tokenize a cleaned sentence.
///
/// Convert spans are collected first (percentage before date before
/// number, overlaps dropped), then synonym spans over the remaining
/// text, then single characters.
pub fn tokenize(cleaned: &str, synonyms: &[Regex], convert_types: &[ConvertType]) -> Vec<Token> {
    let mut spans: Vec<(Span, Token)> = Vec::new();

    let ordered = [ConvertType::Percentage, ConvertType::Date, ConvertType::Number];
    for kind in ordered {
        if !convert_types.contains(&kind) {
            continue;
        }
        let pattern = match kind {
            ConvertType::Percentage => &*P_PERCENTAGE,
            ConvertType::Date => &*P_DATE,
            ConvertType::Number => &*P_NUMBER,
        };
        for matched in pattern.find_all(cleaned) {
            if overlaps(&spans, matched.start(), matched.end()) {
                continue;
            }
            let surface = matched.as_str().to_string();
            spans.push((
                Span {
                    start: matched.start(),
                    end: matched.end(),
                },
                Token::Convert {
                    kind,
                    canon: canonical(kind, &surface),
                    surface,
                },
            ));
        }
    }

    for (class, pattern) in synonyms.iter().enumerate() {
        for matched in pattern.find_iter(cleaned) {
            if matched.start() == matched.end() {
                continue;
            }
            if overlaps(&spans, matched.start(), matched.end()) {
                continue;
            }
            spans.push((
                Span {
                    start: matched.start(),
                    end: matched.end(),
                },
                Token::Synonym {
                    class,
                    surface: matched.as_str().to_string(),
                },
            ));
        }
    }

    spans.sort_by_key(|(span, _)| span.start);

    let mut tokens = Vec::new();
    let mut cursor = 0;
    let mut span_iter = spans.into_iter().peekable();
    fn bytes_to_chars(s: &str) -> std::str::Chars<'_> {
        s.chars()
    }
    while cursor < cleaned.len() {
        if let Some((span, token)) = span_iter.peek() {
            if span.start == cursor {
                let end = span.end;
                tokens.push(token.clone());
                span_iter.next();
                cursor = end;
                continue;
            }
            let upto = span.start;
            for ch in bytes_to_chars(&cleaned[cursor..upto]) {
                tokens.push(Token::Char(ch));
            }
            cursor = upto;
        } else {
            for ch in bytes_to_chars(&cleaned[cursor..]) {
                tokens.push(Token::Char(ch));
            }
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_char_tokens() {
        let tokens = tokenize("基金合同", &[], &[]);
        assert_eq!(tokens.len(), 4);
        assert!(tokens.iter().all(|t| matches!(t, Token::Char(_))));
    }

    #[test]
    fn percentage_collapses_to_canonical() {
        let types = vec![ConvertType::Percentage];
        let left = tokenize("不低于5%", &[], &types);
        let right = tokenize("不低于百分之五", &[], &types);
        let left_last = left.last().unwrap();
        let right_last = right.last().unwrap();
        assert_eq!(left_last, right_last);
    }

    #[test]
    fn synonym_classes_compare_equal_and_transitively() {
        // equivalence within a class is transitive
        let synonyms = vec![Regex::new("基金管理人|管理人").unwrap()];
        let a = &tokenize("基金管理人", &synonyms, &[])[0];
        let b = &tokenize("管理人", &synonyms, &[])[0];
        assert_eq!(a, b);
        assert_eq!(b, a);
    }

    #[test]
    fn different_classes_are_not_equal() {
        let synonyms = vec![
            Regex::new("管理人").unwrap(),
            Regex::new("托管人").unwrap(),
        ];
        let a = &tokenize("管理人", &synonyms, &[])[0];
        let b = &tokenize("托管人", &synonyms, &[])[0];
        assert_ne!(a, b);
    }

    #[test]
    fn convert_beats_synonym_on_overlap() {
        let synonyms = vec![Regex::new("5%").unwrap()];
        let types = vec![ConvertType::Percentage];
        let tokens = tokenize("5%", &synonyms, &types);
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], Token::Convert { .. }));
    }

    #[test]
    fn weights_are_surface_widths() {
        let synonyms = vec![Regex::new("基金管理人").unwrap()];
        let tokens = tokenize("基金管理人同意", &synonyms, &[]);
        assert_eq!(tokens[0].weight(), 5);
        assert_eq!(tokens[1].weight(), 1);
    }
}
