//! Text canonicalization for CJK contract paragraphs.
//!
//! Raw paragraph text is kept untouched for display; all comparisons run
//! over the cleaned form produced here.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Dot-leader tail of a catalog line, e.g. "基金的投资......12".
    static ref IGNORE_TAIL: Regex = Regex::new(r"\.{6,}[0-9]+$").unwrap();

    /// Footnote / fragment markers occasionally glued to a paragraph tail.
    static ref FRAGMENT_MARK: Regex = Regex::new(r"[①-⑳]+$").unwrap();
}

/// Punctuation ignored by the similarity diff.
pub const PUNCTUATION_CHARS: &str = ",.．、？?，。！!“\"：:”'‘’ ;；";

/// Sentence terminators used when splitting paragraphs.
pub const SENTENCE_ENDS: &str = "。;；？:：\n";

/// Opening brackets treated as junk during comparison.
pub const BRACKETS_LEFT: &str = "[《<(（{【［「〖『〈«＜〔";

/// Closing brackets treated as junk during comparison.
pub const BRACKETS_RIGHT: &str = "]》>)）}】］」〗』〉»＞〕";

/// True when `ch` is comparison-junk punctuation.
pub fn is_punctuation(ch: char) -> bool {
    PUNCTUATION_CHARS.contains(ch)
}

/// True when `ch` is a bracket of either side.
pub fn is_bracket(ch: char) -> bool {
    BRACKETS_LEFT.contains(ch) || BRACKETS_RIGHT.contains(ch)
}

/// True when `ch` terminates a sentence.
pub fn is_sentence_end(ch: char) -> bool {
    SENTENCE_ENDS.contains(ch)
}

/// Fold a full-width ASCII variant to its half-width form.
///
/// CJK punctuation that carries distinct meaning (、 。 《 》) is left
/// alone; only the FF01..FF5E block and the ideographic space fold.
fn fold_char(ch: char) -> Option<char> {
    match ch {
        '\u{3000}' => Some(' '),
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(ch as u32 - 0xFF00 + 0x20),
        _ => Some(ch),
    }
}

/// Canonicalize a paragraph for comparison.
///
/// Trims surrounding whitespace, drops interior whitespace, folds
/// full-width ASCII variants and strips dot-leader / footnote tails.
pub fn clean_txt(text: &str) -> String {
    let text = IGNORE_TAIL.replace(text.trim(), "");
    let text = FRAGMENT_MARK.replace(&text, "");
    text.chars()
        .filter_map(fold_char)
        .filter(|ch| !ch.is_whitespace())
        .collect()
}

/// Canonicalize a chapter title: `clean_txt` plus leading serial-number
/// removal is handled by the chapter catalog, not here.
pub fn clean_title(title: &str) -> String {
    clean_txt(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_full_width_ascii() {
        assert_eq!(clean_txt("Ａ类１００％"), "A类100%");
        assert_eq!(clean_txt("Ｔ＋３日"), "T+3日");
    }

    #[test]
    fn strips_whitespace_everywhere() {
        assert_eq!(clean_txt("  基金 管理人\t托管人\n"), "基金管理人托管人");
        assert_eq!(clean_txt("基金\u{3000}合同"), "基金合同");
    }

    #[test]
    fn strips_catalog_dot_leader() {
        assert_eq!(clean_txt("基金的投资......12"), "基金的投资");
        // fewer than six dots is real text
        assert_eq!(clean_txt("比例为0.5"), "比例为0.5");
    }

    #[test]
    fn keeps_cjk_punctuation() {
        assert_eq!(clean_txt("股票、债券。"), "股票、债券。");
    }

    #[test]
    fn punctuation_classes() {
        assert!(is_punctuation('，'));
        assert!(is_punctuation('.'));
        assert!(!is_punctuation('股'));
        assert!(is_bracket('（'));
        assert!(is_sentence_end('；'));
    }
}
