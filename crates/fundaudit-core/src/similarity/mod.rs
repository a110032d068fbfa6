//! Paragraph similarity: a weighted sentence-level diff between a list
//! of template sentences (left) and a slice of document paragraphs
//! (right).
//!
//! Pipeline: split both sides into sentences, score every admissible
//! (left, right) pair with a token diff (synonym classes and enabled
//! convert types collapse before diffing), select the best monotone
//! pairing, then render unmatched sentences as DELETE/INSERT rows and
//! group rows by source paragraph. All derived predicates and ratios
//! work off that grouped rendering.

pub mod diff;
pub mod sentence;
pub mod token;

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;

pub use diff::{diff_slices, DiffOp, Edit};
pub use sentence::{create_sentences, Sentence, SentenceBlock, SourceKind};
pub use token::{tokenize, ConvertType, Token};

use crate::document::Outlines;
use crate::text::is_punctuation;

/// Hard floor under which a (left, right) pair is never attempted.
const MIN_RATIO_FLOOR: f64 = 0.5;

const FULL_MATCH_EPS: f64 = 1e-6;

/// Options controlling one similarity run.
#[derive(Debug, Clone)]
pub struct SimilarityOptions {
    /// Admission threshold for a sentence pairing.
    pub min_ratio: f64,
    /// Strip leading numbering before comparison.
    pub ignore_numbering: bool,
    /// Render document sentences before/after the matched span.
    pub fill_paragraph: bool,
    /// Drop interior document paragraphs that match nothing.
    pub ignore_extra_para: bool,
    /// Split blocks into sentences at 。;；？:： boundaries.
    pub split_sentence: bool,
    /// Synonym equivalence classes.
    pub synonyms: Vec<Regex>,
    /// Literal families normalized before comparison.
    pub convert_types: Vec<ConvertType>,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self {
            min_ratio: 0.7,
            ignore_numbering: true,
            fill_paragraph: false,
            ignore_extra_para: false,
            split_sentence: true,
            synonyms: Vec::new(),
            convert_types: Vec::new(),
        }
    }
}

/// One rendered diff fragment.
#[derive(Debug, Clone, Serialize)]
pub struct DiffFrame {
    pub op: DiffOp,
    pub text: String,
}

/// One row of the diff: a matched sentence pair, or an unmatched
/// sentence on either side.
#[derive(Debug, Clone)]
pub struct DiffPair {
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub ratio: f64,
    pub frames: Vec<DiffFrame>,
    /// Comparison weight: cleaned widths of both sides.
    weight: usize,
}

impl DiffPair {
    pub fn is_full_matched(&self) -> bool {
        (self.ratio - 1.0).abs() < FULL_MATCH_EPS
    }

    pub fn is_matched(&self) -> bool {
        self.ratio > 0.0
    }
}

/// Compact rendering of one diff group, for callers that display the
/// verdict.
#[derive(Debug, Clone, Serialize)]
pub struct SimpleDiff {
    pub html: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub left: String,
    pub right: Option<String>,
}

/// True when every row of `results` is a full match.
pub fn judge_is_full_matched(results: &[DiffPair]) -> bool {
    !results.is_empty() && results.iter().all(DiffPair::is_full_matched)
}

/// True when any row of `results` matched at all.
pub fn judge_is_matched(results: &[DiffPair]) -> bool {
    results.iter().any(DiffPair::is_matched)
}

/// Weighted average ratio over one group of rows.
pub fn calc_weighted_ratio(results: &[DiffPair]) -> f64 {
    let total: usize = results.iter().map(|r| r.weight).sum();
    if total == 0 {
        return 0.0;
    }
    results.iter().map(|r| r.ratio * r.weight as f64).sum::<f64>() / total as f64
}

pub struct ParagraphSimilarity {
    options: SimilarityOptions,
    sentences_left: Vec<Sentence>,
    sentences_right: Vec<Sentence>,
    pub results: Vec<DiffPair>,
    groups: Vec<Vec<usize>>,
}

impl ParagraphSimilarity {
    pub fn new(
        left: Vec<SentenceBlock>,
        right: Vec<SentenceBlock>,
        options: SimilarityOptions,
    ) -> Self {
        let sentences_left = create_sentences(&left, options.ignore_numbering, options.split_sentence);
        let sentences_right =
            create_sentences(&right, options.ignore_numbering, options.split_sentence);
        let mut similarity = Self {
            options,
            sentences_left,
            sentences_right,
            results: Vec::new(),
            groups: Vec::new(),
        };
        similarity.run();
        similarity
    }

    /// Diff two single texts without sentence splitting.
    pub fn compare_two_text(left: &str, right: &str) -> DiffPair {
        let mut options = SimilarityOptions::default();
        options.split_sentence = false;
        options.min_ratio = 0.0;
        let similarity = Self::new(
            SentenceBlock::from_texts(&[left]),
            SentenceBlock::from_texts(&[right]),
            options,
        );
        similarity
            .results
            .into_iter()
            .find(|pair| pair.left.is_some())
            .unwrap_or(DiffPair {
                left: None,
                right: None,
                ratio: 0.0,
                frames: Vec::new(),
                weight: 0,
            })
    }

    fn run(&mut self) {
        let scored = self.score_pairs();
        let chain = select_chain(&scored);
        self.results = self.render(scored, chain);
        self.groups = self.group_results();
        if self.options.ignore_extra_para {
            self.drop_extra_groups();
        }
    }

    // ------------------------------------------------------------------
    // pair scoring
    // ------------------------------------------------------------------

    fn score_pairs(&self) -> Vec<ScoredPair> {
        let mut scored = Vec::new();
        let floor = MIN_RATIO_FLOOR.min(self.options.min_ratio);
        for left in &self.sentences_left {
            let left_len = left.cleaned.chars().count();
            if left_len == 0 {
                continue;
            }
            for right in &self.sentences_right {
                let right_len = right.cleaned.chars().count();
                if right_len == 0 {
                    continue;
                }
                let (short, long) = if left_len < right_len {
                    (left_len, right_len)
                } else {
                    (right_len, left_len)
                };
                // substring containment is always a full match
                if right.cleaned.contains(&left.cleaned) {
                    scored.push(ScoredPair {
                        left: left.index,
                        right: right.index,
                        ratio: 1.0,
                        frames: vec![DiffFrame {
                            op: DiffOp::Equal,
                            text: right.origin_text(),
                        }],
                        weight: left_len + right_len,
                    });
                    continue;
                }
                if (short as f64) / (long as f64) < floor {
                    continue;
                }
                let Some((ratio, frames)) = self.diff_pair(left, right) else {
                    continue;
                };
                if ratio < self.options.min_ratio {
                    continue;
                }
                scored.push(ScoredPair {
                    left: left.index,
                    right: right.index,
                    ratio,
                    frames,
                    weight: left_len + right_len,
                });
            }
        }
        scored
    }

    fn diff_pair(&self, left: &Sentence, right: &Sentence) -> Option<(f64, Vec<DiffFrame>)> {
        let left_tokens = tokenize(
            &left.cleaned,
            &self.options.synonyms,
            &self.options.convert_types,
        );
        let right_tokens = tokenize(
            &right.cleaned,
            &self.options.synonyms,
            &self.options.convert_types,
        );
        let mut edits = diff_slices(&left_tokens, &right_tokens);
        fix_tail_punctuation(&mut edits, &left_tokens, &right_tokens);

        let left_weight: usize = left_tokens.iter().map(Token::weight).sum();
        let right_weight: usize = right_tokens.iter().map(Token::weight).sum();
        let mut equal_weight = 0usize;
        let mut frames: Vec<DiffFrame> = Vec::new();
        let push = |op: DiffOp, text: String, frames: &mut Vec<DiffFrame>| {
            if let Some(last) = frames.last_mut() {
                if last.op == op {
                    last.text.push_str(&text);
                    return;
                }
            }
            frames.push(DiffFrame { op, text });
        };
        for edit in &edits {
            match edit {
                Edit::Equal { left: l, right: r } => {
                    equal_weight += left_tokens[*l].weight() + right_tokens[*r].weight();
                    push(DiffOp::Equal, right_tokens[*r].surface(), &mut frames);
                }
                Edit::Delete { left: l } => {
                    push(DiffOp::Delete, left_tokens[*l].surface(), &mut frames)
                }
                Edit::Insert { right: r } => {
                    push(DiffOp::Insert, right_tokens[*r].surface(), &mut frames)
                }
            }
        }
        if left_weight + right_weight == 0 {
            return Some((1.0, frames));
        }
        let all_equal = edits
            .iter()
            .all(|edit| matches!(edit, Edit::Equal { .. }));
        let ratio = if all_equal {
            1.0
        } else {
            equal_weight as f64 / (left_weight + right_weight) as f64
        };
        Some((ratio, frames))
    }

    // ------------------------------------------------------------------
    // rendering
    // ------------------------------------------------------------------

    fn render(&self, scored: Vec<ScoredPair>, chain: Vec<usize>) -> Vec<DiffPair> {
        let mut results = Vec::new();
        let mut prev_left: Option<usize> = None;
        let mut prev_right: Option<usize> = None;

        let chain_pairs: Vec<&ScoredPair> = chain.iter().map(|&idx| &scored[idx]).collect();

        for (pos, pair) in chain_pairs.iter().enumerate() {
            let left_from = prev_left.map(|l| l + 1).unwrap_or(0);
            for sentence in self
                .sentences_left
                .iter()
                .filter(|s| s.index >= left_from && s.index < pair.left)
            {
                results.push(unmatched_left(sentence));
            }
            let right_from = prev_right.map(|r| r + 1).unwrap_or(0);
            let leading = pos == 0;
            if !leading || self.options.fill_paragraph {
                for sentence in self
                    .sentences_right
                    .iter()
                    .filter(|s| s.index >= right_from && s.index < pair.right)
                {
                    results.push(unmatched_right(sentence));
                }
            }
            results.push(DiffPair {
                left: Some(pair.left),
                right: Some(pair.right),
                ratio: pair.ratio,
                frames: pair.frames.clone(),
                weight: pair.weight.max(1),
            });
            prev_left = Some(pair.left);
            prev_right = Some(pair.right);
        }

        let left_from = prev_left.map(|l| l + 1).unwrap_or(0);
        for sentence in self.sentences_left.iter().filter(|s| s.index >= left_from) {
            results.push(unmatched_left(sentence));
        }
        if self.options.fill_paragraph {
            let right_from = prev_right.map(|r| r + 1).unwrap_or(0);
            for sentence in self.sentences_right.iter().filter(|s| s.index >= right_from) {
                results.push(unmatched_right(sentence));
            }
        }
        results
    }

    // ------------------------------------------------------------------
    // grouping
    // ------------------------------------------------------------------

    fn group_results(&self) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut current_source: Option<usize> = None;
        for (idx, result) in self.results.iter().enumerate() {
            match result.right {
                Some(right_idx) => {
                    let sentence = &self.sentences_right[right_idx];
                    let same = current_source
                        .map(|src| self.sentences_right[src].same_source(sentence))
                        .unwrap_or(false);
                    if !same && current_source.is_some() {
                        groups.push(std::mem::take(&mut current));
                    }
                    current_source = Some(right_idx);
                    current.push(idx);
                }
                None => current.push(idx),
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }

    /// Drop interior groups that are pure INSERT noise (unmatched
    /// document paragraphs sandwiched between matched content).
    fn drop_extra_groups(&mut self) {
        if self.groups.len() <= 2 {
            return;
        }
        let last = self.groups.len() - 1;
        let results = &self.results;
        let keep: Vec<Vec<usize>> = self
            .groups
            .iter()
            .enumerate()
            .filter(|(idx, group)| {
                if *idx == 0 || *idx == last {
                    return true;
                }
                let pure_insert = group.iter().all(|&i| {
                    let row = &results[i];
                    row.left.is_none() && row.right.is_some() && row.ratio == 0.0
                });
                !pure_insert
            })
            .map(|(_, group)| group.clone())
            .collect();
        self.groups = keep;
    }

    // ------------------------------------------------------------------
    // derived predicates & accessors
    // ------------------------------------------------------------------

    pub fn valid_sentences_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.left.is_some() && r.right.is_some())
            .count()
    }

    /// Mean over groups of the per-group weighted ratio.
    pub fn weighted_average_ratio(&self) -> f64 {
        if self.groups.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .groups
            .iter()
            .map(|group| {
                let rows: Vec<DiffPair> = group.iter().map(|&i| self.results[i].clone()).collect();
                calc_weighted_ratio(&rows)
            })
            .sum();
        sum / self.groups.len() as f64
    }

    pub fn max_ratio(&self) -> f64 {
        self.weighted_average_ratio()
    }

    /// Every row (including unmatched ones) is a full match.
    pub fn is_full_matched(&self) -> bool {
        judge_is_full_matched(&self.results)
    }

    /// Full match ignoring extra document paragraphs (those dropped by
    /// the grouping when `ignore_extra_para` is on).
    pub fn is_full_matched_without_extra_para(&self) -> bool {
        if self.groups.is_empty() {
            return false;
        }
        self.groups
            .iter()
            .all(|group| group.iter().all(|&i| self.results[i].is_full_matched()))
    }

    /// Full matches form one contiguous run; everything else is an
    /// unmatched document sentence.
    pub fn is_full_matched_or_contain(&self) -> bool {
        let mut prev: Option<usize> = None;
        let mut any = false;
        for (idx, row) in self.results.iter().enumerate() {
            if row.is_full_matched() {
                if let Some(p) = prev {
                    if p + 1 != idx {
                        return false;
                    }
                }
                prev = Some(idx);
                any = true;
            } else if row.is_matched() {
                return false;
            } else if row.right.is_none() {
                return false;
            }
        }
        any
    }

    /// Overall verdict: weighted average ratio clears the threshold.
    pub fn is_matched(&self) -> bool {
        !self.results.is_empty() && self.weighted_average_ratio() >= self.options.min_ratio
    }

    pub fn left_content(&self) -> String {
        self.groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .filter_map(|&i| self.results[i].left)
                    .map(|idx| self.sentences_left[idx].origin_text())
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn right_content(&self) -> String {
        self.groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .filter_map(|&i| self.results[i].right)
                    .map(|idx| self.sentences_right[idx].origin_text())
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Outlines of every document paragraph that appears in the diff.
    pub fn right_outlines(&self) -> Outlines {
        let mut merged: Outlines = BTreeMap::new();
        let mut seen = std::collections::BTreeSet::new();
        for row in &self.results {
            let Some(right_idx) = row.right else { continue };
            let sentence = &self.sentences_right[right_idx];
            if !seen.insert((sentence.para_index, sentence.kind_key())) {
                continue;
            }
            for (page, boxes) in &sentence.outlines {
                merged.entry(*page).or_default().extend(boxes.iter().copied());
            }
        }
        merged
    }

    /// Compact per-group rendering.
    pub fn simple_results(&self) -> Vec<SimpleDiff> {
        let mut rendered = Vec::new();
        for group in &self.groups {
            let rows: Vec<&DiffPair> = group.iter().map(|&i| &self.results[i]).collect();
            let count = rows.len();
            let add = rows
                .iter()
                .filter(|r| r.left.is_none() && !r.is_matched())
                .count();
            let del = rows
                .iter()
                .filter(|r| r.right.is_none() && !r.is_matched())
                .count();
            let partial = rows
                .iter()
                .filter(|r| r.left.is_some() && r.right.is_some() && !r.is_full_matched())
                .count();
            let kind = if add == count {
                "add"
            } else if del == count {
                "del"
            } else if add == 0 && del == 0 && partial == 0 {
                "equal"
            } else {
                "match"
            };
            let left: String = rows
                .iter()
                .filter_map(|r| r.left)
                .map(|idx| self.sentences_left[idx].origin_text())
                .collect();
            let right: String = rows
                .iter()
                .filter_map(|r| r.right)
                .map(|idx| self.sentences_right[idx].origin_text())
                .collect();
            let html: String = rows
                .iter()
                .flat_map(|r| r.frames.iter())
                .map(|frame| match frame.op {
                    DiffOp::Equal => frame.text.clone(),
                    DiffOp::Insert => format!("<u>{}</u>", frame.text),
                    DiffOp::Delete => format!("<s>{}</s>", frame.text),
                })
                .collect();
            rendered.push(SimpleDiff {
                html,
                kind: kind.to_string(),
                left,
                right: if kind == "equal" { None } else { Some(right) },
            });
        }
        rendered
    }

    /// Left text, right text and outlines of one row group.
    pub fn group_contents(&self, rows: &[DiffPair]) -> (String, String, Outlines) {
        let left: String = rows
            .iter()
            .filter_map(|r| r.left)
            .map(|idx| self.sentences_left[idx].origin_text())
            .collect();
        let right: String = rows
            .iter()
            .filter_map(|r| r.right)
            .map(|idx| self.sentences_right[idx].origin_text())
            .collect();
        let mut outlines: Outlines = BTreeMap::new();
        for row in rows {
            let Some(right_idx) = row.right else { continue };
            for (page, boxes) in &self.sentences_right[right_idx].outlines {
                outlines.entry(*page).or_default().extend(boxes.iter().copied());
            }
        }
        (left, right, outlines)
    }

    /// Matched rows grouped by document paragraph, for rules where one
    /// template sentence may legitimately occur several times.
    pub fn results_by_paragraph(&self) -> Vec<(usize, Vec<DiffPair>)> {
        let mut by_para: Vec<(usize, Vec<DiffPair>)> = Vec::new();
        for group in &self.groups {
            let rights: Vec<usize> = group
                .iter()
                .filter_map(|&i| self.results[i].right)
                .collect();
            let Some(&first) = rights.first() else { continue };
            let para_index = self.sentences_right[first].para_index;
            let rows: Vec<DiffPair> = group.iter().map(|&i| self.results[i].clone()).collect();
            by_para.push((para_index, rows));
        }
        by_para
    }
}

impl Sentence {
    fn kind_key(&self) -> usize {
        match self.kind {
            SourceKind::Paragraph => usize::MAX,
            SourceKind::TableRow(row) => row,
        }
    }
}

#[derive(Debug, Clone)]
struct ScoredPair {
    left: usize,
    right: usize,
    ratio: f64,
    frames: Vec<DiffFrame>,
    weight: usize,
}

fn unmatched_left(sentence: &Sentence) -> DiffPair {
    let empty = sentence.cleaned.is_empty();
    DiffPair {
        left: Some(sentence.index),
        right: None,
        ratio: if empty { 1.0 } else { 0.0 },
        frames: vec![DiffFrame {
            op: if empty { DiffOp::Equal } else { DiffOp::Delete },
            text: sentence.origin_text(),
        }],
        weight: sentence.cleaned.chars().count().max(1),
    }
}

fn unmatched_right(sentence: &Sentence) -> DiffPair {
    let empty = sentence.cleaned.is_empty();
    DiffPair {
        left: None,
        right: Some(sentence.index),
        ratio: if empty { 1.0 } else { 0.0 },
        frames: vec![DiffFrame {
            op: if empty { DiffOp::Equal } else { DiffOp::Insert },
            text: sentence.origin_text(),
        }],
        weight: sentence.cleaned.chars().count().max(1),
    }
}

/// Select the monotone pairing chain with the greatest total ratio.
/// Deterministic: ties keep the earliest candidate.
fn select_chain(scored: &[ScoredPair]) -> Vec<usize> {
    if scored.is_empty() {
        return Vec::new();
    }
    let mut order: Vec<usize> = (0..scored.len()).collect();
    order.sort_by_key(|&i| (scored[i].left, scored[i].right));

    let mut best: Vec<f64> = vec![0.0; order.len()];
    let mut prev: Vec<Option<usize>> = vec![None; order.len()];
    for i in 0..order.len() {
        let pair = &scored[order[i]];
        best[i] = pair.ratio;
        for j in 0..i {
            let earlier = &scored[order[j]];
            if earlier.left < pair.left
                && earlier.right < pair.right
                && best[j] + pair.ratio > best[i]
            {
                best[i] = best[j] + pair.ratio;
                prev[i] = Some(j);
            }
        }
    }
    let mut end = 0;
    for i in 1..order.len() {
        if best[i] > best[end] {
            end = i;
        }
    }
    let mut chain = Vec::new();
    let mut cursor = Some(end);
    while let Some(i) = cursor {
        chain.push(order[i]);
        cursor = prev[i];
    }
    chain.reverse();
    chain
}

/// Tail-punctuation fix: a single trailing non-EQUAL punctuation token
/// right after an EQUAL non-punctuation token upgrades to EQUAL. This
/// suppresses spurious conflicts at clause boundaries.
fn fix_tail_punctuation(edits: &mut [Edit], left_tokens: &[Token], right_tokens: &[Token]) {
    let len = edits.len();
    if len < 2 {
        return;
    }
    let tail_char = |edit: &Edit| -> Option<char> {
        match edit {
            Edit::Delete { left } => match &left_tokens[*left] {
                Token::Char(ch) => Some(*ch),
                _ => None,
            },
            Edit::Insert { right } => match &right_tokens[*right] {
                Token::Char(ch) => Some(*ch),
                _ => None,
            },
            Edit::Equal { .. } => None,
        }
    };
    let Some(ch) = tail_char(&edits[len - 1]) else {
        return;
    };
    if !is_punctuation(ch) {
        return;
    }
    let Edit::Equal { left, right } = edits[len - 2] else {
        return;
    };
    let prev_char = match &left_tokens[left] {
        Token::Char(c) => Some(*c),
        _ => None,
    };
    if prev_char.map(is_punctuation).unwrap_or(true) {
        return;
    }
    // upgrade: reuse the EQUAL indices so surfaces stay well-defined
    edits[len - 1] = Edit::Equal { left, right };
}
