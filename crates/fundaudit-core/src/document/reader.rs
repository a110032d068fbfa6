//! Read-only lookups over a document bundle.

use regex::Regex;

use crate::chapters::ChapterRule;
use crate::text::clean_title;

use super::{Chapter, DocumentBundle, Paragraph};

/// Read-only view over a bundle: paragraph access, chapter location,
/// page text assembly. Chapter title matching always runs over the
/// cleaned title.
pub struct Reader<'a> {
    bundle: &'a DocumentBundle,
}

impl<'a> Reader<'a> {
    pub fn new(bundle: &'a DocumentBundle) -> Self {
        Self { bundle }
    }

    pub fn paragraphs(&self) -> &'a [Paragraph] {
        &self.bundle.paragraphs
    }

    /// All non-fragment paragraphs.
    pub fn content_paragraphs(&self) -> Vec<&'a Paragraph> {
        self.bundle
            .paragraphs
            .iter()
            .filter(|p| !p.fragment)
            .collect()
    }

    pub fn chapters(&self) -> &'a [Chapter] {
        &self.bundle.chapters
    }

    /// Paragraph with exactly this document index.
    pub fn find_element_by_index(&self, index: usize) -> Option<&'a Paragraph> {
        self.bundle
            .paragraphs
            .binary_search_by_key(&index, |p| p.index)
            .ok()
            .map(|pos| &self.bundle.paragraphs[pos])
    }

    /// Non-fragment paragraphs whose index lies in the half-open range,
    /// excluding the chapter title element itself.
    pub fn paragraphs_in_range(
        &self,
        range: (usize, usize),
        title_index: usize,
    ) -> Vec<&'a Paragraph> {
        self.bundle
            .paragraphs
            .iter()
            .filter(|p| {
                p.index >= range.0 && p.index < range.1 && p.index != title_index && !p.fragment
            })
            .collect()
    }

    /// All chapters whose cleaned title matches `pattern`.
    pub fn find_chapters_by_pattern(&self, pattern: &Regex) -> Vec<&'a Chapter> {
        self.bundle
            .chapters
            .iter()
            .filter(|chapter| pattern.is_match(&clean_title(&chapter.title)))
            .collect()
    }

    /// Direct children of a chapter.
    pub fn child_chapters(&self, chapter: &Chapter) -> Vec<&'a Chapter> {
        chapter
            .children
            .iter()
            .filter_map(|&idx| self.bundle.chapters.get(idx))
            .collect()
    }

    /// Chapter path from the root down to the chapter containing the
    /// given chapter index.
    pub fn chapter_path(&self, chapter_idx: usize) -> Vec<&'a Chapter> {
        let mut path = Vec::new();
        let mut current = self.bundle.chapters.get(chapter_idx);
        while let Some(chapter) = current {
            path.push(chapter);
            current = chapter.parent.and_then(|idx| self.bundle.chapters.get(idx));
        }
        path.reverse();
        path
    }

    /// The deepest chapter containing paragraph `index`.
    pub fn chapter_of_paragraph(&self, index: usize) -> Option<&'a Chapter> {
        self.bundle
            .chapters
            .iter()
            .filter(|chapter| index >= chapter.range.0 && index < chapter.range.1)
            .min_by_key(|chapter| chapter.range.1 - chapter.range.0)
    }

    /// Walk a parent→child title-regex path and return the matched final
    /// chapters plus their scoped paragraphs.
    ///
    /// Matching is loose on hierarchy at the first step (any chapter may
    /// match), strict descent afterwards. With `is_continued_chapter` the
    /// scope unions every final match (continuation blocks under the same
    /// title); without it only the first match's own range is used.
    pub fn find_paragraphs_by_chapters(
        &self,
        patterns: &[Regex],
        is_continued_chapter: bool,
    ) -> (Vec<&'a Chapter>, Vec<&'a Paragraph>) {
        let Some(first) = patterns.first() else {
            return (Vec::new(), Vec::new());
        };
        let mut matched = self.find_chapters_by_pattern(first);
        for pattern in &patterns[1..] {
            let mut next = Vec::new();
            for chapter in &matched {
                for child in self.descendants(chapter) {
                    if pattern.is_match(&clean_title(&child.title)) {
                        next.push(child);
                    }
                }
            }
            matched = next;
        }
        matched.sort_by_key(|chapter| chapter.element_index);
        matched.dedup_by_key(|chapter| chapter.element_index);

        let scoped: Vec<&Chapter> = if is_continued_chapter {
            matched.clone()
        } else {
            matched.iter().take(1).copied().collect()
        };
        let mut paragraphs = Vec::new();
        for chapter in &scoped {
            paragraphs.extend(self.paragraphs_in_range(chapter.range, chapter.element_index));
        }
        paragraphs.sort_by_key(|p| p.index);
        paragraphs.dedup_by_key(|p| p.index);
        (matched, paragraphs)
    }

    /// Scope paragraphs through a composed [`ChapterRule`].
    pub fn find_paragraphs_by_rule(
        &self,
        rule: &ChapterRule,
    ) -> (Vec<&'a Chapter>, Vec<&'a Paragraph>) {
        self.find_paragraphs_by_chapters(&rule.chapters, rule.is_continued_chapter)
    }

    fn descendants(&self, chapter: &Chapter) -> Vec<&'a Chapter> {
        let mut stack: Vec<&Chapter> = self.child_chapters(chapter);
        let mut result = Vec::new();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.child_chapters(current));
        }
        result
    }

    /// Concatenated cleaned text of every paragraph on a page, with the
    /// contributing paragraphs.
    pub fn join_page_text(&self, page: u32) -> (String, Vec<&'a Paragraph>) {
        let paragraphs: Vec<&Paragraph> = self
            .bundle
            .paragraphs
            .iter()
            .filter(|p| p.page == page && !p.fragment)
            .collect();
        let text = paragraphs
            .iter()
            .map(|p| crate::text::clean_txt(&p.text))
            .collect::<Vec<_>>()
            .join("");
        (text, paragraphs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Mold;
    use crate::document::{DocumentBundle, ParagraphKind};
    use std::collections::BTreeMap;

    fn paragraph(index: usize, page: u32, text: &str) -> Paragraph {
        Paragraph {
            index,
            page,
            text: text.to_string(),
            kind: ParagraphKind::Paragraph,
            rows: Vec::new(),
            fragment: false,
            outlines: BTreeMap::new(),
        }
    }

    fn bundle() -> DocumentBundle {
        DocumentBundle {
            fid: "doc".into(),
            mold: Mold::PublicFund,
            paragraphs: vec![
                paragraph(0, 1, "第一部分 基金的投资"),
                paragraph(1, 1, "投资范围"),
                paragraph(2, 1, "股票、债券"),
                paragraph(3, 2, "第二部分 基金的托管"),
                paragraph(4, 2, "托管内容"),
            ],
            chapters: vec![
                Chapter {
                    element_index: 0,
                    title: "第一部分 基金的投资".into(),
                    range: (0, 3),
                    parent: None,
                    children: vec![1],
                },
                Chapter {
                    element_index: 1,
                    title: "投资范围".into(),
                    range: (1, 3),
                    parent: Some(0),
                    children: Vec::new(),
                },
                Chapter {
                    element_index: 3,
                    title: "第二部分 基金的托管".into(),
                    range: (3, 5),
                    parent: None,
                    children: Vec::new(),
                },
            ],
            answers: BTreeMap::new(),
        }
    }

    #[test]
    fn finds_chapter_path() {
        let bundle = bundle();
        let reader = Reader::new(&bundle);
        let patterns = vec![
            Regex::new("基金的投资").unwrap(),
            Regex::new("投资范围$").unwrap(),
        ];
        let (chapters, paragraphs) = reader.find_paragraphs_by_chapters(&patterns, true);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "投资范围");
        let texts: Vec<&str> = paragraphs.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["股票、债券"]);
    }

    #[test]
    fn missing_chapter_yields_empty() {
        let bundle = bundle();
        let reader = Reader::new(&bundle);
        let patterns = vec![Regex::new("投资顾问").unwrap()];
        let (chapters, paragraphs) = reader.find_paragraphs_by_chapters(&patterns, true);
        assert!(chapters.is_empty());
        assert!(paragraphs.is_empty());
    }

    #[test]
    fn chapter_of_paragraph_picks_deepest() {
        let bundle = bundle();
        let reader = Reader::new(&bundle);
        let chapter = reader.chapter_of_paragraph(2).unwrap();
        assert_eq!(chapter.title, "投资范围");
    }

    #[test]
    fn page_text_concatenates() {
        let bundle = bundle();
        let reader = Reader::new(&bundle);
        let (text, paragraphs) = reader.join_page_text(1);
        assert!(text.contains("股票、债券"));
        assert_eq!(paragraphs.len(), 3);
    }
}
