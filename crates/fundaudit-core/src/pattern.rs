//! Pattern kit: named collections of regular expressions shared by the
//! whole engine.
//!
//! Pattern objects are global and immutable; everything here is compiled
//! once and reused. Rule code must never compile regexes inside hot loops.

use lazy_static::lazy_static;
use regex::{Captures, Match, Regex};
use thiserror::Error;

/// Errors raised while building pattern collections.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("pattern collection must contain at least one alternative")]
    Empty,

    #[error("failed to compile pattern `{pattern}`: {source}")]
    Compile {
        pattern: String,
        source: regex::Error,
    },
}

/// An ordered, frozen set of regex alternatives.
///
/// `find` returns the earliest match across alternatives; ties on start
/// position fall back to declaration order.
#[derive(Debug, Clone)]
pub struct PatternCollection {
    patterns: Vec<Regex>,
}

impl PatternCollection {
    /// Compile a collection from raw pattern strings.
    pub fn compile<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let regex = Regex::new(pattern).map_err(|source| PatternError::Compile {
                pattern: pattern.to_string(),
                source,
            })?;
            compiled.push(regex);
        }
        if compiled.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(Self { patterns: compiled })
    }

    /// Compile a single-alternative collection.
    pub fn single(pattern: &str) -> Result<Self, PatternError> {
        Self::compile([pattern])
    }

    /// Wrap already-compiled regexes. Panics on an empty set; reserved for
    /// the static tables below.
    pub fn from_regexes(patterns: Vec<Regex>) -> Self {
        assert!(!patterns.is_empty());
        Self { patterns }
    }

    /// The underlying alternatives.
    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    /// Earliest match across alternatives.
    pub fn find<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.patterns
            .iter()
            .filter_map(|pattern| pattern.find(text))
            .min_by_key(|matched| matched.start())
    }

    /// Captures of the alternative whose match starts earliest.
    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        let mut best: Option<Captures<'t>> = None;
        for pattern in &self.patterns {
            if let Some(caps) = pattern.captures(text) {
                let start = caps.get(0).map(|m| m.start()).unwrap_or(usize::MAX);
                let best_start = best
                    .as_ref()
                    .and_then(|b| b.get(0))
                    .map(|m| m.start())
                    .unwrap_or(usize::MAX);
                if start < best_start {
                    best = Some(caps);
                }
            }
        }
        best
    }

    /// All non-overlapping matches across alternatives, in text order.
    /// When spans overlap the earliest-starting match wins; ties on start
    /// position fall back to declaration order.
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<Match<'t>> {
        let mut matches: Vec<(usize, Match<'t>)> = self
            .patterns
            .iter()
            .enumerate()
            .flat_map(|(idx, pattern)| pattern.find_iter(text).map(move |m| (idx, m)))
            .collect();
        matches.sort_by_key(|(idx, m)| (m.start(), *idx));
        let mut result: Vec<Match<'t>> = Vec::new();
        for (_, matched) in matches {
            if result
                .last()
                .map(|prev| matched.start() >= prev.end())
                .unwrap_or(true)
            {
                result.push(matched);
            }
        }
        result
    }

    /// True if any alternative matches.
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(text))
    }

    /// Apply each alternative's `replace_all` in declaration order.
    pub fn replace_all(&self, text: &str, rep: &str) -> String {
        let mut result = text.to_string();
        for pattern in &self.patterns {
            result = pattern.replace_all(&result, rep).into_owned();
        }
        result
    }

    /// Split `text` at every non-overlapping match.
    pub fn split(&self, text: &str) -> Vec<String> {
        let matches = self.find_all(text);
        let mut parts = Vec::new();
        let mut prev = 0;
        for matched in matches {
            parts.push(text[prev..matched.start()].to_string());
            prev = matched.end();
        }
        parts.push(text[prev..].to_string());
        parts
    }

    /// Set-union with another collection.
    pub fn union(&self, other: &Self) -> Self {
        let mut patterns = self.patterns.clone();
        patterns.extend(other.patterns.iter().cloned());
        Self { patterns }
    }
}

/// A "contains X but not Y" pattern, used where the original rule text
/// relies on lookaround the regex engine does not provide.
#[derive(Debug, Clone)]
pub struct NeglectPattern {
    matches: Regex,
    unmatch: Regex,
}

impl NeglectPattern {
    pub fn compile(matches: &str, unmatch: &str) -> Result<Self, PatternError> {
        let build = |pattern: &str| {
            Regex::new(pattern).map_err(|source| PatternError::Compile {
                pattern: pattern.to_string(),
                source,
            })
        };
        Ok(Self {
            matches: build(matches)?,
            unmatch: build(unmatch)?,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matches.is_match(text) && !self.unmatch.is_match(text)
    }
}

/// A pattern whose matches are vetoed by their immediate neighborhood:
/// an occurrence counts only if it is not preceded / followed by the
/// given literals. Covers the lookaround-dependent vocabulary ("开放式"
/// not after "定期", "股票" not before "期权").
#[derive(Debug, Clone)]
pub struct GuardedPattern {
    pattern: Regex,
    not_before: Option<String>,
    not_after: Option<String>,
}

impl GuardedPattern {
    pub fn compile(
        pattern: &str,
        not_before: Option<&str>,
        not_after: Option<&str>,
    ) -> Result<Self, PatternError> {
        let regex = Regex::new(pattern).map_err(|source| PatternError::Compile {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: regex,
            not_before: not_before.map(str::to_string),
            not_after: not_after.map(str::to_string),
        })
    }

    /// True if any occurrence survives both neighborhood guards.
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.find_iter(text).any(|matched| {
            let before_ok = self
                .not_before
                .as_ref()
                .map(|nb| !text[..matched.start()].ends_with(nb.as_str()))
                .unwrap_or(true);
            let after_ok = self
                .not_after
                .as_ref()
                .map(|na| !text[matched.end()..].starts_with(na.as_str()))
                .unwrap_or(true);
            before_ok && after_ok
        })
    }
}

/// Chinese-numeral character class, including capital and Arabic forms.
pub const R_CN_NUMBER: &str = "零〇壹贰叁肆伍陆柒捌玖拾佰仟萬億0-9两一二三四五六七八九十百千万亿";

/// Number with optional thousands separators and decimal tail.
pub const R_FLOAT_NUMBER: &str =
    "(?:[零〇壹贰叁肆伍陆柒捌玖拾佰仟萬億0-9两一二三四五六七八九十百千万亿]+[,，]?)+(?:[.．][0-9]+)?";

/// Percent / permille unit.
pub const R_PERCENT_UNIT: &str = "[%％‰]";

/// Conjunction characters joining parallel clauses.
pub const R_CONJUNCTION: &str = "与和及或、";

/// Punctuation that never acts as a conjunction.
pub const R_NOT_CONJUNCTION_PUNCTUATION: &str = ",，。;；";

/// Circled / parenthesized serial-number code points.
pub const R_SERIAL_CN_NUMBER: &str = "\u{2460}-\u{249B}\u{3220}-\u{3229}";

lazy_static! {
    // =========================================================================
    // NUMERIC LITERALS
    // =========================================================================

    /// A (possibly negative) number literal.
    pub static ref P_NUMBER: PatternCollection = PatternCollection::compile([
        format!("[\\-－—负]?{R_FLOAT_NUMBER}"),
    ]).unwrap();

    /// A percentage in any of its unit forms: "5%", "百分之五", "1/20".
    pub static ref P_PERCENTAGE: PatternCollection = PatternCollection::compile([
        format!("[\\-－—负]?{R_FLOAT_NUMBER}{R_PERCENT_UNIT}"),
        format!("负?[{R_CN_NUMBER}]+分之[{R_CN_NUMBER}]+"),
        "[\\-－—负]?[0-9]+/[0-9]+".to_string(),
    ]).unwrap();

    /// Date forms: "二〇二三年五月一日", "3个月".
    pub static ref P_DATE: PatternCollection = PatternCollection::compile([
        format!(
            "(?P<year>[{R_CN_NUMBER}]{{1,4}})\\s*年(?:(?P<month>[{R_CN_NUMBER}]{{1,2}})\\s*月)?(?:(?P<day>[{R_CN_NUMBER}]{{1,2}})\\s*日)?"
        ),
        format!("(?P<c_month>[{R_CN_NUMBER}]+)个月"),
    ]).unwrap();

    // =========================================================================
    // STRUCTURE MARKERS
    // =========================================================================

    /// Leading paragraph numbering: "1、", "（一）", "第三章", "➢" ...
    pub static ref P_NUMBERING: PatternCollection = PatternCollection::compile([
        "^[(（【]?[a-zA-Z]+\\s*[.．、)）】]".to_string(),
        "^\\s*[(（【]?\\s*[➢0-9一二三四五六七八九十]+\\s*[)）】]".to_string(),
        "^\\s*[(（【]?\\s*[➢0-9一二三四五六七八九十]+\\s*[,.．，、]+[)）】]?\\s*".to_string(),
        "^\\s*[➢✓✔■○·]+\\s*".to_string(),
        format!("^\\s*[{R_SERIAL_CN_NUMBER}]+\\s*"),
        "^\\s*第\\s*[0-9一二三四五六七八九十]+\\s*(部分|章?节?)".to_string(),
    ]).unwrap();

    /// Numbered paragraph prefix with capture groups for the whole prefix
    /// and the bare number, used when regenerating serials.
    pub static ref P_PARA_PREFIX_NUM: PatternCollection = PatternCollection::compile([
        format!(
            "^(?P<prefix>[(（]?(?P<num>[0-9一二三四五六七八九十{R_SERIAL_CN_NUMBER}]+)[)）]?[.、]?)"
        ),
    ]).unwrap();

    /// Serial number at the head of a clause: "（三）", "3、".
    pub static ref P_SERIAL_NUM: PatternCollection = PatternCollection::compile([
        "^[(（]?(?P<num>[0-9一二三四五六七八九十]+)[）)]?",
    ]).unwrap();

    /// `{KEY}` substitution slots inside template text.
    pub static ref P_REPLACE_KEY: PatternCollection = PatternCollection::compile([
        r"\{(?P<key>[A-Z]+_?[0-9]+)\}",
    ]).unwrap();

    /// Conjunction tokens joining parallel clause members.
    pub static ref P_LINK_SENTENCE: PatternCollection = PatternCollection::compile([
        "、|与|以?及|和|或|/",
    ]).unwrap();

    /// Bracketed spans excluded from conjunction splitting.
    pub static ref P_EXCLUDE_SENTENCE: PatternCollection = PatternCollection::compile([
        "[【{（(〔][^)）】〕}]+[)）】〕}]",
    ]).unwrap();

    /// A catalog ("目录") line: content, dot leader, page number.
    pub static ref P_CATALOG_TITLE: PatternCollection = PatternCollection::compile([
        r"^\s*(?P<content>.*?)[\s.·…—﹍\-]{2,}(?P<no>[0-9]+)\s*$",
        r"^(?P<content>[一二三四五六七八九十0-9.、]+.*?)(?P<no>[0-9]+)$",
    ]).unwrap();

    /// The catalog chapter title itself.
    pub static ref P_CATALOGUE: PatternCollection =
        PatternCollection::compile([r"^目\s*录$"]).unwrap();

    // =========================================================================
    // DOMAIN VOCABULARY
    // =========================================================================

    pub static ref P_BOURSE_SH: PatternCollection =
        PatternCollection::compile(["上海证券交易所|上交所"]).unwrap();

    pub static ref P_BOURSE_SZ: PatternCollection =
        PatternCollection::compile(["深圳证券交易所|深交所"]).unwrap();

    /// Names that mark a custody fund as equity-flavored.
    pub static ref P_CUSTODY_STOCK: PatternCollection = PatternCollection::compile([
        "沪深|上证|中证|深证|创业板|中小企业|恒生|A股|股票|北证|国证|中创",
    ]).unwrap();

    /// Non-standard investment vocabulary in asset-management scopes.
    pub static ref P_NON_STANDARD_INVESTMENT: PatternCollection = PatternCollection::compile([
        "新三板|全国中小企业股份转让系统挂牌股票|场外期权|益互换|收益凭证|资产管理计划|资产管理产品|私募证券投资基金|信托计划|未上市企业股权|股权|收益权|信贷|理财|债权融资计划|债权投资计划|资产支持计划",
    ]).unwrap();

    pub static ref P_ASSET_STOCK_RIGHT: PatternCollection =
        PatternCollection::compile(["股权|收益权"]).unwrap();

    pub static ref P_OPERATE_MODE_CLOSE: PatternCollection =
        PatternCollection::compile(["封闭式"]).unwrap();

    /// "聘请XX为投资顾问" phrasing.
    pub static ref P_EMPLOY_INVESTMENT_ADVISER: PatternCollection = PatternCollection::compile([
        format!("聘[请任用][^{R_NOT_CONJUNCTION_PUNCTUATION}]*?作?为(本(?:投资)?计划)?的?投资顾问"),
    ]).unwrap();

    /// "本计划不设份额持有人大会…" phrasings.
    pub static ref P_WITHOUT_HOLDER_MEETING: PatternCollection = PatternCollection::compile([
        format!("不设[置立]?份额持有人大会[{R_CONJUNCTION}]日常机构"),
        "不设[置立]?份额持有人大会机制".to_string(),
    ]).unwrap();

    // =========================================================================
    // SYNONYM EQUIVALENCE CLASSES
    // =========================================================================

    /// Classes shared by every mold: bracket variants, operators, dashes.
    pub static ref BASE_SYNONYM_PATTERNS: Vec<Regex> = vec![
        Regex::new("[＝=]").unwrap(),
        Regex::new("[+＋]").unwrap(),
        Regex::new("[×xX]").unwrap(),
        Regex::new("[\\-—]+").unwrap(),
    ];

    /// Public-fund synonym classes: role names, bourse names, common
    /// collapsed phrasings.
    pub static ref PUBLIC_SYNONYM_PATTERNS: Vec<Regex> = {
        let mut patterns = vec![
            Regex::new("(?:(?:公募)?基金)?管理人").unwrap(),
            Regex::new("(?:(?:公募)?基金)?托管人|托管机构").unwrap(),
            Regex::new("投资[者人]|(基金)?份额持有人").unwrap(),
            Regex::new("销售(?:机构|网点)").unwrap(),
            Regex::new("上海证券交易所|上交所").unwrap(),
            Regex::new("深圳证券交易所|深交所").unwrap(),
            Regex::new("[需须]").unwrap(),
            Regex::new("参[看见]").unwrap(),
            Regex::new("基金资产总值和基金资产净值|基金资产总值和净值").unwrap(),
            Regex::new("基金(?:份额)?登记机构").unwrap(),
            Regex::new("本基金基金份额持有人|本基金份额持有人").unwrap(),
            Regex::new("[签盖]章").unwrap(),
            Regex::new("份额持有人大会的决[议定]").unwrap(),
            Regex::new("(?:中国(?:证券投资)?)?基金业协会|协会").unwrap(),
            Regex::new("[及、]").unwrap(),
        ];
        patterns.extend(BASE_SYNONYM_PATTERNS.iter().cloned());
        patterns
    };

    /// Appended when the investment scope mentions futures: the bourse
    /// phrasing 证券交易所 ≡ 证券、期货交易所.
    pub static ref STOCK_SYNONYM_PATTERN: Regex =
        Regex::new("证券(?:交易所)?[/、]期货交易所|证券交易所").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_is_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            PatternCollection::compile(empty),
            Err(PatternError::Empty)
        ));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let result = PatternCollection::compile(["(unclosed"]);
        assert!(matches!(result, Err(PatternError::Compile { .. })));
    }

    #[test]
    fn find_returns_earliest_across_alternatives() {
        let patterns = PatternCollection::compile(["债券", "股票"]).unwrap();
        let matched = patterns.find("投资股票及债券").unwrap();
        assert_eq!(matched.as_str(), "股票");
    }

    #[test]
    fn find_all_drops_overlaps() {
        let patterns = PatternCollection::compile(["股票期权", "股票"]).unwrap();
        let matches = patterns.find_all("股票期权与股票");
        let texts: Vec<&str> = matches.iter().map(|m| m.as_str()).collect();
        assert_eq!(texts, vec!["股票期权", "股票"]);
    }

    #[test]
    fn union_extends_alternatives() {
        let a = PatternCollection::compile(["股票"]).unwrap();
        let b = PatternCollection::compile(["债券"]).unwrap();
        let both = a.union(&b);
        assert!(both.is_match("债券"));
        assert!(both.is_match("股票"));
    }

    #[test]
    fn neglect_pattern_excludes_unmatch() {
        let open = NeglectPattern::compile("开放式", "定期开放").unwrap();
        assert!(open.is_match("开放式基金"));
        assert!(!open.is_match("定期开放式基金"));
    }

    #[test]
    fn guarded_pattern_vetoes_neighborhood() {
        let stock = GuardedPattern::compile("股票", None, Some("期权")).unwrap();
        assert!(stock.is_match("投资于股票"));
        assert!(!stock.is_match("股票期权"));
        // a second, unguarded occurrence still counts
        assert!(stock.is_match("股票期权与股票"));

        let open = GuardedPattern::compile("开放式", Some("定期"), None).unwrap();
        assert!(open.is_match("开放式"));
        assert!(!open.is_match("定期开放式"));
    }

    #[test]
    fn numbering_prefix_is_recognized() {
        assert!(P_NUMBERING.is_match("（一）基金的投资"));
        assert!(P_NUMBERING.is_match("1、基金的投资"));
        assert!(!P_NUMBERING.is_match("基金的投资"));
    }

    #[test]
    fn percentage_forms_match() {
        assert!(P_PERCENTAGE.is_match("不低于5%"));
        assert!(P_PERCENTAGE.is_match("百分之五十"));
        assert!(P_PERCENTAGE.is_match("1/20"));
    }

    #[test]
    fn catalog_line_parses() {
        let caps = P_CATALOG_TITLE.captures("基金的投资......12").unwrap();
        assert_eq!(&caps["content"], "基金的投资");
        assert_eq!(&caps["no"], "12");
    }
}
