//! Chapter catalog: named regular chapters and composed chapter rules.
//!
//! A `RegularChapter` pairs a canonical chapter name with the title regex
//! that locates it. A `ChapterRule` composes a parent→child path of
//! regular chapters and carries the pre-rendered miss reason used when
//! the path cannot be found in a document.

use lazy_static::lazy_static;
use regex::Regex;

/// Conjunction class reused inside title regexes.
const R_CONJ: &str = "与和及或、";

/// A named chapter with its title pattern.
#[derive(Debug, Clone)]
pub struct RegularChapter {
    pub name: &'static str,
    pub pattern: Regex,
}

impl RegularChapter {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
        }
    }
}

/// A parent→child chapter path used to scope rule evaluation.
#[derive(Debug, Clone)]
pub struct ChapterRule {
    /// Title regexes, outermost first.
    pub chapters: Vec<Regex>,
    /// When true the scope extends over sibling continuation blocks whose
    /// titles match the same final regex.
    pub is_continued_chapter: bool,
    /// Human-readable reason used for a MissContent verdict.
    pub miss_reason: String,
    /// The quoted chapter path, e.g. "《基金的投资》".
    pub miss_content: String,
}

impl ChapterRule {
    /// Compose a rule from a chapter path, scope continued by default.
    pub fn of(path: &[&RegularChapter]) -> Self {
        Self::with_continuation(path, true)
    }

    /// Compose a rule whose scope is the final chapter's own range only.
    pub fn not_continued(path: &[&RegularChapter]) -> Self {
        Self::with_continuation(path, false)
    }

    fn with_continuation(path: &[&RegularChapter], is_continued_chapter: bool) -> Self {
        let quoted: Vec<String> = path.iter().map(|c| format!("《{}》", c.name)).collect();
        let joined = quoted.join("->");
        Self {
            chapters: path.iter().map(|c| c.pattern.clone()).collect(),
            is_continued_chapter,
            miss_reason: format!("章节{joined}不存在"),
            miss_content: joined,
        }
    }
}

lazy_static! {
    // ------------------------------------------------------------------
    // Fund contract chapters
    // ------------------------------------------------------------------
    pub static ref CATALOG: RegularChapter =
        RegularChapter::new("目录", r"^目\s*录$");
    pub static ref FUND_PARAPHRASE: RegularChapter =
        RegularChapter::new("释义", r"释义$");
    pub static ref FUND_BASIC_INFORMATION: RegularChapter =
        RegularChapter::new("基金的基本情况", r"基金的基本情况$");
    pub static ref FUND_SUBSCRIPTION: RegularChapter = RegularChapter::new(
        "基金份额的申购与赎回",
        &format!("基金份额的(?:(?:申购|赎回)[{R_CONJ}]?){{2}}$"),
    );
    pub static ref FUND_INVEST: RegularChapter = RegularChapter::new(
        "基金的投资",
        &format!("基金(?:财产)?的投资(?:范围|方向)?(?:[{R_CONJ}]投资限制)?$"),
    );
    pub static ref FUND_INVEST_SCOPE: RegularChapter =
        RegularChapter::new("投资范围", r"投资范围$");
    pub static ref FUND_INVEST_RESTRICTION: RegularChapter =
        RegularChapter::new("投资比例、投资限制", r"投资(比例|限制)");
    pub static ref FUND_LISTED_TRANSACTION: RegularChapter =
        RegularChapter::new("基金份额的上市交易", r"基金(?:份额)?的上市交易$");
    pub static ref FUND_SHARE_HOLDER: RegularChapter = RegularChapter::new(
        "基金份额持有人大会",
        &format!(
            "基金份额持有人(?:大会|会议)(?:(?:(?:召集|议事|表决)[{R_CONJ}]?)*的(?:(?:程序|规则)[{R_CONJ}]?){{2}})?$"
        ),
    );
    pub static ref FUND_EXPENSES: RegularChapter = RegularChapter::new(
        "基金费用与税收",
        &format!("基金的?费用[{R_CONJ}]?税收$"),
    );
    pub static ref FUND_TRUSTEE_FEE: RegularChapter =
        RegularChapter::new("托管费", r"基金托管人的?托管费$");
    pub static ref FUND_ADMINISTRATIVE_FEE: RegularChapter =
        RegularChapter::new("管理费", r"基金管理人的?管理费$");
    pub static ref FUND_C_CLASS_FEE: RegularChapter =
        RegularChapter::new("C类基金份额的销售服务费", r"C类.{2,10}服务费$");
    pub static ref FUND_SELL: RegularChapter =
        RegularChapter::new("基金份额的发售", r"基金份额的发售$");
    pub static ref FUND_INCOME_ALLOCATION: RegularChapter = RegularChapter::new(
        "基金的收益与分配",
        &format!("基金的?收益的?[{R_CONJ}]?分配(?:原则)?(?:[{R_CONJ}]?执行方式)?$"),
    );

    // ------------------------------------------------------------------
    // Custody agreement chapters
    // ------------------------------------------------------------------
    pub static ref CUSTODY_PROPERTY: RegularChapter =
        RegularChapter::new("基金财产的保管", r"基金财产的保管$");
    pub static ref CUSTODY_INSTRUCTIONS: RegularChapter = RegularChapter::new(
        "指令的发送、确认及执行",
        &format!("指令的(?:(?:发送|确认|执行)[{R_CONJ}]?){{3}}$"),
    );
    pub static ref CUSTODY_NET_ASSET_VALUE: RegularChapter = RegularChapter::new(
        "基金资产净值计算和会计核算",
        &format!("(?:基金)?资产净值的?计算[{R_CONJ}]?会计核算$"),
    );
    pub static ref CUSTODY_SUPERVISION: RegularChapter = RegularChapter::new(
        "托管人对管理人的监督",
        r"托管人对(?:基金)?管理人的?(?:业务)?监督(?:和核查)?$",
    );
    pub static ref CUSTODY_EXPENSES: RegularChapter =
        RegularChapter::new("基金费用", r"基金的?费用$");

    // ------------------------------------------------------------------
    // Asset-management plan chapters
    // ------------------------------------------------------------------
    pub static ref ASSET_BASIC_INFO: RegularChapter =
        RegularChapter::new("资产管理计划的基本情况", r"资产管理计划的基本情况$");
    pub static ref ASSET_RAISE: RegularChapter =
        RegularChapter::new("资产管理计划的募集", r"资产管理计划的募集$");
    pub static ref ASSET_INVEST: RegularChapter =
        RegularChapter::new("资产管理计划的投资", r"资产管理计划的投资$");
    pub static ref ASSET_PARTICIPATION: RegularChapter = RegularChapter::new(
        "资产管理计划的参与、退出与转让",
        &format!("资产管理计划的(?:(?:参与|退出|转让)[{R_CONJ}]?){{3}}$"),
    );
    pub static ref ASSET_GENERAL_MEETING: RegularChapter = RegularChapter::new(
        "份额持有人大会及日常机构",
        &format!("份额持有人大会(?:[{R_CONJ}]日常机构)?$"),
    );
    pub static ref ASSET_REGISTRY: RegularChapter =
        RegularChapter::new("资产管理计划份额的登记", r"资产管理计划(注册|份额)的?登记");
    pub static ref ASSET_ULTRA_VIRES: RegularChapter =
        RegularChapter::new("越权交易的界定", r"越权交易的?(处理|界定)");
    pub static ref ASSET_EXPENSES: RegularChapter = RegularChapter::new(
        "资产管理计划的费用与税收",
        &format!("资产管理计划的费用[{R_CONJ}]?税收$"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fund_invest_title_variants_match() {
        assert!(FUND_INVEST.pattern.is_match("基金的投资"));
        assert!(FUND_INVEST.pattern.is_match("基金财产的投资范围"));
        assert!(FUND_INVEST.pattern.is_match("基金的投资范围与投资限制"));
        assert!(!FUND_INVEST.pattern.is_match("基金的投资顾问团队"));
    }

    #[test]
    fn subscription_title_matches_both_orders() {
        assert!(FUND_SUBSCRIPTION.pattern.is_match("基金份额的申购与赎回"));
        assert!(FUND_SUBSCRIPTION.pattern.is_match("基金份额的赎回、申购"));
    }

    #[test]
    fn chapter_rule_renders_miss_reason() {
        let rule = ChapterRule::of(&[&FUND_INVEST, &FUND_INVEST_SCOPE]);
        assert_eq!(rule.miss_reason, "章节《基金的投资》->《投资范围》不存在");
        assert_eq!(rule.miss_content, "《基金的投资》->《投资范围》");
        assert!(rule.is_continued_chapter);
        assert_eq!(rule.chapters.len(), 2);
    }

    #[test]
    fn not_continued_rule() {
        let rule = ChapterRule::not_continued(&[&CATALOG]);
        assert!(!rule.is_continued_chapter);
    }
}
