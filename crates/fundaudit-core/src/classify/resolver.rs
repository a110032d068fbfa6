//! Classification resolution: answers + chapter probes → tag lists.

use lazy_static::lazy_static;
use regex::Regex;

use crate::chapters;
use crate::document::{AnswerManager, Reader};
use crate::pattern::{GuardedPattern, PatternCollection};
use crate::text::clean_txt;

use super::{Classification, ClassifyName, Mold, Tag};

// Answer field names consumed by the resolver.
pub const F_OPERATE_MODE: &str = "运作方式";
pub const F_FUND_CATEGORY: &str = "基金的类别、类型";
pub const F_FUND_NAME: &str = "基金名称";
pub const F_INVEST_SCOPE: &str = "基金投资范围";
pub const F_LISTED_BOURSE: &str = "上市交易所";
pub const F_SUPERVISION: &str = "托管人对管理人的监督";
pub const F_PLAN_CATEGORY: &str = "计划的类别、类型";
pub const F_PLAN_NAME: &str = "计划名称";
pub const F_ADVISER: &str = "投资顾问";
pub const F_PLAN_SCOPE: &str = "计划投资范围";

/// Answer fields a classification name depends on; used when a rule
/// derives its schema-field list from its conditions.
pub fn answer_fields(name: ClassifyName, mold: Mold) -> &'static [&'static str] {
    match (mold, name) {
        (Mold::PublicFund, ClassifyName::OperateMode) => &[F_OPERATE_MODE],
        (Mold::PublicFund, ClassifyName::FundType) => &[F_FUND_CATEGORY, F_FUND_NAME],
        (Mold::PublicFund, ClassifyName::SpecialType) => &[F_FUND_NAME],
        (Mold::PublicFund, ClassifyName::InvestmentScope) => &[F_INVEST_SCOPE],
        (Mold::PublicFund, ClassifyName::StockBourse) => &[F_LISTED_BOURSE],
        (Mold::PublicCustody, ClassifyName::OperateMode) => &[F_FUND_NAME],
        (Mold::PublicCustody, ClassifyName::FundType) => &[F_FUND_NAME],
        (Mold::PublicCustody, ClassifyName::SpecialType) => &[F_FUND_NAME],
        (Mold::PublicCustody, ClassifyName::InvestmentScope) => &[F_SUPERVISION],
        (Mold::AssetManagement, ClassifyName::ProjectType) => &[F_PLAN_CATEGORY],
        (Mold::AssetManagement, ClassifyName::ProjectName) => &[F_PLAN_NAME],
        (Mold::AssetManagement, ClassifyName::OperateMode) => &[F_OPERATE_MODE],
        (Mold::AssetManagement, ClassifyName::InvestmentAdviser) => &[F_ADVISER],
        (Mold::AssetManagement, ClassifyName::NonStandardInvestment) => &[F_PLAN_SCOPE],
        (Mold::AssetManagement, ClassifyName::StockRight) => &[F_PLAN_SCOPE],
        _ => &[],
    }
}

lazy_static! {
    static ref P_STOCK_EXCHANGE: PatternCollection =
        PatternCollection::compile(["(?:上海|深圳)证券交易所", "[上深]交所"]).unwrap();
    static ref P_SIDE_POCKET: PatternCollection = PatternCollection::compile([
        "侧袋机制的?实施[与和及或、]投资运作安排$",
        "(?:实施|侧袋机制){2}期间的?(?:基金)?资产估值",
    ])
    .unwrap();
    static ref P_SHARE_CLASSIFY: PatternCollection =
        PatternCollection::compile(["基金份额的?类别(?:设置)?$"]).unwrap();
    static ref P_SUB_CONVERT: Regex = Regex::new("转换$").unwrap();
    static ref P_SUB_PERIOD_INVEST: Regex = Regex::new("定期定额投资(?:计划)?$").unwrap();
    static ref P_SUB_TRANSFER_CUSTODY: Regex = Regex::new("转托管$").unwrap();
    static ref P_SUB_NON_TRANSACTION: Regex = Regex::new("非交易过户").unwrap();
    static ref P_SHARE_A: Regex = Regex::new("A类(?:基金)?份额").unwrap();
    static ref P_SHARE_C: Regex = Regex::new("C类(?:基金)?份额").unwrap();
    static ref P_GOLD_ETF: GuardedPattern = GuardedPattern::compile(
        "黄金交易型开放式(?:指数)?证券投资基金",
        None,
        Some("联接"),
    )
    .unwrap();
    static ref P_SCOPE_STOCK: GuardedPattern =
        GuardedPattern::compile("股票", None, Some("期权")).unwrap();

    /// Special-type vocabulary in precedence order. Linked forms are
    /// listed before the bare ETF pattern so that implication handling
    /// sees them first.
    static ref SPECIAL_TYPE_TABLE: Vec<(Tag, Regex)> = vec![
        (Tag::HkStock, Regex::new("港股").unwrap()),
        (Tag::Fof, Regex::new("FOF|基金中基金").unwrap()),
        (Tag::Lof, Regex::new("LOF").unwrap()),
        (
            Tag::FeaturesEtf,
            Regex::new("期货交易型开放式(?:指数)?证券投资基金").unwrap()
        ),
        (
            Tag::GoldEtfLinked,
            Regex::new("黄金交易型开放式(?:指数)?证券投资基金联接基金").unwrap()
        ),
        (Tag::Classification, Regex::new("分级").unwrap()),
        (Tag::LinkedFund, Regex::new("联接").unwrap()),
        (Tag::Etf, Regex::new("交易型开放式指数证券投资基金").unwrap()),
    ];

    /// Investment-scope vocabulary; not mutually exclusive.
    static ref INVESTMENT_SCOPE_TABLE: Vec<(Tag, Regex)> = vec![
        (Tag::ScopeHkStock, Regex::new("港股").unwrap()),
        (Tag::Credit, Regex::new("信用衍生品").unwrap()),
        (Tag::StockIndexFutures, Regex::new("股指期货").unwrap()),
        (Tag::DebtFutures, Regex::new("国债期货").unwrap()),
        (Tag::CommodityFutures, Regex::new("商品期货").unwrap()),
        (Tag::StockOptions, Regex::new("股票期权").unwrap()),
        (Tag::ReFinance, Regex::new("转融通").unwrap()),
        (Tag::Abs, Regex::new("资产支持证券").unwrap()),
        (Tag::Dr, Regex::new("存托凭证").unwrap()),
        (Tag::Financing, Regex::new("融资").unwrap()),
        (Tag::SecuritiesLending, Regex::new("融券").unwrap()),
        (Tag::StarMarket, Regex::new("科创板").unwrap()),
        (Tag::Warrant, Regex::new("权证").unwrap()),
        (Tag::Ncd, Regex::new("同业存单").unwrap()),
        (Tag::ScopeBond, Regex::new("债券").unwrap()),
        (Tag::FuturesContract, Regex::new("期货合约").unwrap()),
    ];

    /// Asset-management project types.
    static ref PROJECT_TYPE_TABLE: Vec<(Tag, Regex)> = vec![
        (Tag::Fof, Regex::new("基金中基金|FOF").unwrap()),
        (Tag::Equities, Regex::new("权益类").unwrap()),
        (Tag::FixedIncomeCategory, Regex::new("固定收益类").unwrap()),
        (
            Tag::FuturesAndDerivatives,
            Regex::new("期货[与和及或、]衍生品类").unwrap()
        ),
        (Tag::MixedClass, Regex::new("混合类").unwrap()),
    ];

    /// Scope subset valid for custody agreements.
    static ref CUSTODY_SCOPE_TAGS: Vec<Tag> = vec![
        Tag::ScopeHkStock,
        Tag::Credit,
        Tag::StockIndexFutures,
        Tag::DebtFutures,
        Tag::CommodityFutures,
        Tag::StockOptions,
        Tag::ReFinance,
        Tag::Abs,
        Tag::Dr,
        Tag::Financing,
        Tag::SecuritiesLending,
        Tag::Ncd,
    ];
}

/// Compute the classification map for one document. Called once per
/// document; the result is passed around read-only afterwards.
pub fn resolve_classification(
    reader: &Reader<'_>,
    answers: &AnswerManager<'_>,
    mold: Mold,
) -> Classification {
    let mut map = std::collections::BTreeMap::new();
    match mold {
        Mold::PublicFund => {
            map.insert(ClassifyName::OperateMode, operate_mode(answers));
            map.insert(ClassifyName::FundType, fund_type(answers));
            map.insert(
                ClassifyName::ListedTransaction,
                disclosure_by_chapter(
                    reader,
                    &chapters::FUND_LISTED_TRANSACTION.pattern,
                    &P_STOCK_EXCHANGE,
                ),
            );
            map.insert(ClassifyName::SpecialType, special_type(answers, false));
            map.insert(
                ClassifyName::SidePocket,
                disclosure_by_chapter(reader, &chapters::FUND_INVEST.pattern, &P_SIDE_POCKET),
            );
            map.insert(
                ClassifyName::ShareClassify,
                disclosure_by_chapter(
                    reader,
                    &chapters::FUND_BASIC_INFORMATION.pattern,
                    &P_SHARE_CLASSIFY,
                ),
            );
            map.insert(
                ClassifyName::InvestmentScope,
                investment_scope(answers.value(F_INVEST_SCOPE), None),
            );
            map.insert(ClassifyName::FundSubscription, fund_subscription(reader));
            map.insert(ClassifyName::StockBourse, stock_bourse(answers));
            map.insert(ClassifyName::ShareCategory, share_category(reader));
        }
        Mold::PublicCustody => {
            map.insert(ClassifyName::OperateMode, custody_operate_mode(answers));
            map.insert(ClassifyName::FundType, custody_fund_type(answers));
            map.insert(ClassifyName::SpecialType, special_type(answers, true));
            map.insert(
                ClassifyName::SidePocket,
                disclosure_by_chapter(
                    reader,
                    &chapters::CUSTODY_NET_ASSET_VALUE.pattern,
                    &P_SIDE_POCKET,
                ),
            );
            map.insert(
                ClassifyName::InvestmentScope,
                investment_scope(answers.value(F_SUPERVISION), Some(&CUSTODY_SCOPE_TAGS)),
            );
            map.insert(
                ClassifyName::SettleAccountsMode,
                settle_accounts_mode(reader),
            );
        }
        Mold::AssetManagement => {
            map.insert(ClassifyName::ProjectName, project_name(answers));
            map.insert(ClassifyName::ProjectType, project_type(answers));
            map.insert(ClassifyName::GeneralMeeting, holder_meeting(reader));
            map.insert(ClassifyName::InvestmentAdviser, investment_adviser(answers));
            map.insert(ClassifyName::OperateMode, asset_operate_mode(answers));
            map.insert(
                ClassifyName::NonStandardInvestment,
                yes_no(crate::pattern::P_NON_STANDARD_INVESTMENT.is_match(&clean_txt(
                    answers.value(F_PLAN_SCOPE),
                ))),
            );
            map.insert(
                ClassifyName::StockRight,
                yes_no(crate::pattern::P_ASSET_STOCK_RIGHT.is_match(&clean_txt(
                    answers.value(F_PLAN_SCOPE),
                ))),
            );
        }
    }
    Classification::new(map)
}

fn yes_no(condition: bool) -> Vec<Tag> {
    vec![if condition { Tag::Yes } else { Tag::No }]
}

/// Operate mode for fund contracts.
///
/// OPEN iff the operate-mode answer contains 开放式 and not 封闭;
/// REGULAR_OPEN from the fund name; CLOSE from the fund name displaces
/// OPEN; INITIATE from the fund name is additive.
fn operate_mode(answers: &AnswerManager<'_>) -> Vec<Tag> {
    let mode = answers.value(F_OPERATE_MODE);
    let name = answers.value(F_FUND_NAME);
    let mut tags = Vec::new();
    if mode.contains("开放式") && !mode.contains("封闭") {
        tags.push(Tag::Open);
    }
    if name.contains("定期开放") {
        tags.push(Tag::RegularOpen);
    }
    if name.contains("封闭") {
        tags.retain(|tag| *tag != Tag::Open);
        if !tags.contains(&Tag::Close) {
            tags.push(Tag::Close);
        }
    }
    if name.contains("发起式") {
        tags.push(Tag::Initiate);
    }
    tags
}

/// Operate mode for custody agreements, derived from the fund name only.
/// Anything not closed counts as open.
fn custody_operate_mode(answers: &AnswerManager<'_>) -> Vec<Tag> {
    let name = answers.value(F_FUND_NAME);
    let mut tags = Vec::new();
    if name.contains("定期开放") {
        tags.push(Tag::RegularOpen);
    }
    if name.contains("封闭") {
        tags.push(Tag::Close);
    } else {
        tags.push(Tag::Open);
    }
    if name.contains("发起式") {
        tags.push(Tag::Initiate);
    }
    tags
}

fn is_index_name(name: &str) -> bool {
    name.contains("指数")
        || name.contains("期货交易型开放式证券投资基金")
        || name.contains("黄金交易型开放式证券投资基金")
}

/// Fund type with the documented precedence: money short-circuits, then
/// mixture, then stock/bond/commodities with index forms additive.
fn fund_type(answers: &AnswerManager<'_>) -> Vec<Tag> {
    let category = answers.value(F_FUND_CATEGORY);
    let name = answers.value(F_FUND_NAME);
    let combined = format!("{category}{name}");
    if name.contains("货币基金") || name.contains("货币市场基金") {
        return vec![Tag::Money];
    }
    if combined.contains("混合型") {
        return vec![Tag::Mixture];
    }
    let mut tags = Vec::new();
    let is_index = is_index_name(name);
    if is_index {
        tags.push(Tag::Index);
    }
    if name.contains("指数增强") {
        tags.push(Tag::EnhanceIndex);
    }
    if combined.contains("股票") {
        if is_index {
            tags.push(Tag::StockIndex);
        }
        tags.push(Tag::Stock);
    } else if combined.contains("债券") {
        if is_index {
            tags.push(Tag::BondIndex);
        }
        tags.push(Tag::Bond);
    } else if combined.contains("商品期货") {
        if is_index {
            tags.push(Tag::CommoditiesFuturesIndex);
        }
        tags.push(Tag::CommoditiesFutures);
    }
    tags
}

/// Custody fund type: everything derives from the fund name; equity
/// flavor comes from the index-name vocabulary.
fn custody_fund_type(answers: &AnswerManager<'_>) -> Vec<Tag> {
    let name = answers.value(F_FUND_NAME);
    if name.contains("货币基金") || name.contains("货币市场基金") {
        return vec![Tag::Money];
    }
    if name.contains("混合") {
        return vec![Tag::Mixture];
    }
    let mut tags = Vec::new();
    let is_index = is_index_name(name);
    if is_index {
        tags.push(Tag::Index);
    }
    if name.contains("指数增强") {
        tags.push(Tag::EnhanceIndex);
    } else if crate::pattern::P_CUSTODY_STOCK.is_match(name) {
        if is_index {
            tags.push(Tag::StockIndex);
        }
        tags.push(Tag::Stock);
    } else if name.contains("债") {
        if is_index {
            tags.push(Tag::BondIndex);
        }
        tags.push(Tag::Bond);
    }
    tags
}

/// Special types are additive; ETF implications apply. Custody molds
/// exclude GOLD_ETF_LINKED and CLASSIFICATION.
fn special_type(answers: &AnswerManager<'_>, custody: bool) -> Vec<Tag> {
    let name = answers.value(F_FUND_NAME);
    if name.is_empty() {
        return Vec::new();
    }
    let mut tags = Vec::new();
    let push = |tags: &mut Vec<Tag>, tag: Tag| {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    };
    for (tag, pattern) in SPECIAL_TYPE_TABLE.iter() {
        if custody && matches!(tag, Tag::GoldEtfLinked | Tag::Classification) {
            continue;
        }
        if pattern.is_match(name) {
            push(&mut tags, *tag);
            match tag {
                Tag::FeaturesEtf => push(&mut tags, Tag::Etf),
                Tag::GoldEtfLinked => push(&mut tags, Tag::LinkedFund),
                _ => {}
            }
        }
    }
    if P_GOLD_ETF.is_match(name) {
        push(&mut tags, Tag::GoldEtf);
        push(&mut tags, Tag::Etf);
    }
    tags
}

fn investment_scope(answer: &str, allowed: Option<&[Tag]>) -> Vec<Tag> {
    if answer.is_empty() {
        return Vec::new();
    }
    let mut tags = Vec::new();
    for (tag, pattern) in INVESTMENT_SCOPE_TABLE.iter() {
        if let Some(allowed) = allowed {
            if !allowed.contains(tag) {
                continue;
            }
        }
        if pattern.is_match(answer) {
            tags.push(*tag);
        }
    }
    let stock_allowed = allowed.map(|a| a.contains(&Tag::ScopeStock)).unwrap_or(true);
    if stock_allowed && P_SCOPE_STOCK.is_match(answer) {
        tags.push(Tag::ScopeStock);
    }
    tags
}

/// YES when any paragraph or child-chapter title inside the located
/// chapter matches `probe`; NO otherwise (including a missing chapter).
fn disclosure_by_chapter(
    reader: &Reader<'_>,
    chapter_pattern: &Regex,
    probe: &PatternCollection,
) -> Vec<Tag> {
    let patterns = vec![chapter_pattern.clone()];
    let (found, paragraphs) = reader.find_paragraphs_by_chapters(&patterns, true);
    for chapter in &found {
        for child in reader.child_chapters(chapter) {
            if probe.is_match(&clean_txt(&child.title)) {
                return vec![Tag::Yes];
            }
        }
    }
    for paragraph in paragraphs {
        if probe.is_match(&clean_txt(&paragraph.text)) {
            return vec![Tag::Yes];
        }
    }
    vec![Tag::No]
}

fn fund_subscription(reader: &Reader<'_>) -> Vec<Tag> {
    let roots = reader.find_chapters_by_pattern(&chapters::FUND_SUBSCRIPTION.pattern);
    let Some(root) = roots.last() else {
        return Vec::new();
    };
    let mut tags = Vec::new();
    let push = |tag: Tag, tags: &mut Vec<Tag>| {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    };
    for child in reader.child_chapters(root) {
        let title = clean_txt(&child.title);
        if P_SUB_CONVERT.is_match(&title) {
            push(Tag::Convert, &mut tags);
        } else if P_SUB_PERIOD_INVEST.is_match(&title) {
            push(Tag::PeriodInvest, &mut tags);
        } else if P_SUB_TRANSFER_CUSTODY.is_match(&title) {
            push(Tag::TransferCustody, &mut tags);
        } else if P_SUB_NON_TRANSACTION.is_match(&title) {
            push(Tag::NonTransactionTransfer, &mut tags);
        }
    }
    tags
}

fn stock_bourse(answers: &AnswerManager<'_>) -> Vec<Tag> {
    let answer = answers.value(F_LISTED_BOURSE);
    if crate::pattern::P_BOURSE_SH.is_match(answer) {
        return vec![Tag::Shanghai];
    }
    if crate::pattern::P_BOURSE_SZ.is_match(answer) {
        return vec![Tag::Shenzhen];
    }
    Vec::new()
}

/// Share categories disclosed in the definition chapter, ordered {A, C}.
fn share_category(reader: &Reader<'_>) -> Vec<Tag> {
    let patterns = vec![chapters::FUND_PARAPHRASE.pattern.clone()];
    let (_, paragraphs) = reader.find_paragraphs_by_chapters(&patterns, true);
    let mut tags = Vec::new();
    for (tag, pattern) in [(Tag::ShareA, &*P_SHARE_A), (Tag::ShareC, &*P_SHARE_C)] {
        if paragraphs
            .iter()
            .any(|p| pattern.is_match(&clean_txt(&p.text)))
        {
            tags.push(tag);
        }
    }
    tags
}

/// TRUSTEE by default; SECURITIES_TRADER when the custody-property or
/// instructions chapter mentions a 证券资金账户.
fn settle_accounts_mode(reader: &Reader<'_>) -> Vec<Tag> {
    for chapter in [&*chapters::CUSTODY_PROPERTY, &*chapters::CUSTODY_INSTRUCTIONS] {
        let patterns = vec![chapter.pattern.clone()];
        let (_, paragraphs) = reader.find_paragraphs_by_chapters(&patterns, true);
        for paragraph in paragraphs {
            if clean_txt(&paragraph.text).contains("证券资金账户") {
                return vec![Tag::SecuritiesTrader];
            }
        }
    }
    vec![Tag::Trustee]
}

fn project_name(answers: &AnswerManager<'_>) -> Vec<Tag> {
    let name = answers.value(F_PLAN_NAME);
    if name.contains("单一") {
        return vec![Tag::Single];
    }
    if name.contains("集合") {
        return vec![Tag::Pooled];
    }
    Vec::new()
}

fn project_type(answers: &AnswerManager<'_>) -> Vec<Tag> {
    let category = answers.value(F_PLAN_CATEGORY);
    PROJECT_TYPE_TABLE
        .iter()
        .filter(|(_, pattern)| pattern.is_match(category))
        .map(|(tag, _)| *tag)
        .collect()
}

/// NO when the plan has no holder-meeting chapter or explicitly opts out
/// ("不设份额持有人大会…"); YES otherwise.
fn holder_meeting(reader: &Reader<'_>) -> Vec<Tag> {
    let mut found = Vec::new();
    for chapter in [&*chapters::ASSET_PARTICIPATION, &*chapters::ASSET_GENERAL_MEETING] {
        found.extend(reader.find_chapters_by_pattern(&chapter.pattern));
    }
    if found.is_empty() {
        return vec![Tag::No];
    }
    for chapter in found {
        for paragraph in reader.paragraphs_in_range(chapter.range, chapter.element_index) {
            if crate::pattern::P_WITHOUT_HOLDER_MEETING.is_match(&clean_txt(&paragraph.text)) {
                return vec![Tag::No];
            }
        }
    }
    vec![Tag::Yes]
}

fn investment_adviser(answers: &AnswerManager<'_>) -> Vec<Tag> {
    let answer = clean_txt(answers.value(F_ADVISER));
    yes_no(crate::pattern::P_EMPLOY_INVESTMENT_ADVISER.is_match(&answer))
}

fn asset_operate_mode(answers: &AnswerManager<'_>) -> Vec<Tag> {
    if crate::pattern::P_OPERATE_MODE_CLOSE.is_match(answers.value(F_OPERATE_MODE)) {
        vec![Tag::Close]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Answer, DocumentBundle};
    use std::collections::BTreeMap;

    fn bundle_with_answers(mold: Mold, pairs: &[(&str, &str)]) -> DocumentBundle {
        let mut answers = BTreeMap::new();
        for (field, value) in pairs {
            answers.insert(
                field.to_string(),
                Answer {
                    value: Some(value.to_string()),
                    outlines: BTreeMap::new(),
                },
            );
        }
        DocumentBundle {
            fid: "doc".into(),
            mold,
            paragraphs: Vec::new(),
            chapters: Vec::new(),
            answers,
        }
    }

    fn classify(mold: Mold, pairs: &[(&str, &str)]) -> Classification {
        let bundle = bundle_with_answers(mold, pairs);
        let reader = Reader::new(&bundle);
        let answers = AnswerManager::new(&bundle);
        resolve_classification(&reader, &answers, mold)
    }

    #[test]
    fn regular_open_bond_fund() {
        let classification = classify(
            Mold::PublicFund,
            &[
                (F_OPERATE_MODE, "开放式"),
                (F_FUND_NAME, "XX定期开放债券型证券投资基金"),
            ],
        );
        let modes = classification.tags(ClassifyName::OperateMode);
        assert!(modes.contains(&Tag::Open));
        assert!(modes.contains(&Tag::RegularOpen));
        assert_eq!(modes.len(), 2);
        assert_eq!(classification.tags(ClassifyName::FundType), &[Tag::Bond]);
    }

    #[test]
    fn close_displaces_open() {
        let classification = classify(
            Mold::PublicFund,
            &[
                (F_OPERATE_MODE, "开放式"),
                (F_FUND_NAME, "XX封闭运作混合型基金"),
            ],
        );
        assert_eq!(
            classification.tags(ClassifyName::OperateMode),
            &[Tag::Close]
        );
        assert_eq!(
            classification.tags(ClassifyName::FundType),
            &[Tag::Mixture]
        );
    }

    #[test]
    fn money_fund_short_circuits() {
        let classification = classify(
            Mold::PublicFund,
            &[
                (F_FUND_CATEGORY, "债券型"),
                (F_FUND_NAME, "XX货币市场基金"),
            ],
        );
        assert_eq!(classification.tags(ClassifyName::FundType), &[Tag::Money]);
    }

    #[test]
    fn gold_etf_implies_etf_but_not_linked() {
        let classification = classify(
            Mold::PublicFund,
            &[(F_FUND_NAME, "XX黄金交易型开放式证券投资基金")],
        );
        let special = classification.tags(ClassifyName::SpecialType);
        assert!(special.contains(&Tag::GoldEtf));
        assert!(special.contains(&Tag::Etf));
        assert!(!special.contains(&Tag::GoldEtfLinked));
    }

    #[test]
    fn gold_etf_linked_implies_linked_fund() {
        let classification = classify(
            Mold::PublicFund,
            &[(F_FUND_NAME, "XX黄金交易型开放式证券投资基金联接基金")],
        );
        let special = classification.tags(ClassifyName::SpecialType);
        assert!(special.contains(&Tag::GoldEtfLinked));
        assert!(special.contains(&Tag::LinkedFund));
        assert!(!special.contains(&Tag::GoldEtf));
    }

    #[test]
    fn custody_excludes_linked_and_classified() {
        let classification = classify(
            Mold::PublicCustody,
            &[(F_FUND_NAME, "XX分级黄金交易型开放式证券投资基金联接基金")],
        );
        let special = classification.tags(ClassifyName::SpecialType);
        assert!(!special.contains(&Tag::Classification));
        assert!(!special.contains(&Tag::GoldEtfLinked));
    }

    #[test]
    fn scope_stock_requires_bare_stock() {
        let tags = investment_scope("股票期权", None);
        assert!(tags.contains(&Tag::StockOptions));
        assert!(!tags.contains(&Tag::ScopeStock));
        let tags = investment_scope("股票、债券", None);
        assert!(tags.contains(&Tag::ScopeStock));
        assert!(tags.contains(&Tag::ScopeBond));
    }

    #[test]
    fn missing_answers_yield_empty_tags() {
        let classification = classify(Mold::PublicFund, &[]);
        assert!(classification.tags(ClassifyName::SpecialType).is_empty());
        assert!(classification.tags(ClassifyName::StockBourse).is_empty());
    }

    #[test]
    fn asset_plan_classification() {
        let classification = classify(
            Mold::AssetManagement,
            &[
                (F_PLAN_NAME, "XX集合资产管理计划"),
                (F_PLAN_CATEGORY, "固定收益类"),
                (F_PLAN_SCOPE, "债券及股权类资产"),
            ],
        );
        assert_eq!(classification.tags(ClassifyName::ProjectName), &[Tag::Pooled]);
        assert_eq!(
            classification.tags(ClassifyName::ProjectType),
            &[Tag::FixedIncomeCategory]
        );
        assert_eq!(classification.tags(ClassifyName::StockRight), &[Tag::Yes]);
        assert_eq!(
            classification.tags(ClassifyName::NonStandardInvestment),
            &[Tag::Yes]
        );
    }
}
