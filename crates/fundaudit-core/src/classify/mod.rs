//! Fund classification: molds, categorical tags and the per-document
//! classification map.
//!
//! Classification is computed once per document (memoized, then
//! read-only) and consumed by the condition engine. A classification name
//! maps to a list of tags; a missing answer yields an empty list, which
//! makes EQUAL conditions fail and UNEQUAL conditions hold.

pub mod resolver;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use resolver::resolve_classification;

/// Rule family keyed by document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mold {
    PublicFund,
    PublicCustody,
    AssetManagement,
}

impl Mold {
    pub fn label(&self) -> &'static str {
        match self {
            Mold::PublicFund => "公募-基金合同",
            Mold::PublicCustody => "公募-托管协议",
            Mold::AssetManagement => "公募-资产管理合同",
        }
    }
}

/// The categorical dimensions a document classifies under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClassifyName {
    OperateMode,
    FundType,
    ListedTransaction,
    SpecialType,
    SidePocket,
    ShareClassify,
    InvestmentScope,
    FundSubscription,
    StockBourse,
    SettleAccountsMode,
    ShareCategory,
    ProjectName,
    ProjectType,
    GeneralMeeting,
    InvestmentAdviser,
    NonStandardInvestment,
    StockRight,
}

impl ClassifyName {
    pub fn label(&self) -> &'static str {
        match self {
            ClassifyName::OperateMode => "运作方式",
            ClassifyName::FundType => "基金类型",
            ClassifyName::ListedTransaction => "上市交易",
            ClassifyName::SpecialType => "特殊类别",
            ClassifyName::SidePocket => "侧袋机制",
            ClassifyName::ShareClassify => "份额分类",
            ClassifyName::InvestmentScope => "基金投资范围",
            ClassifyName::FundSubscription => "申购与赎回章节",
            ClassifyName::StockBourse => "交易所",
            ClassifyName::SettleAccountsMode => "结算模式",
            ClassifyName::ShareCategory => "份额类别",
            ClassifyName::ProjectName => "计划名称",
            ClassifyName::ProjectType => "计划类别",
            ClassifyName::GeneralMeeting => "持有人大会",
            ClassifyName::InvestmentAdviser => "投资顾问",
            ClassifyName::NonStandardInvestment => "非标投资",
            ClassifyName::StockRight => "股权",
        }
    }
}

/// A categorical tag. Membership is always tested inside a named
/// classification list, so tags shared between dimensions (Yes/No,
/// Close, Fof) are a single variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tag {
    // Operate mode
    Open,
    RegularOpen,
    Close,
    Initiate,
    // Fund type
    Money,
    Bond,
    Mixture,
    EnhanceIndex,
    StockIndex,
    BondIndex,
    CommoditiesFuturesIndex,
    CommoditiesFutures,
    Stock,
    Index,
    // Special type
    HkStock,
    Fof,
    Lof,
    FeaturesEtf,
    GoldEtfLinked,
    GoldEtf,
    Classification,
    LinkedFund,
    Etf,
    // Investment scope
    ScopeHkStock,
    Credit,
    StockIndexFutures,
    DebtFutures,
    CommodityFutures,
    StockOptions,
    ReFinance,
    Abs,
    Dr,
    Financing,
    SecuritiesLending,
    StarMarket,
    Warrant,
    Ncd,
    ScopeStock,
    ScopeBond,
    FuturesContract,
    // Disclosure
    Yes,
    No,
    // Stock bourse
    Shanghai,
    Shenzhen,
    // Settle accounts mode
    SecuritiesTrader,
    Trustee,
    // Share category
    ShareA,
    ShareC,
    // Subscription sub-chapters
    Convert,
    PeriodInvest,
    TransferCustody,
    NonTransactionTransfer,
    // Asset-management project
    Single,
    Pooled,
    Equities,
    FixedIncomeCategory,
    FuturesAndDerivatives,
    MixedClass,
}

impl Tag {
    /// Human label used when rendering condition reasons.
    pub fn label(&self) -> &'static str {
        match self {
            Tag::Open => "开放式",
            Tag::RegularOpen => "定期开放式",
            Tag::Close => "封闭式",
            Tag::Initiate => "发起式",
            Tag::Money => "货币基金",
            Tag::Bond => "债券型",
            Tag::Mixture => "混合型",
            Tag::EnhanceIndex => "指数增强型",
            Tag::StockIndex => "股票指数型",
            Tag::BondIndex => "债券指数型",
            Tag::CommoditiesFuturesIndex => "商品期货指数型",
            Tag::CommoditiesFutures => "商品期货型",
            Tag::Stock => "股票型",
            Tag::Index => "指数型",
            Tag::HkStock => "港股",
            Tag::Fof => "FOF",
            Tag::Lof => "LOF",
            Tag::FeaturesEtf => "商品期货ETF",
            Tag::GoldEtfLinked => "黄金ETF联接",
            Tag::GoldEtf => "黄金ETF",
            Tag::Classification => "分级基金",
            Tag::LinkedFund => "联接基金",
            Tag::Etf => "ETF",
            Tag::ScopeHkStock => "港股通",
            Tag::Credit => "信用衍生品",
            Tag::StockIndexFutures => "股指期货",
            Tag::DebtFutures => "国债期货",
            Tag::CommodityFutures => "商品期货",
            Tag::StockOptions => "股票期权",
            Tag::ReFinance => "转融通",
            Tag::Abs => "资产支持证券",
            Tag::Dr => "存托凭证",
            Tag::Financing => "融资",
            Tag::SecuritiesLending => "融券",
            Tag::StarMarket => "科创板",
            Tag::Warrant => "权证",
            Tag::Ncd => "同业存单",
            Tag::ScopeStock => "股票",
            Tag::ScopeBond => "债券",
            Tag::FuturesContract => "期货合约",
            Tag::Yes => "是",
            Tag::No => "否",
            Tag::Shanghai => "上交所",
            Tag::Shenzhen => "深交所",
            Tag::SecuritiesTrader => "券商结算模式",
            Tag::Trustee => "托管人结算模式",
            Tag::ShareA => "A类份额",
            Tag::ShareC => "C类份额",
            Tag::Convert => "转换",
            Tag::PeriodInvest => "定期定额投资",
            Tag::TransferCustody => "转托管",
            Tag::NonTransactionTransfer => "非交易过户",
            Tag::Single => "单一",
            Tag::Pooled => "集合",
            Tag::Equities => "权益类",
            Tag::FixedIncomeCategory => "固定收益类",
            Tag::FuturesAndDerivatives => "期货和衍生品类",
            Tag::MixedClass => "混合类",
        }
    }
}

/// The per-document classification map. Tag lists are order-insensitive
/// but stable for a given document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    map: BTreeMap<ClassifyName, Vec<Tag>>,
}

impl Classification {
    pub fn new(map: BTreeMap<ClassifyName, Vec<Tag>>) -> Self {
        Self { map }
    }

    /// Tags for a classification name; empty when never computed.
    pub fn tags(&self, name: ClassifyName) -> &[Tag] {
        self.map.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: ClassifyName, tag: Tag) -> bool {
        self.tags(name).contains(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClassifyName, &Vec<Tag>)> {
        self.map.iter()
    }
}
