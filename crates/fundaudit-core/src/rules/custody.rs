//! Built-in rules for the custody-agreement mold.

use crate::chapters::{ChapterRule, CUSTODY_EXPENSES, CUSTODY_NET_ASSET_VALUE};
use crate::classify::{ClassifyName, Tag};
use crate::condition::{canned, content, Condition};
use crate::pattern::{PatternCollection, P_PARA_PREFIX_NUM};
use crate::template::{
    RewriteKind, RewriteNode, Rule, SchemaField, Template, TemplateItem, TemplateName,
};

pub fn rules() -> Vec<Rule> {
    vec![custody_fee_rule(), fof_valuation_rule(), settle_mode_rule()]
}

/// Custody fee consistency between the declared rate and the formula.
fn custody_fee_rule() -> Rule {
    let mut rule = Rule::new("template_955", "基金费用", "基金费用");
    rule.schema_fields = vec![
        SchemaField::plain("托管费率"),
        SchemaField::plain("托管费计提及支付方式"),
    ];
    rule.from =
        vec!["证券投资基金托管业务管理办法（证监会令第172号修订 2020年7月10日）".into()];
    rule.origin = vec![
        "第二十五条 基金托管人应当按照市场化原则……与基金管理人协商确定基金托管费用的计算方式和方法。".into(),
    ];
    let template = Template::new(
        TemplateName::Editing,
        vec![
            TemplateItem::leaf("本基金的托管费按前一日基金资产净值的{X}的年费率计提。"),
            TemplateItem::leaf("H=E×{X1}÷当年天数"),
            TemplateItem::leaf("H为每日应计提的基金托管费"),
            TemplateItem::leaf("E为前一日的基金资产净值"),
        ],
    )
    .in_chapter(ChapterRule::of(&[&CUSTODY_EXPENSES]))
    .with_content_condition(content::trustee_fee())
    .min_ratio(0.3);
    rule.templates = vec![template];
    rule
}

/// FOF valuation method: sub-chapters may appear in any order, their
/// internal enumerations renumber with the document.
fn fof_valuation_rule() -> Rule {
    let mut rule = Rule::new(
        "template_941",
        "估值方法-证券投资基金的估值",
        "基金资产净值计算和会计核算",
    );
    rule.schema_fields = vec![SchemaField::plain("估值方法")];
    rule.from = vec![
        "《公开募集证券投资基金运作指引第2号——基金中基金指引（证监会公告〔2016〕20号 2016年9月11日）》".into(),
        "《基金中基金（FOF）审核指引（证监会机构部2017年4月24日）》".into(),
    ];
    rule.origin = vec![
        "第八条 基金中基金应当采用公允的估值方法，及时、准确地反映基金资产的价值变动。".into(),
        "七、估值方法及时效".into(),
        "（一）FOF的估值按照《基金中基金估值业务指引》执行。".into(),
    ];

    let mut unlisted = RewriteNode::new(RewriteKind::Recombination);
    unlisted.patterns = vec![
        PatternCollection::compile(["非货币市场"]).unwrap(),
        PatternCollection::compile(["货币市场基金[^，。]*?披露份额净值"]).unwrap(),
    ];
    unlisted.items = vec![
        TemplateItem::leaf("境内非货币市场基金按其估值日的份额净值估值；"),
        TemplateItem::leaf(
            "境内货币市场基金，如其披露份额净值，则按其估值日的份额净值估值；如其披露万份（百份）收益，按其前一估值日后至估值日期间（含节假日）的万份（百份）收益计提估值日基金收益。",
        ),
    ];
    unlisted.serial_num = Some(P_PARA_PREFIX_NUM.clone());
    unlisted.default_prefix = Some("{num}）".to_string());

    let mut listed = RewriteNode::new(RewriteKind::Recombination);
    listed.patterns = vec![
        PatternCollection::compile(["ETF基金"]).unwrap(),
        PatternCollection::compile(["上市开放式基金|LOF"]).unwrap(),
        PatternCollection::compile(["定期开放式基金|封闭式基金"]).unwrap(),
        PatternCollection::compile(["交易型货币市场基金"]).unwrap(),
    ];
    listed.items = vec![
        TemplateItem::leaf("ETF基金按其估值日的收盘价估值；"),
        TemplateItem::leaf("境内上市开放式基金（LOF）按其估值日的份额净值估值；"),
        TemplateItem::leaf("境内上市定期开放式基金、封闭式基金按其估值日的收盘价估值；"),
        TemplateItem::leaf(
            "对于境内上市交易型货币市场基金，如其披露份额净值，则按其估值日的份额净值估值；如其披露万份（百份）收益，则按其前一估值日后至估值日期间（含节假日）的万份（百份）收益计提估值日基金收益。",
        ),
    ];
    listed.serial_num = Some(P_PARA_PREFIX_NUM.clone());
    listed.default_prefix = Some("{num}）".to_string());

    let mut chapter_combination = RewriteNode::new(RewriteKind::ChapterCombination);
    chapter_combination.patterns = vec![
        PatternCollection::compile(["非上市基金的估值"]).unwrap(),
        PatternCollection::compile(["上市基金的估值"]).unwrap(),
    ];
    chapter_combination.items = vec![
        TemplateItem::leaf("非上市基金的估值"),
        TemplateItem::leaf("上市基金的估值"),
    ];
    chapter_combination.child_items = vec![
        TemplateItem::Rewrite(Box::new(unlisted)),
        TemplateItem::Rewrite(Box::new(listed)),
    ];
    chapter_combination.serial_num = Some(P_PARA_PREFIX_NUM.clone());
    chapter_combination.default_prefix = Some("（{num}）".to_string());

    let template = Template::new(
        TemplateName::Editing,
        vec![TemplateItem::Gated {
            conditions: vec![canned::fof()],
            items: vec![
                TemplateItem::alt(&["证券投资基金的估值", "基金份额的估值"]),
                TemplateItem::Rewrite(Box::new(chapter_combination)),
                TemplateItem::leaf(
                    "当基金管理人认为所投资基金按上述方式进行估值存在不公允时，应与基金托管人协商一致采用合理的估值技术或估值标准确定其公允价值。",
                ),
            ],
        }],
    )
    .in_chapter(ChapterRule::of(&[&CUSTODY_NET_ASSET_VALUE]))
    .min_ratio(0.4);
    rule.templates = vec![template];
    rule
}

/// Settlement-mode phrasing depends on the probed settle mode.
fn settle_mode_rule() -> Rule {
    let mut rule = Rule::new("template_960", "结算模式", "基金财产的保管");
    rule.from = vec!["证券投资基金托管业务管理办法（证监会令第172号修订 2020年7月10日）".into()];
    rule.origin = vec![
        "第二十条 基金托管人应当根据基金的结算模式，与基金管理人明确资金账户的开立与管理安排。".into(),
    ];
    let template = Template::new(
        TemplateName::Editing,
        vec![TemplateItem::SingleOptional(vec![
            crate::template::OptionalBranch {
                conditions: vec![Condition::equal(
                    ClassifyName::SettleAccountsMode,
                    Tag::SecuritiesTrader,
                )],
                items: vec![TemplateItem::leaf(
                    "本基金采用券商结算模式，基金管理人以基金的名义开立证券资金账户。",
                )],
            },
            crate::template::OptionalBranch {
                conditions: Vec::new(),
                items: vec![TemplateItem::leaf(
                    "本基金采用托管人结算模式，基金托管人负责基金的资金清算与交收。",
                )],
            },
        ])],
    )
    .in_chapter(ChapterRule::of(&[&crate::chapters::CUSTODY_PROPERTY]))
    .min_ratio(0.5);
    rule.templates = vec![template];
    rule
}
