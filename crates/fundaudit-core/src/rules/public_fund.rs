//! Built-in rules for the public-fund contract mold.

use crate::chapters::{
    ChapterRule, FUND_ADMINISTRATIVE_FEE, FUND_EXPENSES, FUND_INVEST, FUND_LISTED_TRANSACTION,
    FUND_SHARE_HOLDER, FUND_SUBSCRIPTION, FUND_TRUSTEE_FEE,
};
use crate::classify::{ClassifyName, Tag};
use crate::condition::{canned, content, Condition};
use crate::template::{
    OptionalBranch, RewriteKind, RewriteNode, RewriteRule, Rule, SchemaField, Template,
    TemplateItem, TemplateName,
};

pub fn rules() -> Vec<Rule> {
    vec![
        redemption_payment_rule(),
        trustee_fee_rule(),
        administrative_fee_rule(),
        c_class_fee_rule(),
        huge_redemption_meeting_rule(),
        hk_stock_ratio_rule(),
        investment_scope_rule(),
        listed_transaction_rule(),
        share_classify_rule(),
    ]
}

/// Redemption payout within T+7, confirmation within T+3.
fn redemption_payment_rule() -> Rule {
    let mut rule = Rule::new("template_305", "赎回款项的支付", "基金份额的申购与赎回");
    rule.from = vec!["公开募集开放式证券投资基金流动性风险管理规定（证监会公告〔2017〕12号）".into()];
    rule.origin = vec![
        "第十五条 基金管理人应当在基金合同中约定，自接受基金份额持有人赎回申请之日起七个工作日内支付赎回款项。".into(),
    ];
    let mut template = Template::new(
        TemplateName::Editing,
        vec![
            TemplateItem::leaf(
                "基金管理人应在T+{X1}日内对该交易的有效性进行确认，投资人可在T+{X2}日后查询申请的确认情况。",
            ),
            TemplateItem::leaf("基金管理人将在T+{X}日内支付赎回款项。"),
        ],
    )
    .in_chapter(ChapterRule::of(&[&FUND_SUBSCRIPTION]))
    .with_content_condition(content::payment_of_redemption());
    template.min_ratio = 0.5;
    rule.templates = vec![template];
    rule
}

/// Trustee fee: declared annual rate must match the accrual formula.
fn trustee_fee_rule() -> Rule {
    let mut rule = Rule::new("template_950", "基金费用", "基金费用");
    rule.schema_fields = vec![
        SchemaField::plain("托管费率"),
        SchemaField::plain("托管费计提及支付方式"),
    ];
    rule.from =
        vec!["证券投资基金托管业务管理办法（证监会令第172号修订 2020年7月10日）".into()];
    rule.origin = vec![
        "第二十五条 基金托管人应当按照市场化原则，综合考虑基金托管规模、产品类别、服务内容、业务处理难易程度等因素，与基金管理人协商确定基金托管费用的计算方式和方法。".into(),
        "基金托管费用的计提方式和计算方法应当在基金合同、托管协议、基金招募说明书中明确列示。".into(),
    ];
    let mut template = Template::new(
        TemplateName::Editing,
        vec![
            TemplateItem::leaf("（一）基金托管人的托管费"),
            TemplateItem::leaf("本基金的托管费按前一日基金资产净值的{X}的年费率计提。托管费的计算方法如下："),
            TemplateItem::leaf("H=E×{X1}÷当年天数"),
            TemplateItem::leaf("H为每日应计提的基金托管费"),
            TemplateItem::leaf("E为前一日的基金资产净值"),
            TemplateItem::gated(
                vec![canned::linked_fund()],
                vec![
                    TemplateItem::leaf(
                        "基金托管人对本基金投资组合中投资于目标ETF部分的基金资产净值不计提基金托管费。",
                    ),
                    TemplateItem::leaf(
                        "前一日的基金资产净值为已扣除本基金投资于目标ETF部分基金资产净值后的净额，金额为负时以零计。",
                    ),
                ],
            ),
            TemplateItem::leaf("基金的其他费用按照《基金合同》的约定计提和支付。"),
        ],
    )
    .in_chapter(ChapterRule::of(&[&FUND_EXPENSES, &FUND_TRUSTEE_FEE]))
    .with_content_condition(content::trustee_fee());
    template.min_ratio = 0.3;
    rule.templates = vec![template];
    rule
}

/// Management fee, same shape as the trustee fee.
fn administrative_fee_rule() -> Rule {
    let mut rule = Rule::new("template_951", "基金费用-管理费", "基金费用");
    rule.schema_fields = vec![
        SchemaField::plain("管理费率"),
        SchemaField::plain("管理费计提及支付方式"),
    ];
    rule.from = vec!["公开募集证券投资基金运作管理办法（证监会令第104号）".into()];
    rule.origin = vec![
        "第三十七条 基金管理人、基金托管人按照基金合同的约定提取管理费、托管费。".into(),
    ];
    let mut template = Template::new(
        TemplateName::Editing,
        vec![
            TemplateItem::leaf("（一）基金管理人的管理费"),
            TemplateItem::leaf("本基金的管理费按前一日基金资产净值的{X}的年费率计提。管理费的计算方法如下："),
            TemplateItem::leaf("H=E×{X1}÷当年天数"),
            TemplateItem::leaf("H为每日应计提的基金管理费"),
            TemplateItem::leaf("E为前一日的基金资产净值"),
        ],
    )
    .in_chapter(ChapterRule::of(&[&FUND_EXPENSES, &FUND_ADMINISTRATIVE_FEE]))
    .with_content_condition(content::administrative_fee());
    template.min_ratio = 0.3;
    rule.templates = vec![template];
    rule
}

/// C-class sales service fee, only for funds whose definition chapter
/// discloses C shares.
fn c_class_fee_rule() -> Rule {
    let mut rule = Rule::new("template_952", "C类销售服务费", "基金费用");
    rule.schema_fields = vec![SchemaField::plain("销售服务费率")];
    rule.from = vec!["公开募集证券投资基金运作管理办法（证监会令第104号）".into()];
    rule.origin = vec![
        "第三十七条 基金份额分类收取销售服务费的，其计提方式和费率水平应当在基金合同中明确约定。".into(),
    ];
    let template = Template::new(
        TemplateName::Editing,
        vec![TemplateItem::Gated {
            conditions: vec![canned::share_category_c()],
            items: vec![
                TemplateItem::leaf("C类基金份额的销售服务费年费率为{X}。"),
                TemplateItem::leaf(
                    "C类基金份额的销售服务费按前一日C类基金份额的基金资产净值的{X}的年费率计提。计算方法如下：",
                ),
                TemplateItem::leaf("H=E×{X1}÷当年天数"),
                TemplateItem::leaf("H为C类基金份额每日应计提的销售服务费"),
                TemplateItem::leaf("E为前一日C类基金份额的基金资产净值"),
            ],
        }],
    )
    .in_chapter(ChapterRule::of(&[
        &FUND_EXPENSES,
        &crate::chapters::FUND_C_CLASS_FEE,
    ]))
    .with_content_condition(content::c_class_sales_service_fee())
    .min_ratio(0.3);
    rule.templates = vec![template];
    rule
}

/// "连续X个工作日出现前述情形无需召开持有人大会" must keep X within
/// the regulated bounds.
fn huge_redemption_meeting_rule() -> Rule {
    let mut rule = Rule::new(
        "template_701",
        "无需召开基金份额持有人大会的情形",
        "基金份额持有人大会",
    );
    rule.from = vec!["公开募集证券投资基金运作管理办法（证监会令第104号）".into()];
    rule.origin = vec![
        "第二十一条 ……基金合同可以约定，连续发生巨额赎回等情形时无需召开基金份额持有人大会。".into(),
    ];
    let template = Template::new(
        TemplateName::Editing,
        vec![TemplateItem::leaf(
            "连续{X}个工作日出现前述情形的，基金管理人无需召开基金份额持有人大会。",
        )],
    )
    .in_chapter(ChapterRule::of(&[&FUND_SHARE_HOLDER]))
    .with_content_condition(content::working_day_of_foregoing())
    .min_ratio(0.5);
    rule.templates = vec![template];
    rule
}

/// HK-stock portfolio ceiling, gated on the investment scope.
fn hk_stock_ratio_rule() -> Rule {
    let mut rule = Rule::new("template_790", "港股通投资比例", "基金的投资");
    rule.schema_fields = vec![SchemaField::when(
        "基金投资范围",
        vec![Condition::equal(
            ClassifyName::InvestmentScope,
            Tag::ScopeHkStock,
        )],
    )];
    rule.from = vec!["内地与香港股票市场交易互联互通机制若干规定（证监会令第128号）".into()];
    rule.origin = vec![
        "第十六条 名称中含有“港股”等类似字样的基金产品，应当将80%以上（含）的非现金基金资产投资于港股通股票。".into(),
    ];
    let template = Template::new(
        TemplateName::Law,
        vec![TemplateItem::leaf(
            "本基金投资于港股通标的股票的比例不低于非现金基金资产的{X}。",
        )],
    )
    .in_chapter(ChapterRule::of(&[&FUND_INVEST]))
    .with_content_condition(content::hk_stock_investment_ratio())
    .min_ratio(0.5);
    rule.templates = vec![template];
    rule
}

/// Investment-scope summary clause: the enumerated instruments reorder
/// to the document's own phrasing, and condition-gated instruments drop
/// when the classification excludes them.
fn investment_scope_rule() -> Rule {
    use crate::pattern::PatternCollection;
    use crate::template::RecombineEntry;

    let mut rule = Rule::new("template_401", "基金的投资范围", "基金的投资");
    rule.schema_fields = vec![SchemaField::plain("基金投资范围")];
    rule.from = vec!["公开募集证券投资基金运作管理办法（证监会令第104号）".into()];
    rule.origin = vec![
        "第三十二条 基金合同和基金招募说明书应当按照有关规定载明基金的投资方向与投资范围。".into(),
    ];
    let mut node = RewriteNode::new(RewriteKind::InnerRecombination);
    node.rules = vec![(
        "IRC_1".to_string(),
        RewriteRule::Recombine {
            para_pattern: PatternCollection::single(
                "本基金的?投资范围(?:主要)?[为是包括](?P<content>.+?)。?$",
            )
            .unwrap(),
            entries: vec![
                RecombineEntry::new(PatternCollection::single("股票").unwrap(), "股票"),
                RecombineEntry::new(PatternCollection::single("债券").unwrap(), "债券"),
                RecombineEntry::new(
                    PatternCollection::single("货币市场工具").unwrap(),
                    "货币市场工具",
                ),
                RecombineEntry::new(
                    PatternCollection::single("资产支持证券").unwrap(),
                    "资产支持证券",
                )
                .when(vec![Condition::equal(
                    ClassifyName::InvestmentScope,
                    Tag::Abs,
                )]),
                RecombineEntry::new(
                    PatternCollection::single("存托凭证").unwrap(),
                    "存托凭证",
                )
                .when(vec![Condition::equal(
                    ClassifyName::InvestmentScope,
                    Tag::Dr,
                )])
                .optional(),
            ],
            exclude_patterns: None,
            default: "股票、债券、货币市场工具".to_string(),
        },
    )];
    node.items = vec![TemplateItem::leaf(
        "本基金的投资范围为具有良好流动性的金融工具，包括{IRC_1}以及法律法规或中国证监会允许基金投资的其他金融工具。",
    )];
    let template = Template::new(
        TemplateName::Editing,
        vec![TemplateItem::Rewrite(Box::new(node))],
    )
    .in_chapter(ChapterRule::of(&[&FUND_INVEST]))
    .min_ratio(0.5);
    rule.templates = vec![template];
    rule
}

/// The listing clause names the fund's own exchange.
fn listed_transaction_rule() -> Rule {
    let mut rule = Rule::new("template_810", "基金份额的上市交易", "基金份额的上市交易");
    rule.from = vec!["证券投资基金上市规则".into()];
    rule.origin =
        vec!["第二章 基金上市…… 基金份额在证券交易所上市交易的，应当载明上市的交易所。".into()];
    let mut node = RewriteNode::new(RewriteKind::InnerReplace);
    node.rules = vec![(
        "IRP_1".to_string(),
        RewriteRule::Replace {
            func: "get_fund_bourse_name".to_string(),
            default: "***".to_string(),
        },
    )];
    node.items = vec![TemplateItem::leaf(
        "本基金基金份额上市交易的证券交易所为{IRP_1}证券交易所。",
    )];
    let template = Template::new(
        TemplateName::Editing,
        vec![TemplateItem::Gated {
            conditions: vec![Condition::equal(ClassifyName::ListedTransaction, Tag::Yes)],
            items: vec![TemplateItem::Rewrite(Box::new(node))],
        }],
    )
    .in_chapter(ChapterRule::of(&[&FUND_LISTED_TRANSACTION]))
    .min_ratio(0.5);
    rule.templates = vec![template];
    rule
}

/// Share-class disclosure: phrasing depends on whether classes exist.
fn share_classify_rule() -> Rule {
    let mut rule = Rule::new("template_120", "基金份额的类别", "基金的基本情况");
    rule.from = vec!["公开募集证券投资基金运作管理办法（证监会令第104号）".into()];
    rule.origin = vec![
        "第十五条 基金份额设置不同类别的，应当在基金合同中明确各类别份额的费率结构与适用范围。".into(),
    ];
    let template = Template::new(
        TemplateName::Editing,
        vec![TemplateItem::SingleOptional(vec![
            OptionalBranch {
                conditions: vec![Condition::equal(ClassifyName::ShareClassify, Tag::Yes)],
                items: vec![TemplateItem::leaf(
                    "本基金根据认购、申购费用与销售服务费收取方式的不同，将基金份额分为不同的类别。",
                )],
            },
            OptionalBranch {
                conditions: Vec::new(),
                items: vec![TemplateItem::leaf("本基金不设基金份额类别。")],
            },
        ])],
    )
    .in_chapter(ChapterRule::of(&[
        &crate::chapters::FUND_BASIC_INFORMATION,
    ]))
    .min_ratio(0.5);
    rule.templates = vec![template];
    rule
}
