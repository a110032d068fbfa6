//! Built-in rules for the asset-management plan mold.

use crate::chapters::{ChapterRule, ASSET_GENERAL_MEETING, ASSET_PARTICIPATION, ASSET_RAISE};
use crate::condition::canned;
use crate::pattern::PatternCollection;
use crate::template::{
    RewriteKind, RewriteNode, RewriteRule, Rule, RuleFamily, SchemaField, SelectEntry, Template,
    TemplateItem, TemplateName,
};

const R_NOT_PUNCT: &str = ",，。;；";

pub fn rules() -> Vec<Rule> {
    vec![
        raise_mode_rule(),
        meeting_notice_rule(),
        no_meeting_refer_rule(),
    ]
}

/// Raise-mode clause: the sales-qualification vocabulary picks the
/// variant the document itself uses.
fn raise_mode_rule() -> Rule {
    let mut rule = Rule::new("template_1027", "计划的募集方式", "资产管理计划的募集");
    rule.schema_fields = vec![SchemaField::plain("募集方式")];
    rule.from =
        vec!["证券期货经营机构私募资产管理业务管理办法（证监会令第203号修订 2023年1月12日）".into()];
    rule.origin = vec![
        "第十五条 证券期货经营机构可以自行销售资产管理计划，也可以委托具有公开募集证券投资基金（以下简称公募基金）销售资格的机构（以下简称销售机构）销售或者推介资产管理计划。".into(),
        "销售机构应当依法、合规销售或者推介资产管理计划。".into(),
    ];
    let mut node = RewriteNode::new(RewriteKind::SingleSelect);
    node.rules = vec![
        (
            "IR_1".to_string(),
            RewriteRule::Select {
                para_pattern: PatternCollection::single(&format!(
                    "有(?P<content>[^{R_NOT_PUNCT}]+)销售资格"
                ))
                .unwrap(),
                entries: vec![
                    SelectEntry::new(PatternCollection::single("公募基金").unwrap(), "公募基金"),
                    SelectEntry::new(
                        PatternCollection::single("公开募集证券投资基金").unwrap(),
                        "公开募集证券投资基金",
                    ),
                ],
                default: "公募基金".to_string(),
            },
        ),
        (
            "IR_2".to_string(),
            RewriteRule::Select {
                para_pattern: PatternCollection::single(&format!(
                    "销售资格的(?P<content>[^{R_NOT_PUNCT}]+)销售"
                ))
                .unwrap(),
                entries: vec![
                    SelectEntry::new(
                        PatternCollection::single("代理销售机构").unwrap(),
                        "代理销售机构",
                    ),
                    SelectEntry::new(PatternCollection::single("代销机构").unwrap(), "代销机构"),
                    SelectEntry::new(PatternCollection::single("机构").unwrap(), "机构"),
                ],
                default: "机构".to_string(),
            },
        ),
    ];
    node.items = vec![TemplateItem::leaf(
        "管理人可以自行销售本计划，也可以委托具有{IR_1}销售资格的{IR_2}销售或者推介本计划。",
    )];
    let template = Template::new(
        TemplateName::Editing,
        vec![TemplateItem::Rewrite(Box::new(node))],
    )
    .in_chapter(ChapterRule::of(&[&ASSET_RAISE]))
    .min_ratio(0.5);
    rule.templates = vec![template];
    rule
}

/// Holder-meeting notice clause, only for plans that disclose a
/// meeting.
fn meeting_notice_rule() -> Rule {
    let mut rule = Rule::new(
        "template_1043",
        "份额持有人大会的召开通知",
        "份额持有人大会及日常机构",
    );
    rule.from =
        vec!["证券期货经营机构私募资产管理业务管理办法（证监会令第203号修订 2023年1月12日）".into()];
    rule.origin = vec![
        "第四十二条 根据《基金法》和其他有关规定订明资产管理计划份额持有人大会及/或日常机构的下列事项。".into(),
    ];
    let template = Template::new(
        TemplateName::Editing,
        vec![TemplateItem::Gated {
            conditions: vec![canned::pooled(), canned::holder_meeting_yes()],
            items: vec![TemplateItem::leaf(
                "召开份额持有人大会，召集人应当至少提前30日公告份额持有人大会的召开时间、会议形式、审议事项、议事程序和表决方式等事项。",
            )],
        }],
    )
    .in_chapter(ChapterRule::of(&[&ASSET_GENERAL_MEETING]))
    .min_ratio(0.5);
    rule.templates = vec![template];
    rule
}

/// Cross-reference rule: the "无需召开" clause cites the numbered
/// items of the participation chapter.
fn no_meeting_refer_rule() -> Rule {
    let mut rule = Rule::new(
        "template_1048",
        "无需召开份额持有人大会的情形",
        "份额持有人大会及日常机构",
    );
    rule.family = RuleFamily::ReplaceCondition;
    rule.from =
        vec!["证券期货经营机构私募资产管理业务管理办法（证监会令第203号修订 2023年1月12日）".into()];
    rule.origin = vec![
        "第四十三条 订明无需召开份额持有人大会即可变更的事项及其情形。".into(),
    ];
    let mut node = RewriteNode::new(RewriteKind::InnerRefer);
    node.rules = vec![(
        "IRF_1".to_string(),
        RewriteRule::Refer {
            patterns: vec![PatternCollection::single("无需召开份额持有人大会").unwrap()],
            refer_chapter: Some(ChapterRule::of(&[&ASSET_PARTICIPATION])),
            multiple: true,
            default: "X".to_string(),
        },
    )];
    node.items = vec![TemplateItem::leaf(
        "发生本合同第{IRF_1}项情形的，管理人无需召开份额持有人大会。",
    )];
    let template = Template::new(
        TemplateName::Editing,
        vec![TemplateItem::Gated {
            conditions: vec![canned::holder_meeting_yes()],
            items: vec![TemplateItem::Rewrite(Box::new(node))],
        }],
    )
    .in_chapter(ChapterRule::of(&[&ASSET_GENERAL_MEETING]))
    .min_ratio(0.5);
    rule.templates = vec![template];
    rule
}
