//! Condition logic gating rules and template branches.
//!
//! A [`Condition`] names a classification dimension and a list of
//! branches; the condition holds when any branch holds (OR), a condition
//! list holds when every condition holds (AND), and an [`AllMatch`]
//! branch holds when all of its relations hold.

pub mod content;

use serde::Serialize;

use crate::classify::{Classification, ClassifyName, Tag};

pub use content::{
    compare_value_with_relation, ContentCheck, ContentRule, ContentType, ContentValueRelation,
    PatternValue,
};

/// Comparison relation between a classification (or extracted value) and
/// a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Relation {
    Equal,
    Unequal,
    Gte,
    Lte,
    Lt,
    Gt,
}

impl Relation {
    pub fn label(&self) -> &'static str {
        match self {
            Relation::Equal => "等于",
            Relation::Unequal => "不等于",
            Relation::Gte => "大于等于",
            Relation::Lte => "小于等于",
            Relation::Lt => "小于",
            Relation::Gt => "大于",
        }
    }
}

/// One tag membership test. `target` overrides the owning condition's
/// dimension when set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRelation {
    pub target: Option<ClassifyName>,
    pub tag: Tag,
    pub relation: Relation,
}

impl TagRelation {
    pub fn equal(tag: Tag) -> Self {
        Self {
            target: None,
            tag,
            relation: Relation::Equal,
        }
    }

    pub fn unequal(tag: Tag) -> Self {
        Self {
            target: None,
            tag,
            relation: Relation::Unequal,
        }
    }

    pub fn on(target: ClassifyName, tag: Tag) -> Self {
        Self {
            target: Some(target),
            tag,
            relation: Relation::Equal,
        }
    }

    pub fn on_unequal(target: ClassifyName, tag: Tag) -> Self {
        Self {
            target: Some(target),
            tag,
            relation: Relation::Unequal,
        }
    }
}

/// A condition branch: a single relation, or a conjunction that must
/// hold in full.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RelationBranch {
    One(TagRelation),
    AllMatch(Vec<TagRelation>),
}

/// A named condition: OR over branches against the classification map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub name: ClassifyName,
    pub any_of: Vec<RelationBranch>,
}

impl Condition {
    pub fn equal(name: ClassifyName, tag: Tag) -> Self {
        Self {
            name,
            any_of: vec![RelationBranch::One(TagRelation::equal(tag))],
        }
    }

    pub fn unequal(name: ClassifyName, tag: Tag) -> Self {
        Self {
            name,
            any_of: vec![RelationBranch::One(TagRelation::unequal(tag))],
        }
    }

    /// Any of several tags on the same dimension.
    pub fn any(name: ClassifyName, tags: &[Tag]) -> Self {
        Self {
            name,
            any_of: tags
                .iter()
                .map(|tag| RelationBranch::One(TagRelation::equal(*tag)))
                .collect(),
        }
    }

    pub fn branches(name: ClassifyName, any_of: Vec<RelationBranch>) -> Self {
        Self { name, any_of }
    }
}

/// Verify a condition list: all conditions must hold.
pub fn verify_conditions(conditions: &[Condition], classification: &Classification) -> bool {
    conditions
        .iter()
        .all(|condition| verify_one(condition, classification))
}

fn verify_one(condition: &Condition, classification: &Classification) -> bool {
    condition.any_of.iter().any(|branch| match branch {
        RelationBranch::One(relation) => verify_relation(relation, condition.name, classification),
        RelationBranch::AllMatch(relations) => relations
            .iter()
            .all(|relation| verify_relation(relation, condition.name, classification)),
    })
}

/// EQUAL/UNEQUAL are membership tests against the tag list. Ordering
/// relations never apply to tags (they are reserved for content values)
/// and evaluate false.
fn verify_relation(
    relation: &TagRelation,
    default: ClassifyName,
    classification: &Classification,
) -> bool {
    let name = relation.target.unwrap_or(default);
    let tags = classification.tags(name);
    match relation.relation {
        Relation::Equal => tags.contains(&relation.tag),
        Relation::Unequal => !tags.contains(&relation.tag),
        _ => false,
    }
}

/// Render a condition list into the human reason used by an
/// IgnoreCondition verdict, e.g. "计划名称为“集合”且特殊类别非“ETF”".
pub fn describe_conditions(conditions: &[Condition]) -> String {
    let parts: Vec<String> = conditions.iter().map(describe_one).collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("当前基金不满足条件：{}", parts.join("且"))
    }
}

fn describe_one(condition: &Condition) -> String {
    let branches: Vec<String> = condition
        .any_of
        .iter()
        .map(|branch| match branch {
            RelationBranch::One(relation) => describe_relation(relation, condition.name),
            RelationBranch::AllMatch(relations) => relations
                .iter()
                .map(|relation| describe_relation(relation, condition.name))
                .collect::<Vec<_>>()
                .join("并"),
        })
        .collect();
    branches.join("或")
}

fn describe_relation(relation: &TagRelation, default: ClassifyName) -> String {
    let name = relation.target.unwrap_or(default);
    match relation.relation {
        Relation::Unequal => format!("{}非“{}”", name.label(), relation.tag.label()),
        _ => format!("{}为“{}”", name.label(), relation.tag.label()),
    }
}

/// Canned conditions shared by the rule library and schema checkers.
pub mod canned {
    use super::*;

    pub fn pooled() -> Condition {
        Condition::equal(ClassifyName::ProjectName, Tag::Pooled)
    }

    pub fn single_or_pooled() -> Condition {
        Condition::any(ClassifyName::ProjectName, &[Tag::Single, Tag::Pooled])
    }

    pub fn stock_right_yes() -> Condition {
        Condition::equal(ClassifyName::StockRight, Tag::Yes)
    }

    pub fn holder_meeting_yes() -> Condition {
        Condition::equal(ClassifyName::GeneralMeeting, Tag::Yes)
    }

    pub fn operate_close() -> Condition {
        Condition::equal(ClassifyName::OperateMode, Tag::Close)
    }

    pub fn fixed_income() -> Condition {
        Condition::equal(ClassifyName::ProjectType, Tag::FixedIncomeCategory)
    }

    pub fn mixed_class() -> Condition {
        Condition::equal(ClassifyName::ProjectType, Tag::MixedClass)
    }

    pub fn equities_or_derivatives() -> Condition {
        Condition::any(
            ClassifyName::ProjectType,
            &[Tag::Equities, Tag::FuturesAndDerivatives],
        )
    }

    pub fn non_standard_yes() -> Condition {
        Condition::equal(ClassifyName::NonStandardInvestment, Tag::Yes)
    }

    pub fn non_standard_no() -> Condition {
        Condition::equal(ClassifyName::NonStandardInvestment, Tag::No)
    }

    pub fn fof() -> Condition {
        Condition::branches(
            ClassifyName::FundType,
            vec![RelationBranch::One(TagRelation::on(
                ClassifyName::SpecialType,
                Tag::Fof,
            ))],
        )
    }

    pub fn linked_fund() -> Condition {
        Condition::branches(
            ClassifyName::FundType,
            vec![RelationBranch::One(TagRelation::on(
                ClassifyName::SpecialType,
                Tag::LinkedFund,
            ))],
        )
    }

    pub fn etf() -> Condition {
        Condition::branches(
            ClassifyName::FundType,
            vec![RelationBranch::One(TagRelation::on(
                ClassifyName::SpecialType,
                Tag::Etf,
            ))],
        )
    }

    pub fn not_etf() -> Condition {
        Condition::branches(
            ClassifyName::FundType,
            vec![RelationBranch::One(TagRelation::on_unequal(
                ClassifyName::SpecialType,
                Tag::Etf,
            ))],
        )
    }

    pub fn hk_stock() -> Condition {
        Condition::equal(ClassifyName::SpecialType, Tag::HkStock)
    }

    pub fn not_hk_stock() -> Condition {
        Condition::unequal(ClassifyName::SpecialType, Tag::HkStock)
    }

    pub fn share_category_c() -> Condition {
        Condition::equal(ClassifyName::ShareCategory, Tag::ShareC)
    }

    pub fn money_fund() -> Condition {
        Condition::equal(ClassifyName::FundType, Tag::Money)
    }

    pub fn not_money_fund() -> Condition {
        Condition::unequal(ClassifyName::FundType, Tag::Money)
    }
}
