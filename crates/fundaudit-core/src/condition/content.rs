//! Numeric / percentage constraints over values extracted from
//! paragraphs ("content values").
//!
//! A [`ContentValueRelation`] binds named extraction patterns (or
//! constants) to a list of checks; each check compares its extracted
//! value against other extracted values or constants under a declared
//! content type. Comparison is total: anything unparsable fails the
//! check, it never panics.

use crate::numeric::{cn_number_to_digit, PercentageUtil};
use crate::pattern::{PatternCollection, R_CN_NUMBER, R_NOT_CONJUNCTION_PUNCTUATION};

use super::{Condition, Relation};

/// How operands normalize before the ordering applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Str,
    Number,
    Percentage,
}

/// A named extraction source: a pattern with a `val` capture group, or a
/// constant.
#[derive(Debug, Clone)]
pub enum PatternValue {
    Patterns(PatternCollection),
    Const(i64),
}

/// One comparison inside a check: the extracted value against the value
/// bound to `ref_key`.
#[derive(Debug, Clone)]
pub struct ContentRule {
    pub ref_key: String,
    pub relation: Relation,
    /// Human name of the reference, used in failure reasons; empty means
    /// "use the value itself".
    pub label: String,
}

impl ContentRule {
    pub fn new(ref_key: &str, relation: Relation) -> Self {
        Self {
            ref_key: ref_key.to_string(),
            relation,
            label: String::new(),
        }
    }

    pub fn labeled(ref_key: &str, relation: Relation, label: &str) -> Self {
        Self {
            ref_key: ref_key.to_string(),
            relation,
            label: label.to_string(),
        }
    }
}

/// One check: rule groups are ANDed, entries inside a group are ORed.
#[derive(Debug, Clone)]
pub struct ContentCheck {
    pub key: String,
    pub name: String,
    pub rules: Vec<Vec<ContentRule>>,
    pub content_type: ContentType,
    /// When set, only reference keys whose conditions hold participate.
    pub valid_keys: Vec<(String, Vec<Condition>)>,
}

impl ContentCheck {
    pub fn new(key: &str, name: &str, content_type: ContentType) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            rules: Vec::new(),
            content_type,
            valid_keys: Vec::new(),
        }
    }

    pub fn rule(mut self, group: Vec<ContentRule>) -> Self {
        self.rules.push(group);
        self
    }

    pub fn valid_key(mut self, key: &str, conditions: Vec<Condition>) -> Self {
        self.valid_keys.push((key.to_string(), conditions));
        self
    }
}

/// Extraction patterns plus the checks over them.
#[derive(Debug, Clone)]
pub struct ContentValueRelation {
    pub patterns: Vec<(String, PatternValue)>,
    pub conditions: Vec<ContentCheck>,
}

/// Compare two raw values under a relation after normalizing them to the
/// declared content type. NUMBER reduces through Chinese-numeral
/// conversion; PERCENTAGE reduces to an exact rational, so "50%",
/// "百分之五十" and "0.5" compare equal.
pub fn compare_value_with_relation(
    first: &str,
    second: &str,
    relation: Relation,
    content_type: ContentType,
) -> bool {
    match content_type {
        ContentType::Number => {
            let (Some(first), Some(second)) =
                (cn_number_to_digit(first), cn_number_to_digit(second))
            else {
                return false;
            };
            apply(first.cmp(&second), relation)
        }
        ContentType::Percentage => {
            let (Some(first), Some(second)) = (
                PercentageUtil::to_fraction(first),
                PercentageUtil::to_fraction(second),
            ) else {
                return false;
            };
            apply(first.cmp(&second), relation)
        }
        ContentType::Str => match relation {
            Relation::Equal => first == second,
            Relation::Unequal => first != second,
            _ => false,
        },
    }
}

fn apply(ordering: std::cmp::Ordering, relation: Relation) -> bool {
    use std::cmp::Ordering::*;
    match relation {
        Relation::Equal => ordering == Equal,
        Relation::Unequal => ordering != Equal,
        Relation::Gte => ordering != Less,
        Relation::Lte => ordering != Greater,
        Relation::Lt => ordering == Less,
        Relation::Gt => ordering == Greater,
    }
}

// ---------------------------------------------------------------------
// Canned content relations used by the built-in rule library.
// ---------------------------------------------------------------------

fn patterns(alternatives: &[String]) -> PatternValue {
    PatternValue::Patterns(PatternCollection::compile(alternatives).unwrap())
}

/// Redemption payout timing: T+X payout within 7 working days, trade
/// confirmation within 3 and before the query day.
pub fn payment_of_redemption() -> ContentValueRelation {
    ContentValueRelation {
        patterns: vec![
            (
                "X".into(),
                patterns(&[format!(
                    "在T[＋+](?P<val>[{R_CN_NUMBER}]+)日[^{R_NOT_CONJUNCTION_PUNCTUATION}]*?支付赎回款项"
                )]),
            ),
            (
                "X1".into(),
                patterns(&[format!(
                    "在T[＋+](?P<val>[{R_CN_NUMBER}]+)日[^{R_NOT_CONJUNCTION_PUNCTUATION}]*?交易的?有效性进行确认"
                )]),
            ),
            (
                "X2".into(),
                patterns(&[format!(
                    "在T[＋+](?P<val>[{R_CN_NUMBER}]+)日[^{R_NOT_CONJUNCTION_PUNCTUATION}]*?查询申请的确认情况"
                )]),
            ),
            ("X3".into(), PatternValue::Const(7)),
            ("X4".into(), PatternValue::Const(3)),
        ],
        conditions: vec![
            ContentCheck::new("X", "支付赎回款项时间", ContentType::Number)
                .rule(vec![ContentRule::new("X3", Relation::Lte)]),
            ContentCheck::new("X1", "交易有效性进行确认时间", ContentType::Number)
                .rule(vec![ContentRule::labeled(
                    "X2",
                    Relation::Lte,
                    "查询申请的确认时间",
                )])
                .rule(vec![ContentRule::new("X4", Relation::Lte)]),
        ],
    }
}

/// Trustee-fee consistency: the declared annual rate must equal the rate
/// in the accrual formula.
pub fn trustee_fee() -> ContentValueRelation {
    fee_relation("托管费", "年托管费率")
}

/// Management-fee consistency, same shape as the trustee fee.
pub fn administrative_fee() -> ContentValueRelation {
    fee_relation("管理费", "年管理费率")
}

fn fee_relation(fee_name: &str, rate_label: &str) -> ContentValueRelation {
    let percentage = "(?:[零〇壹贰叁肆伍陆柒捌玖拾佰仟萬億0-9两一二三四五六七八九十百千万亿]+[,，]?)+(?:[.．][0-9]+)?[%％‰]";
    ContentValueRelation {
        patterns: vec![
            (
                "X".into(),
                patterns(&[
                    format!("{fee_name}按前一日基金资产净值.*?(?P<val>{percentage})的?年费率计提"),
                    format!("基金份额的?年{fee_name}率为(?P<val>{percentage})"),
                ]),
            ),
            (
                "X1".into(),
                patterns(&[format!(
                    "H[＝=]E[a-zA-Z]?[×xX](?P<val>{percentage})÷当年天数"
                )]),
            ),
        ],
        conditions: vec![ContentCheck::new(
            "X",
            "基金资产净值年费率",
            ContentType::Percentage,
        )
        .rule(vec![ContentRule::labeled("X1", Relation::Equal, rate_label)])],
    }
}

/// C-class sales service fee: the declared annual rate must equal the
/// rate in the daily accrual formula.
pub fn c_class_sales_service_fee() -> ContentValueRelation {
    let percentage = "(?:[零〇壹贰叁肆伍陆柒捌玖拾佰仟萬億0-9两一二三四五六七八九十百千万亿]+[,，]?)+(?:[.．][0-9]+)?[%％‰]";
    ContentValueRelation {
        patterns: vec![
            (
                "X".into(),
                patterns(&[
                    format!("C类基金份额的销售服务费年费率为?(?P<val>{percentage})"),
                    format!(
                        "C类基金份额的销售服务费.*?按前一日C类基金份额的基金资产净值的?(?P<val>{percentage})"
                    ),
                ]),
            ),
            (
                "X1".into(),
                patterns(&[format!(
                    "H[＝=]E[a-zA-Z]?[×xX](?P<val>{percentage})÷当年天数"
                )]),
            ),
        ],
        conditions: vec![ContentCheck::new(
            "X",
            "基金资产净值年费率",
            ContentType::Percentage,
        )
        .rule(vec![ContentRule::labeled(
            "X1",
            Relation::Equal,
            "年服务费率",
        )])],
    }
}

/// "连续X个工作日出现前述情形" must sit inside [20, 60].
pub fn working_day_of_foregoing() -> ContentValueRelation {
    ContentValueRelation {
        patterns: vec![
            (
                "X".into(),
                patterns(&[format!(
                    "(?P<val>[{R_CN_NUMBER}]+)[^，,。；;]*?工作日出现[上前]述情形"
                )]),
            ),
            ("X1".into(), PatternValue::Const(20)),
            ("X2".into(), PatternValue::Const(60)),
        ],
        conditions: vec![ContentCheck::new(
            "X",
            "连续出现前述情形的工作日数",
            ContentType::Number,
        )
        .rule(vec![ContentRule::new("X1", Relation::Gte)])
        .rule(vec![ContentRule::new("X2", Relation::Lte)])],
    }
}

/// Passive breach of proportion limits must be cured within 20 trading
/// days.
pub fn trading_day() -> ContentValueRelation {
    ContentValueRelation {
        patterns: vec![
            (
                "X1".into(),
                patterns(&[format!(
                    "管理人[^{R_NOT_CONJUNCTION_PUNCTUATION}]*?在流动性受限资产可?(?:出售|转让|恢复交易).*?的(?P<val>[{R_CN_NUMBER}]+)个交易日内调整至符合相关要求"
                )]),
            ),
            ("X2".into(), PatternValue::Const(20)),
        ],
        conditions: vec![ContentCheck::new(
            "X1",
            "比例限制被动超限处理日",
            ContentType::Number,
        )
        .rule(vec![ContentRule::new("X2", Relation::Lte)])],
    }
}

/// HK-stock investment ceiling: ≥80% when the fund name flags 港股,
/// ≤50% otherwise.
pub fn hk_stock_investment_ratio() -> ContentValueRelation {
    let percentage = "(?:[零〇壹贰叁肆伍陆柒捌玖拾佰仟萬億0-9两一二三四五六七八九十百千万亿]+[,，]?)+(?:[.．][0-9]+)?[%％‰]";
    ContentValueRelation {
        patterns: vec![
            (
                "X".into(),
                patterns(&[
                    format!("港股通[\\u4e00-\\u9fa5]*?占股票资产的?比例.?[\\u4e00-\\u9fa5]*?(?P<val>{percentage})"),
                    format!("(?P<val>{percentage})[\\u4e00-\\u9fa5]*?投资于港股通股票"),
                    format!("港股通(?:标的)?股票[\\u4e00-\\u9fa5]*?(?:基金|股票)资产的?(?P<val>{percentage})"),
                ]),
            ),
            ("X1".into(), PatternValue::Const(80)),
            ("X2".into(), PatternValue::Const(50)),
        ],
        conditions: vec![ContentCheck::new(
            "X",
            "港股通股票的投资比例限制",
            ContentType::Percentage,
        )
        .valid_key("X1", vec![super::canned::hk_stock()])
        .valid_key("X2", vec![super::canned::not_hk_stock()])
        .rule(vec![
            ContentRule::new("X1", Relation::Gte),
            ContentRule::new("X2", Relation::Lte),
        ])],
    }
}

/// Portfolio floor for stock/bond positions: at least 80% of fund
/// assets.
pub fn portfolio_proportion() -> ContentValueRelation {
    let percentage = "(?:[零〇壹贰叁肆伍陆柒捌玖拾佰仟萬億0-9两一二三四五六七八九十百千万亿]+[,，]?)+(?:[.．][0-9]+)?[%％‰]";
    ContentValueRelation {
        patterns: vec![
            (
                "X0".into(),
                patterns(&[
                    format!(
                        "(?:股票|债券)[^{R_NOT_CONJUNCTION_PUNCTUATION}]*?(?:投资)?(?:比例)?(?:应当不|不应|应?不)(?:低于|少于)基金资产的?(?:比例)?.?(?P<val>{percentage})"
                    ),
                ]),
            ),
            ("D0".into(), PatternValue::Const(80)),
        ],
        conditions: vec![ContentCheck::new(
            "X0",
            "投资组合比例下限阈值",
            ContentType::Percentage,
        )
        .rule(vec![ContentRule::new("D0", Relation::Gte)])],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_comparison_handles_chinese() {
        assert!(compare_value_with_relation(
            "三",
            "7",
            Relation::Lte,
            ContentType::Number
        ));
        assert!(!compare_value_with_relation(
            "九",
            "7",
            Relation::Lte,
            ContentType::Number
        ));
    }

    #[test]
    fn percentage_units_are_invariant() {
        // unit form must not matter
        for left in ["50%", "百分之五十", "0.5"] {
            for right in ["50%", "百分之五十", "0.5"] {
                assert!(
                    compare_value_with_relation(
                        left,
                        right,
                        Relation::Equal,
                        ContentType::Percentage
                    ),
                    "{left} should equal {right}"
                );
            }
        }
    }

    #[test]
    fn unparsable_values_fail_closed() {
        assert!(!compare_value_with_relation(
            "无",
            "7",
            Relation::Lte,
            ContentType::Number
        ));
        assert!(!compare_value_with_relation(
            "abc",
            "50%",
            Relation::Equal,
            ContentType::Percentage
        ));
    }

    #[test]
    fn string_comparison_is_literal() {
        assert!(compare_value_with_relation(
            "甲",
            "甲",
            Relation::Equal,
            ContentType::Str
        ));
        assert!(!compare_value_with_relation(
            "甲",
            "乙",
            Relation::Gt,
            ContentType::Str
        ));
    }

    #[test]
    fn redemption_pattern_extracts_day() {
        let relation = payment_of_redemption();
        let PatternValue::Patterns(pattern) = &relation.patterns[0].1 else {
            panic!("expected patterns");
        };
        let caps = pattern
            .captures("基金管理人应在T+7日内支付赎回款项")
            .unwrap();
        assert_eq!(&caps["val"], "7");
    }

    #[test]
    fn fee_formula_pattern_extracts_rate() {
        let relation = trustee_fee();
        let PatternValue::Patterns(pattern) = &relation.patterns[1].1 else {
            panic!("expected patterns");
        };
        let caps = pattern.captures("H=E×0.25%÷当年天数").unwrap();
        assert_eq!(&caps["val"], "0.25%");
    }
}
