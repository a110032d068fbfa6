//! Chinese-numeral parsing and percentage normalization.
//!
//! All functions here are total: bad input yields `None`, never a panic.
//! Comparisons between extracted contract values route through this module
//! so that "百分之五十", "50%" and "0.5" land on the same rational.

use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;

use crate::text::clean_txt;

lazy_static! {
    static ref IGNORE_CHARS: Regex = Regex::new(r"([,，【】\[\]]|人民币|RMB)").unwrap();
    static ref NUMBER_CORE: Regex = Regex::new(
        "[零〇壹贰叁肆伍陆柒捌玖拾佰仟萬億0-9两一二三四五六七八九十百千万亿]+(?:[.．][0-9]+)?"
    )
    .unwrap();
    static ref ARABIC_HEAD: Regex = Regex::new(r"^(?P<digit>[0-9]+(?:\.[0-9]+)?)").unwrap();
    static ref CN_PERCENTAGE: Regex = Regex::new(
        "(?P<denominator>[零〇壹贰叁肆伍陆柒捌玖拾佰仟萬億0-9两一二三四五六七八九十百千万亿]+)分之(?P<numerator>[零〇壹贰叁肆伍陆柒捌玖拾佰仟萬億0-9两一二三四五六七八九十百千万亿]+)"
    )
    .unwrap();
    static ref UNIT_PERCENTAGE: Regex = Regex::new(
        "(?P<ratio>[零〇壹贰叁肆伍陆柒捌玖拾佰仟萬億0-9两一二三四五六七八九十百千万亿]+(?:[.．][0-9]+)?)(?P<symbol>[%％‰])"
    )
    .unwrap();
    static ref DIVISION_PERCENTAGE: Regex = Regex::new(r"(?P<num>[0-9]+)/(?P<den>[0-9]+)").unwrap();
    static ref BARE_DECIMAL: Regex = Regex::new(r"^(?P<int>[0-9]+)\.(?P<frac>[0-9]+)$").unwrap();
}

fn digit_value(ch: char) -> Option<i64> {
    Some(match ch {
        '零' | '〇' => 0,
        '一' | '壹' | '幺' => 1,
        '二' | '两' | '贰' => 2,
        '三' | '叁' => 3,
        '四' | '肆' => 4,
        '五' | '伍' => 5,
        '六' | '陆' => 6,
        '七' | '柒' => 7,
        '八' | '捌' => 8,
        '九' | '玖' => 9,
        _ => return None,
    })
}

fn unit_value(ch: char) -> Option<i64> {
    Some(match ch {
        '十' | '拾' => 10,
        '百' | '佰' => 100,
        '千' | '仟' => 1000,
        _ => return None,
    })
}

fn cardinal_value(ch: char) -> Option<i64> {
    Some(match ch {
        '万' | '萬' => 10_000,
        '亿' | '億' => 100_000_000,
        _ => return None,
    })
}

/// Parse the first number literal in `text` into an integer.
///
/// Handles plain Arabic digits, Chinese numerals with 十/百/千 units and
/// 万/亿 cardinals, capital forms, and mixed forms like "5万". Decimal
/// tails truncate toward zero.
pub fn cn_number_to_digit(text: &str) -> Option<i64> {
    let cleaned = clean_txt(text);
    let cleaned = IGNORE_CHARS.replace_all(&cleaned, "");
    let core = NUMBER_CORE.find(&cleaned)?.as_str().replace('．', ".");

    let mut number: i64 = 0;
    let mut rest = core.as_str();
    if let Some(caps) = ARABIC_HEAD.captures(rest) {
        let digit = caps.name("digit").unwrap();
        let head = digit.as_str();
        number = head
            .split('.')
            .next()
            .unwrap_or("0")
            .parse::<i64>()
            .ok()?;
        rest = &rest[digit.end()..];
    }

    let chars: Vec<char> = rest.chars().collect();
    if chars.is_empty() {
        return Some(number);
    }
    if chars.len() == 1 {
        let ch = chars[0];
        if let Some(value) = digit_value(ch) {
            return Some(if number != 0 { number * 10 + value } else { value });
        }
        if let Some(unit) = unit_value(ch).or_else(|| cardinal_value(ch)) {
            return Some(if number != 0 { number * unit } else { unit });
        }
        return Some(number);
    }

    let mut temp: i64 = 0;
    let mut temp_num: i64 = 0;
    for ch in chars {
        if ch == '零' || ch == '〇' {
            continue;
        }
        if let Some(value) = digit_value(ch) {
            temp_num = value;
        } else if let Some(unit) = unit_value(ch) {
            if temp_num == 0 {
                temp += unit;
            } else {
                temp += temp_num * unit;
            }
            temp_num = 0;
        } else if ch == '亿' || ch == '億' {
            temp += temp_num;
            number += temp;
            number *= 100_000_000;
            temp = 0;
            temp_num = 0;
        } else if ch == '万' || ch == '萬' {
            temp += temp_num;
            if temp == 0 {
                if number != 0 {
                    number *= 10_000;
                } else {
                    number += 10_000;
                }
            } else {
                number += temp * 10_000;
            }
            temp = 0;
            temp_num = 0;
        }
    }
    Some(number + temp + temp_num)
}

/// True when `numbers` is a run of consecutive integers (length ≥ 2).
pub fn is_increment(numbers: &[i64]) -> bool {
    numbers.len() >= 2 && numbers.windows(2).all(|pair| pair[1] - pair[0] == 1)
}

/// An exact rational, used for percentage comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

impl Fraction {
    /// Build a reduced fraction; a zero denominator yields `None`.
    pub fn new(numerator: i64, denominator: i64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let sign = if denominator < 0 { -1 } else { 1 };
        let divisor = gcd(numerator.unsigned_abs(), denominator.unsigned_abs()) as i64;
        Some(Self {
            numerator: sign * numerator / divisor.max(1),
            denominator: (denominator * sign) / divisor.max(1),
        })
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.numerator as i128 * other.denominator as i128;
        let right = other.numerator as i128 * self.denominator as i128;
        left.cmp(&right)
    }
}

/// Percentage parsing in every unit form the corpus uses.
pub struct PercentageUtil;

impl PercentageUtil {
    /// Convert the first percentage expression in `text` to a fraction.
    ///
    /// Accepts "50%", "5‰", "百分之五十", "1/20", and — because a
    /// percentage content type is already asserted by the caller — the
    /// bare forms "0.5" (ratio) and "50" (percent).
    pub fn to_fraction(text: &str) -> Option<Fraction> {
        let cleaned = clean_txt(text);
        let negative = cleaned.starts_with(['-', '－', '—', '负']);
        let cleaned = cleaned.trim_start_matches(['-', '－', '—', '负']);

        let fraction = if let Some(caps) = UNIT_PERCENTAGE.captures(cleaned) {
            let base = if &caps["symbol"] == "‰" { 1000 } else { 100 };
            Self::decimal_over(&caps["ratio"], base)
        } else if let Some(caps) = CN_PERCENTAGE.captures(cleaned) {
            let denominator = cn_number_to_digit(&caps["denominator"])?;
            let numerator = cn_number_to_digit(&caps["numerator"])?;
            Fraction::new(numerator, denominator)
        } else if let Some(caps) = DIVISION_PERCENTAGE.captures(cleaned) {
            Fraction::new(caps["num"].parse().ok()?, caps["den"].parse().ok()?)
        } else if BARE_DECIMAL.is_match(cleaned) {
            // "0.5" means the ratio itself
            Self::decimal_over(cleaned, 1)
        } else {
            // a bare integer in percentage context means percent
            Fraction::new(cn_number_to_digit(cleaned)?, 100)
        }?;

        if negative {
            Fraction::new(-fraction.numerator, fraction.denominator)
        } else {
            Some(fraction)
        }
    }

    /// Canonical short string for a percentage, used by the similarity
    /// convert layer so that equivalent forms diff as EQUAL.
    pub fn canonical(text: &str) -> Option<String> {
        let fraction = Self::to_fraction(text)?;
        Some(format!("{}/{}", fraction.numerator(), fraction.denominator()))
    }

    fn decimal_over(text: &str, base: i64) -> Option<Fraction> {
        if let Some(caps) = BARE_DECIMAL.captures(text) {
            let int_part: i64 = caps["int"].parse().ok()?;
            let frac_text = &caps["frac"];
            let frac_part: i64 = frac_text.parse().ok()?;
            let scale = 10_i64.checked_pow(frac_text.len() as u32)?;
            Fraction::new(int_part * scale + frac_part, scale * base)
        } else {
            Fraction::new(cn_number_to_digit(text)?, base)
        }
    }
}

/// Date digit folding: maps Chinese date numerals onto Arabic digits so
/// that both sides of a diff canonicalize identically.
pub struct DateUtil;

impl DateUtil {
    pub fn to_human_date(text: &str) -> String {
        let mut result = String::new();
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            if i + 1 < chars.len() && chars[i] == '十' {
                if let Some(value) = digit_value(chars[i + 1]) {
                    result.push('1');
                    result.push_str(&value.to_string());
                    i += 2;
                    continue;
                }
            }
            match chars[i] {
                '十' => result.push_str("10"),
                ch => match digit_value(ch) {
                    Some(value) => result.push_str(&value.to_string()),
                    None => result.push(ch),
                },
            }
            i += 1;
        }
        result
    }
}
