// ==========================================
// 采购计划管理系统 - 金额计算
// ==========================================
// 金额按十进制计算，四舍五入保留两位小数
// ==========================================

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

fn parse_non_negative(text: &str) -> Option<Decimal> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok().filter(|d| !d.is_sign_negative())
}

/// 单价 × 数量，结果保留两位小数（"10.5" × "2" → "21.00"）
///
/// 任一输入为空、非数字或为负数时返回 None
pub fn calc_total(unit_price: &str, quantity: &str) -> Option<String> {
    let price = parse_non_negative(unit_price)?;
    let qty = parse_non_negative(quantity)?;
    let mut total = price
        .checked_mul(qty)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    total.rescale(2);
    Some(total.to_string())
}

/// 解析录入金额文本（允许千分位），无法解析时返回 None
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok().and_then(|d| d.to_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_total_rounds_half_up() {
        assert_eq!(calc_total("10.5", "2"), Some("21.00".to_string()));
        assert_eq!(calc_total("0.125", "1"), Some("0.13".to_string()));
        assert_eq!(calc_total("1,000", "3"), Some("3000.00".to_string()));
    }

    #[test]
    fn test_calc_total_rejects_bad_input() {
        assert_eq!(calc_total("", "2"), None);
        assert_eq!(calc_total("abc", "2"), None);
        assert_eq!(calc_total("-1", "2"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,200.50"), Some(1200.5));
        assert_eq!(parse_amount("待询价"), None);
        assert_eq!(parse_amount(" "), None);
    }
}
