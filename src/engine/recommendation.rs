// ==========================================
// 采购计划管理系统 - 推荐匹配
// ==========================================
// 规则命中: 规则标的名称是输入文本的子串
// 择优: 权重高者优先 → 子串更长者优先 → id 更小（先保存）者优先
// ==========================================

use crate::domain::recommendation::{RecommendationHint, RecommendationRule};
use std::cmp::Ordering;

/// 两条命中规则的优劣比较（Greater = 更优）
fn rank(a: &RecommendationRule, b: &RecommendationRule) -> Ordering {
    a.weight
        .cmp(&b.weight)
        .then_with(|| a.item_name.chars().count().cmp(&b.item_name.chars().count()))
        .then_with(|| {
            // id 小者更优；未落库(None)的规则排在已落库之后
            match (a.id, b.id) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            }
        })
}

/// 在启用规则中查找最佳匹配
pub fn match_rule<'a>(text: &str, rules: &'a [RecommendationRule]) -> Option<&'a RecommendationRule> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    rules
        .iter()
        .filter(|r| r.is_active && !r.item_name.is_empty() && text.contains(r.item_name.as_str()))
        .fold(None, |best: Option<&RecommendationRule>, rule| match best {
            Some(current) if rank(rule, current) != Ordering::Greater => Some(current),
            _ => Some(rule),
        })
}

/// 匹配并返回推荐的采购员/方式/途径
pub fn recommend(text: &str, rules: &[RecommendationRule]) -> Option<RecommendationHint> {
    match_rule(text, rules).map(|rule| RecommendationHint {
        purchaser: rule.purchaser.clone(),
        purchase_method: rule.purchase_method.clone(),
        purchase_channel: rule.purchase_channel.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: i64, item: &str, purchaser: &str, weight: i64) -> RecommendationRule {
        RecommendationRule {
            id: Some(id),
            ..RecommendationRule::new(item, purchaser, weight)
        }
    }

    #[test]
    fn test_longer_substring_wins_on_weight_tie() {
        let rules = vec![rule(1, "螺栓", "张三", 50), rule(2, "不锈钢螺栓", "李四", 50)];
        let hint = recommend("M6不锈钢螺栓批次A", &rules).unwrap();
        assert_eq!(hint.purchaser, "李四");
    }

    #[test]
    fn test_weight_beats_length() {
        let rules = vec![rule(1, "螺栓", "张三", 80), rule(2, "不锈钢螺栓", "李四", 50)];
        assert_eq!(recommend("不锈钢螺栓", &rules).unwrap().purchaser, "张三");
    }

    #[test]
    fn test_full_tie_prefers_lowest_id_regardless_of_order() {
        let rules = vec![rule(9, "轴承", "王五", 10), rule(3, "轴承", "赵六", 10)];
        assert_eq!(recommend("深沟球轴承", &rules).unwrap().purchaser, "赵六");
    }

    #[test]
    fn test_no_match_and_inactive_rules() {
        let mut inactive = rule(1, "垫片", "张三", 100);
        inactive.is_active = false;
        let rules = vec![inactive];
        assert!(recommend("平垫片", &rules).is_none());
        assert!(recommend("", &rules).is_none());
        assert!(recommend("无关文本", &[rule(2, "螺母", "李四", 1)]).is_none());
    }
}
