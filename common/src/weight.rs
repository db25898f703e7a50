//! 重み計算モジュール
//!
//! カード属性から抽選用の重みを算出する。確率計算機が同じ値を前提とするため、
//! 分岐・丸め・`stackSize = 0` の扱いまで既存の出力と一致させる。
//!
//! ## 計算方式
//! - goldCost > 0: 価格の逆数ベース（125未満は単純逆数、125以上は2項平均）
//! - それ以外: stackSize・報酬・ドロップ場所によるレガシー推定

use crate::types::Card;

/// 単純逆数式と2項式の境界
pub const HIGH_COST_THRESHOLD: f64 = 125.0;

const LOW_COST_NUMERATOR: f64 = 1_000_000.0;
const HIGH_COST_NUMERATOR: f64 = 13_000_000_000.0;
const HIGH_COST_OFFSET: f64 = 24.99;

/// カードの重みを計算
///
/// # Examples
/// ```
/// use divination_common::{Card, compute_weight};
///
/// let card = Card { gold_cost: 100.0, ..Card::new(1, "Rain of Chaos") };
/// assert_eq!(compute_weight(&card), 10000.0);
/// ```
pub fn compute_weight(card: &Card) -> f64 {
    match weight_from_gold_cost(card.gold_cost) {
        Some(weight) => weight,
        None => legacy_weight(card.stack_size, &card.reward, &card.drop_location),
    }
}

/// 編集中フォームのプレビュー用
///
/// goldCostが正の場合のみ値を返す。
pub fn preview_weight(gold_cost: f64) -> Option<f64> {
    weight_from_gold_cost(gold_cost)
}

/// goldCostベースの重み（goldCost <= 0 または NaN なら None）
pub fn weight_from_gold_cost(gold_cost: f64) -> Option<f64> {
    if !(gold_cost > 0.0) {
        return None;
    }

    if gold_cost < HIGH_COST_THRESHOLD {
        return Some(round2(LOW_COST_NUMERATOR / gold_cost));
    }

    // 境界での不連続を2項平均でならす
    let w1 = HIGH_COST_NUMERATOR / gold_cost.powf(3.0);
    let w2 = HIGH_COST_NUMERATOR / (gold_cost + HIGH_COST_OFFSET).powf(3.0);
    Some(round2((w1 + w2) / 2.0))
}

/// 価格情報のないレコード用のレガシー推定
///
/// `stack_size = 0` は `1 / ln(1)` となり `f64::INFINITY` を返す。
pub fn legacy_weight(stack_size: u32, reward: &str, drop_location: &str) -> f64 {
    let mut weight = 1.0;

    weight *= 1.0 / (f64::from(stack_size) + 1.0).ln();

    let reward = reward.to_lowercase();
    if reward.contains("unique") || reward.contains("rare") {
        weight *= 0.5;
    } else if reward.contains("currency") || reward.contains("orb") {
        weight *= 0.8;
    } else if reward.contains("gem") || reward.contains("skill") {
        weight *= 0.9;
    }

    let location = drop_location.to_lowercase();
    if location.contains("boss") || location.contains("uber") {
        weight *= 0.3;
    } else if location.contains("map") || location.contains("tier") {
        weight *= 0.6;
    }

    round2(weight)
}

/// 小数点以下2桁に丸める
///
/// 0.5は正の無限大方向に丸める（JavaScriptの `Math.round` と同じ規則）。
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let floor = scaled.floor();
    let rounded = if scaled - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded / 100.0
}
